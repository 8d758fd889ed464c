//! Structured selectors for locating diagram elements.
//!
//! Queries are built as data, not strings: the mock backend evaluates the
//! structure directly against its element tree, while the CDP backend
//! renders it to CSS (plus JavaScript text filters where CSS cannot
//! express the query). Diagram vocabulary helpers (`type_attr`,
//! `id_suffix`, `not_ghost`) keep query code free of string literals.

use crate::dom;

/// A composable query over the remote document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Raw CSS passthrough (parsed by the mock backend, forwarded by CDP)
    Css(String),
    /// Tag name (e.g. `g`, `body`)
    Tag(String),
    /// Exact id match
    Id(String),
    /// Id suffix match (`[id$="..."]`), used for endpoint resolution across
    /// independently-prefixed id spaces
    IdSuffix(String),
    /// Attribute equality
    Attr {
        /// Attribute name
        name: String,
        /// Required value
        value: String,
    },
    /// Attribute presence
    AttrPresent(String),
    /// Class presence
    HasClass(String),
    /// Class absence
    NotClass(String),
    /// Text-content refinement over a base query
    WithText {
        /// The base query
        base: Box<Selector>,
        /// Substring the element's text content must contain
        text: String,
    },
    /// Compound query: every part must match the same element
    And(Vec<Selector>),
    /// Descendant combinator (any depth)
    Descendant {
        /// Ancestor query
        ancestor: Box<Selector>,
        /// Descendant query
        descendant: Box<Selector>,
    },
    /// Direct-child combinator
    DirectChild {
        /// Parent query
        parent: Box<Selector>,
        /// Child query
        child: Box<Selector>,
    },
    /// Iframe boundary: `inner` is evaluated inside the document of the
    /// frame element matching `frame`
    Frame {
        /// Query for the frame element in the outer document
        frame: Box<Selector>,
        /// Query evaluated inside the frame's document
        inner: Box<Selector>,
    },
}

impl Selector {
    /// Create a raw CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a tag-name selector
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// Create an exact-id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create an id-suffix selector
    #[must_use]
    pub fn id_suffix(suffix: impl Into<String>) -> Self {
        Self::IdSuffix(suffix.into())
    }

    /// Create an attribute-equality selector
    #[must_use]
    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attr {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create an attribute-presence selector
    #[must_use]
    pub fn attr_present(name: impl Into<String>) -> Self {
        Self::AttrPresent(name.into())
    }

    /// Create a class-presence selector
    #[must_use]
    pub fn has_class(class: impl Into<String>) -> Self {
        Self::HasClass(class.into())
    }

    /// Create a class-absence selector
    #[must_use]
    pub fn not_class(class: impl Into<String>) -> Self {
        Self::NotClass(class.into())
    }

    /// Selector for the diagram type attribute
    #[must_use]
    pub fn type_attr(element_type: impl Into<String>) -> Self {
        Self::attr(dom::TYPE_ATTRIBUTE, element_type)
    }

    /// Combine with another query on the same element
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Exclude transient ghost elements
    #[must_use]
    pub fn not_ghost(self) -> Self {
        self.and(Self::not_class(dom::GHOST_CLASS))
    }

    /// Refine by text content (substring match)
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self::WithText {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Scope as a descendant (any depth) of `ancestor`
    #[must_use]
    pub fn descendant(ancestor: Self, descendant: Self) -> Self {
        Self::Descendant {
            ancestor: Box::new(ancestor),
            descendant: Box::new(descendant),
        }
    }

    /// Scope as a direct child of `parent`
    #[must_use]
    pub fn direct_child(parent: Self, child: Self) -> Self {
        Self::DirectChild {
            parent: Box::new(parent),
            child: Box::new(child),
        }
    }

    /// Scope inside the document of the frame element matching `frame`
    #[must_use]
    pub fn in_frame(frame: Self, inner: Self) -> Self {
        Self::Frame {
            frame: Box::new(frame),
            inner: Box::new(inner),
        }
    }

    /// Render to a CSS string, if the query is expressible in pure CSS.
    ///
    /// `WithText` and `Frame` have no CSS equivalent and return `None`.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::Tag(t) => Some(t.clone()),
            Self::Id(id) => Some(format!("[id=\"{id}\"]")),
            Self::IdSuffix(suffix) => Some(format!("[id$=\"{suffix}\"]")),
            Self::Attr { name, value } => Some(format!("[{name}=\"{value}\"]")),
            Self::AttrPresent(name) => Some(format!("[{name}]")),
            Self::HasClass(class) => Some(format!(".{class}")),
            Self::NotClass(class) => Some(format!(":not(.{class})")),
            Self::And(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.to_css()?);
                }
                Some(out)
            }
            Self::Descendant {
                ancestor,
                descendant,
            } => Some(format!("{} {}", ancestor.to_css()?, descendant.to_css()?)),
            Self::DirectChild { parent, child } => {
                Some(format!("{} > {}", parent.to_css()?, child.to_css()?))
            }
            Self::WithText { .. } | Self::Frame { .. } => None,
        }
    }

    /// Human-readable rendering for error messages
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::WithText { base, text } => {
                format!("{} with text \"{text}\"", base.summary())
            }
            Self::Frame { frame, inner } => {
                format!("{} inside frame {}", inner.summary(), frame.summary())
            }
            other => other
                .to_css()
                .unwrap_or_else(|| format!("{other:?}")),
        }
    }

    /// Parse a simple CSS selector into structured form.
    ///
    /// Supported subset: tag names, `#id`, `.class`, `[attr]`,
    /// `[attr="value"]`, `[attr$="value"]`, `:not(.class)`, and the
    /// descendant / direct-child combinators. Returns `None` on anything
    /// else.
    #[must_use]
    pub fn parse_css(raw: &str) -> Option<Self> {
        let spaced = raw.replace('>', " > ");
        let mut result: Option<Self> = None;
        let mut direct = false;
        for token in spaced.split_whitespace() {
            if token == ">" {
                direct = true;
                continue;
            }
            let compound = Self::parse_compound(token)?;
            result = Some(match result {
                None => compound,
                Some(prev) if direct => Self::direct_child(prev, compound),
                Some(prev) => Self::descendant(prev, compound),
            });
            direct = false;
        }
        result
    }

    fn parse_compound(part: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let chars: Vec<char> = part.chars().collect();
        let mut i = 0;

        // leading tag name or universal selector
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '*')
        {
            i += 1;
        }
        if i > start {
            let tag: String = chars[start..i].iter().collect();
            if tag != "*" {
                parts.push(Self::Tag(tag));
            }
        }

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (name, next) = Self::take_name(&chars, i + 1);
                    if name.is_empty() {
                        return None;
                    }
                    parts.push(Self::HasClass(name));
                    i = next;
                }
                '#' => {
                    let (name, next) = Self::take_name(&chars, i + 1);
                    if name.is_empty() {
                        return None;
                    }
                    parts.push(Self::Id(name));
                    i = next;
                }
                '[' => {
                    let close = chars[i..].iter().position(|&c| c == ']')? + i;
                    let body: String = chars[i + 1..close].iter().collect();
                    parts.push(Self::parse_attr(&body)?);
                    i = close + 1;
                }
                ':' => {
                    let rest: String = chars[i..].iter().collect();
                    let inner = rest.strip_prefix(":not(.")?;
                    let close = inner.find(')')?;
                    parts.push(Self::NotClass(inner[..close].to_string()));
                    i += ":not(.".len() + close + 1;
                }
                _ => return None,
            }
        }

        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::And(parts)),
        }
    }

    fn take_name(chars: &[char], mut i: usize) -> (String, usize) {
        let start = i;
        while i < chars.len()
            && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_')
        {
            i += 1;
        }
        (chars[start..i].iter().collect(), i)
    }

    fn parse_attr(body: &str) -> Option<Self> {
        let unquote = |v: &str| v.trim_matches('"').trim_matches('\'').to_string();
        if let Some((name, value)) = body.split_once("$=") {
            let value = unquote(value);
            if name == "id" {
                return Some(Self::IdSuffix(value));
            }
            return None;
        }
        if let Some((name, value)) = body.split_once('=') {
            let value = unquote(value);
            if name == "id" {
                return Some(Self::Id(value));
            }
            return Some(Self::Attr {
                name: name.to_string(),
                value,
            });
        }
        Some(Self::AttrPresent(body.to_string()))
    }

    /// Flatten into a CSS query plus text filters and an optional frame
    /// boundary, for backends that execute CSS against a live document.
    ///
    /// Returns `None` for shapes the CSS path cannot express (e.g. a text
    /// filter on an ancestor).
    #[must_use]
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    pub(crate) fn flatten(&self) -> Option<FlatQuery> {
        match self {
            Self::Frame { frame, inner } => {
                let frame_css = frame.to_css()?;
                let mut flat = inner.flatten()?;
                if flat.frame_css.is_some() {
                    return None;
                }
                flat.frame_css = Some(frame_css);
                Some(flat)
            }
            Self::WithText { base, text } => {
                let mut flat = base.flatten()?;
                flat.text_filters.push(text.clone());
                Some(flat)
            }
            Self::Descendant {
                ancestor,
                descendant,
            } => {
                let ancestor_css = ancestor.to_css()?;
                let inner = descendant.flatten()?;
                if inner.frame_css.is_some() {
                    return None;
                }
                Some(FlatQuery {
                    frame_css: None,
                    css: format!("{ancestor_css} {}", inner.css),
                    text_filters: inner.text_filters,
                })
            }
            Self::DirectChild { parent, child } => {
                let parent_css = parent.to_css()?;
                let inner = child.flatten()?;
                if inner.frame_css.is_some() {
                    return None;
                }
                Some(FlatQuery {
                    frame_css: None,
                    css: format!("{parent_css} > {}", inner.css),
                    text_filters: inner.text_filters,
                })
            }
            other => other.to_css().map(|css| FlatQuery {
                frame_css: None,
                css,
                text_filters: Vec::new(),
            }),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::Css(raw.to_string())
    }
}

impl From<String> for Selector {
    fn from(raw: String) -> Self {
        Self::Css(raw)
    }
}

/// A selector flattened for CSS-executing backends
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) struct FlatQuery {
    /// CSS of the frame element whose document hosts the query, if any
    pub frame_css: Option<String>,
    /// The CSS query itself
    pub css: String,
    /// Text-content filters applied after the CSS query
    pub text_filters: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod render_tests {
        use super::*;

        #[test]
        fn test_compound_render() {
            let sel = Selector::tag("g")
                .and(Selector::has_class("node"))
                .and(Selector::type_attr("task:manual"));
            assert_eq!(
                sel.to_css().unwrap(),
                "g.node[data-diagram-type=\"task:manual\"]"
            );
        }

        #[test]
        fn test_id_render_uses_attribute_form() {
            let sel = Selector::id("svgr_task_Push");
            assert_eq!(sel.to_css().unwrap(), "[id=\"svgr_task_Push\"]");
        }

        #[test]
        fn test_id_suffix_render() {
            let sel = Selector::id_suffix("task_Push");
            assert_eq!(sel.to_css().unwrap(), "[id$=\"task_Push\"]");
        }

        #[test]
        fn test_descendant_render() {
            let sel = Selector::descendant(
                Selector::css("svg.diagram-canvas"),
                Selector::has_class("label"),
            );
            assert_eq!(sel.to_css().unwrap(), "svg.diagram-canvas .label");
        }

        #[test]
        fn test_direct_child_render() {
            let sel = Selector::direct_child(Selector::id("n1"), Selector::has_class("label"));
            assert_eq!(sel.to_css().unwrap(), "[id=\"n1\"] > .label");
        }

        #[test]
        fn test_not_ghost_render() {
            let sel = Selector::type_attr("task:manual").not_ghost();
            assert_eq!(
                sel.to_css().unwrap(),
                "[data-diagram-type=\"task:manual\"]:not(.ghost)"
            );
        }

        #[test]
        fn test_with_text_has_no_css() {
            let sel = Selector::has_class("node").with_text("Push");
            assert!(sel.to_css().is_none());
            assert!(sel.summary().contains("Push"));
        }

        #[test]
        fn test_frame_has_no_css() {
            let sel = Selector::in_frame(Selector::css("iframe.webview"), Selector::tag("body"));
            assert!(sel.to_css().is_none());
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_tag_class_chain() {
            let sel = Selector::parse_css("g.node.selected").unwrap();
            assert_eq!(
                sel,
                Selector::And(vec![
                    Selector::Tag("g".into()),
                    Selector::HasClass("node".into()),
                    Selector::HasClass("selected".into()),
                ])
            );
        }

        #[test]
        fn test_parse_hash_id() {
            let sel = Selector::parse_css("#task_Push").unwrap();
            assert_eq!(sel, Selector::Id("task_Push".into()));
        }

        #[test]
        fn test_parse_attr_equality() {
            let sel = Selector::parse_css("[data-diagram-type=\"task:manual\"]").unwrap();
            assert_eq!(
                sel,
                Selector::Attr {
                    name: "data-diagram-type".into(),
                    value: "task:manual".into(),
                }
            );
        }

        #[test]
        fn test_parse_id_suffix() {
            let sel = Selector::parse_css("[id$=\"task_Push\"]").unwrap();
            assert_eq!(sel, Selector::IdSuffix("task_Push".into()));
        }

        #[test]
        fn test_parse_attr_presence() {
            let sel = Selector::parse_css("body[data-diagram-api]").unwrap();
            assert_eq!(
                sel,
                Selector::And(vec![
                    Selector::Tag("body".into()),
                    Selector::AttrPresent("data-diagram-api".into()),
                ])
            );
        }

        #[test]
        fn test_parse_not_class() {
            let sel = Selector::parse_css("g.node:not(.ghost)").unwrap();
            assert_eq!(
                sel,
                Selector::And(vec![
                    Selector::Tag("g".into()),
                    Selector::HasClass("node".into()),
                    Selector::NotClass("ghost".into()),
                ])
            );
        }

        #[test]
        fn test_parse_descendant_and_direct_child() {
            let sel = Selector::parse_css("svg.diagram-canvas g.node > .label").unwrap();
            match sel {
                Selector::DirectChild { parent, child } => {
                    assert!(matches!(*parent, Selector::Descendant { .. }));
                    assert_eq!(*child, Selector::HasClass("label".into()));
                }
                other => panic!("unexpected parse: {other:?}"),
            }
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(Selector::parse_css("g.node!!").is_none());
            assert!(Selector::parse_css("").is_none());
        }
    }

    mod flatten_tests {
        use super::*;

        #[test]
        fn test_flatten_plain_css() {
            let flat = Selector::css("g.node").flatten().unwrap();
            assert_eq!(flat.css, "g.node");
            assert!(flat.frame_css.is_none());
            assert!(flat.text_filters.is_empty());
        }

        #[test]
        fn test_flatten_text_filter() {
            let flat = Selector::has_class("node").with_text("Push").flatten().unwrap();
            assert_eq!(flat.css, ".node");
            assert_eq!(flat.text_filters, vec!["Push".to_string()]);
        }

        #[test]
        fn test_flatten_scoped_text_filter() {
            let sel = Selector::descendant(
                Selector::css("svg.diagram-canvas"),
                Selector::has_class("node").with_text("Push"),
            );
            let flat = sel.flatten().unwrap();
            assert_eq!(flat.css, "svg.diagram-canvas .node");
            assert_eq!(flat.text_filters.len(), 1);
        }

        #[test]
        fn test_flatten_frame() {
            let sel = Selector::in_frame(
                Selector::css("iframe.webview"),
                Selector::css("svg.diagram-canvas"),
            );
            let flat = sel.flatten().unwrap();
            assert_eq!(flat.frame_css.as_deref(), Some("iframe.webview"));
            assert_eq!(flat.css, "svg.diagram-canvas");
        }

        #[test]
        fn test_flatten_rejects_text_filter_on_ancestor() {
            let sel = Selector::descendant(
                Selector::has_class("node").with_text("Push"),
                Selector::has_class("label"),
            );
            assert!(sel.flatten().is_none());
        }
    }

    mod roundtrip_tests {
        use super::*;
        use proptest::prelude::*;

        fn ident() -> impl Strategy<Value = String> {
            "[a-z][a-z0-9-]{0,8}"
        }

        fn compound() -> impl Strategy<Value = Selector> {
            (
                ident(),
                proptest::collection::vec(ident(), 0..3),
                proptest::option::of(ident()),
            )
                .prop_map(|(tag, classes, id)| {
                    let mut sel = Selector::Tag(tag);
                    for class in classes {
                        sel = sel.and(Selector::HasClass(class));
                    }
                    if let Some(id) = id {
                        sel = sel.and(Selector::Id(id));
                    }
                    sel
                })
        }

        proptest! {
            // Rendering then re-parsing a CSS-expressible selector is
            // stable: the second render equals the first.
            #[test]
            fn render_parse_render_is_stable(sel in compound()) {
                let css = sel.to_css().unwrap();
                let parsed = Selector::parse_css(&css).unwrap();
                prop_assert_eq!(parsed.to_css().unwrap(), css);
            }
        }
    }
}
