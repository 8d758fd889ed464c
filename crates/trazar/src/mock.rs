//! In-memory DOM backend for unit testing without a browser.
//!
//! Implements [`DomDriver`] over a mutable element arena. Structured
//! selectors are evaluated directly against the tree; raw CSS strings go
//! through [`Selector::parse_css`]. Interactions are recorded in an
//! operation log so flow tests can assert the exact sequence issued by a
//! capability. A thin slice of diagram-client behavior is emulated where
//! flows need a reacting document: clicking a node or edge selects it
//! exclusively, `Escape` clears the selection, and `Delete` detaches the
//! selected elements. Everything else is driven by the test itself,
//! typically from a spawned task mutating the tree mid-wait.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::dom;
use crate::driver::{DomDriver, ElementState};
use crate::locator::{BoundingBox, Point, DEFAULT_POLL_INTERVAL_MS};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Timeout for auto-waiting element actions (2 seconds)
pub const ACTION_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone)]
struct StoredElement {
    tag: String,
    id: Option<String>,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<usize>,
    detached: bool,
    bbox: BoundingBox,
}

#[derive(Debug, Default)]
struct DomState {
    elements: Vec<StoredElement>,
    operations: Vec<String>,
}

/// Builder for inserting an element into a [`MockDom`]
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    bbox: BoundingBox,
}

impl MockElement {
    /// Create a builder for an element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            text: String::new(),
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    /// Set the element id
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set the element's own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the bounding box
    #[must_use]
    pub fn at(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.bbox = BoundingBox::new(x, y, width, height);
        self
    }
}

/// In-memory DOM implementing the automation driver contract
#[derive(Debug, Clone)]
pub struct MockDom {
    inner: Arc<RwLock<DomState>>,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Create a document containing only a `body` element
    #[must_use]
    pub fn new() -> Self {
        let body = StoredElement {
            tag: "body".to_string(),
            id: None,
            classes: BTreeSet::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            parent: None,
            detached: false,
            bbox: BoundingBox::new(0.0, 0.0, 1280.0, 720.0),
        };
        Self {
            inner: Arc::new(RwLock::new(DomState {
                elements: vec![body],
                operations: Vec::new(),
            })),
        }
    }

    /// Attach the metadata-API marker to the document body
    pub fn mark_api_ready(&self) {
        self.with_state_mut(|state| {
            let _ = state.elements[0]
                .attrs
                .insert(dom::API_MARKER_ATTRIBUTE.to_string(), "true".to_string());
        });
    }

    /// Insert an element under the element with the given id, or under
    /// `body` when `parent_id` is `None`. Panics when the parent does not
    /// exist (test-setup error).
    pub fn insert(&self, parent_id: Option<&str>, element: MockElement) {
        self.with_state_mut(|state| {
            let parent = match parent_id {
                None => 0,
                Some(id) => {
                    find_by_id(state, id).unwrap_or_else(|| panic!("no mock element with id `{id}`"))
                }
            };
            push_element(state, parent, element);
        });
    }

    /// Insert an element under the single element matching `css`. Panics
    /// when zero or multiple elements match (test-setup error).
    pub fn insert_under_selector(&self, css: &str, element: MockElement) {
        let selector = Selector::css(css);
        self.with_state_mut(|state| {
            let matches = query(state, &selector);
            assert!(
                matches.len() == 1,
                "expected exactly one parent for `{css}`, found {}",
                matches.len()
            );
            push_element(state, matches[0], element);
        });
    }

    /// Detach the element with the given id, and its whole subtree
    pub fn remove(&self, id: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                detach_subtree(state, idx);
            }
        });
    }

    /// Set an attribute on the element with the given id
    pub fn set_attribute(&self, id: &str, name: &str, value: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                let _ = state.elements[idx]
                    .attrs
                    .insert(name.to_string(), value.to_string());
            }
        });
    }

    /// Remove an attribute from the element with the given id
    pub fn remove_attribute(&self, id: &str, name: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                let _ = state.elements[idx].attrs.remove(name);
            }
        });
    }

    /// Add a class to the element with the given id
    pub fn add_class(&self, id: &str, class: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                let _ = state.elements[idx].classes.insert(class.to_string());
            }
        });
    }

    /// Remove a class from the element with the given id
    pub fn remove_class(&self, id: &str, class: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                let _ = state.elements[idx].classes.remove(class);
            }
        });
    }

    /// Replace the own text of the element with the given id
    pub fn set_text(&self, id: &str, text: &str) {
        self.with_state_mut(|state| {
            if let Some(idx) = find_by_id(state, id) {
                state.elements[idx].text = text.to_string();
            }
        });
    }

    /// The recorded interaction log
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.with_state(|state| state.operations.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&DomState) -> R) -> R {
        let state = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut DomState) -> R) -> R {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn single_index(&self, selector: &Selector) -> TrazarResult<usize> {
        self.with_state(|state| {
            let found = query(state, selector);
            if found.len() == 1 {
                Ok(found[0])
            } else {
                Err(TrazarError::Cardinality {
                    expected: "exactly one",
                    found: found.len(),
                    criteria: selector.summary(),
                })
            }
        })
    }

    /// Auto-wait until the selector resolves to exactly one visible
    /// element, bounded by [`ACTION_TIMEOUT_MS`]
    async fn wait_for_single(&self, selector: &Selector) -> TrazarResult<usize> {
        let start = Instant::now();
        loop {
            let found = self.with_state(|state| query(state, selector));
            if found.len() > 1 {
                return Err(TrazarError::Cardinality {
                    expected: "exactly one",
                    found: found.len(),
                    criteria: selector.summary(),
                });
            }
            if found.len() == 1 {
                let idx = found[0];
                if self.with_state(|state| is_visible_idx(state, idx)) {
                    return Ok(idx);
                }
            }
            if start.elapsed() >= Duration::from_millis(ACTION_TIMEOUT_MS) {
                return Err(TrazarError::Timeout {
                    waiting_for: format!("element {} to be actionable", selector.summary()),
                    ms: ACTION_TIMEOUT_MS,
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }
}

fn push_element(state: &mut DomState, parent: usize, element: MockElement) {
    let stored = StoredElement {
        tag: element.tag,
        id: element.id,
        classes: element.classes.into_iter().collect(),
        attrs: element.attrs.into_iter().collect(),
        text: element.text,
        parent: Some(parent),
        detached: false,
        bbox: element.bbox,
    };
    state.elements.push(stored);
}

fn find_by_id(state: &DomState, id: &str) -> Option<usize> {
    state
        .elements
        .iter()
        .position(|el| !el.detached && el.id.as_deref() == Some(id))
}

fn ancestors(state: &DomState, idx: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut current = state.elements[idx].parent;
    while let Some(parent) = current {
        out.push(parent);
        current = state.elements[parent].parent;
    }
    out
}

fn detach_subtree(state: &mut DomState, root: usize) {
    let targets: Vec<usize> = (0..state.elements.len())
        .filter(|&i| i == root || ancestors(state, i).contains(&root))
        .collect();
    for idx in targets {
        state.elements[idx].detached = true;
    }
}

fn attribute_of(state: &DomState, idx: usize, name: &str) -> Option<String> {
    let el = &state.elements[idx];
    match name {
        "id" => el.id.clone(),
        // classes live in their own set, like a real DOM classList
        "class" => {
            if el.classes.is_empty() {
                None
            } else {
                Some(el.classes.iter().cloned().collect::<Vec<_>>().join(" "))
            }
        }
        _ => el.attrs.get(name).cloned(),
    }
}

fn text_of(state: &DomState, idx: usize) -> String {
    let mut out = state.elements[idx].text.clone();
    for (i, el) in state.elements.iter().enumerate() {
        if !el.detached && i != idx && ancestors(state, i).contains(&idx) {
            out.push_str(&el.text);
        }
    }
    out
}

fn is_visible_idx(state: &DomState, idx: usize) -> bool {
    let el = &state.elements[idx];
    if el.detached || el.classes.contains(dom::HIDDEN_CLASS) {
        return false;
    }
    ancestors(state, idx)
        .iter()
        .all(|&a| !state.elements[a].classes.contains(dom::HIDDEN_CLASS))
}

fn query(state: &DomState, selector: &Selector) -> Vec<usize> {
    (0..state.elements.len())
        .filter(|&i| !state.elements[i].detached && matches(state, i, selector))
        .collect()
}

fn matches(state: &DomState, idx: usize, selector: &Selector) -> bool {
    let el = &state.elements[idx];
    match selector {
        Selector::Css(raw) => {
            Selector::parse_css(raw).is_some_and(|parsed| matches(state, idx, &parsed))
        }
        Selector::Tag(tag) => el.tag == *tag,
        Selector::Id(id) => el.id.as_deref() == Some(id.as_str()),
        Selector::IdSuffix(suffix) => el.id.as_deref().is_some_and(|id| id.ends_with(suffix)),
        Selector::Attr { name, value } => {
            if name == "id" {
                el.id.as_deref() == Some(value.as_str())
            } else {
                el.attrs.get(name).map(String::as_str) == Some(value.as_str())
            }
        }
        Selector::AttrPresent(name) => el.attrs.contains_key(name),
        Selector::HasClass(class) => el.classes.contains(class),
        Selector::NotClass(class) => !el.classes.contains(class),
        Selector::WithText { base, text } => {
            matches(state, idx, base) && text_of(state, idx).contains(text)
        }
        Selector::And(parts) => parts.iter().all(|part| matches(state, idx, part)),
        Selector::Descendant {
            ancestor,
            descendant,
        } => {
            matches(state, idx, descendant)
                && ancestors(state, idx)
                    .iter()
                    .any(|&a| matches(state, a, ancestor))
        }
        Selector::DirectChild { parent, child } => {
            matches(state, idx, child)
                && el.parent.is_some_and(|p| matches(state, p, parent))
        }
        // The mock hosts frame content inline, so a frame boundary behaves
        // like an ancestor constraint.
        Selector::Frame { frame, inner } => {
            matches(state, idx, inner)
                && ancestors(state, idx)
                    .iter()
                    .any(|&a| matches(state, a, frame))
        }
    }
}

#[async_trait]
impl DomDriver for MockDom {
    async fn count(&self, selector: &Selector) -> TrazarResult<usize> {
        Ok(self.with_state(|state| query(state, selector).len()))
    }

    async fn ids(&self, selector: &Selector) -> TrazarResult<Vec<Option<String>>> {
        Ok(self.with_state(|state| {
            query(state, selector)
                .into_iter()
                .map(|idx| state.elements[idx].id.clone())
                .collect()
        }))
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> TrazarResult<Option<String>> {
        let idx = self.single_index(selector)?;
        Ok(self.with_state(|state| attribute_of(state, idx, name)))
    }

    async fn attribute_all(
        &self,
        selector: &Selector,
        name: &str,
    ) -> TrazarResult<Vec<Option<String>>> {
        Ok(self.with_state(|state| {
            query(state, selector)
                .into_iter()
                .map(|idx| attribute_of(state, idx, name))
                .collect()
        }))
    }

    async fn text_content(&self, selector: &Selector) -> TrazarResult<String> {
        let idx = self.single_index(selector)?;
        Ok(self.with_state(|state| text_of(state, idx)))
    }

    async fn texts(&self, selector: &Selector) -> TrazarResult<Vec<String>> {
        Ok(self.with_state(|state| {
            query(state, selector)
                .into_iter()
                .map(|idx| text_of(state, idx))
                .collect()
        }))
    }

    async fn is_visible(&self, selector: &Selector) -> TrazarResult<bool> {
        self.with_state(|state| {
            let found = query(state, selector);
            match found.len() {
                0 => Ok(false),
                1 => Ok(is_visible_idx(state, found[0])),
                n => Err(TrazarError::Cardinality {
                    expected: "exactly one",
                    found: n,
                    criteria: selector.summary(),
                }),
            }
        })
    }

    async fn bounding_box(&self, selector: &Selector) -> TrazarResult<BoundingBox> {
        let idx = self.single_index(selector)?;
        Ok(self.with_state(|state| state.elements[idx].bbox))
    }

    async fn click(&self, selector: &Selector) -> TrazarResult<()> {
        let idx = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state.operations.push(format!("click {}", selector.summary()));
            let selectable = state.elements[idx].classes.contains(dom::NODE_BASE_CLASS)
                || state.elements[idx].classes.contains(dom::EDGE_BASE_CLASS);
            if selectable {
                for el in &mut state.elements {
                    let _ = el.classes.remove(dom::SELECTED_CLASS);
                }
                let _ = state.elements[idx]
                    .classes
                    .insert(dom::SELECTED_CLASS.to_string());
            }
        });
        Ok(())
    }

    async fn double_click(&self, selector: &Selector) -> TrazarResult<()> {
        let _ = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state
                .operations
                .push(format!("double-click {}", selector.summary()));
        });
        Ok(())
    }

    async fn context_click(&self, selector: &Selector) -> TrazarResult<()> {
        let _ = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state
                .operations
                .push(format!("context-click {}", selector.summary()));
        });
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> TrazarResult<()> {
        let _ = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state.operations.push(format!("hover {}", selector.summary()));
        });
        Ok(())
    }

    async fn drag(&self, selector: &Selector, target: Point) -> TrazarResult<()> {
        let _ = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state.operations.push(format!(
                "drag {} to ({},{})",
                selector.summary(),
                target.x,
                target.y
            ));
        });
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> TrazarResult<()> {
        let idx = self.wait_for_single(selector).await?;
        self.with_state_mut(|state| {
            state
                .operations
                .push(format!("type \"{text}\" into {}", selector.summary()));
            state.elements[idx].text = text.to_string();
        });
        Ok(())
    }

    async fn press_key(&self, key: &str) -> TrazarResult<()> {
        self.with_state_mut(|state| {
            state.operations.push(format!("press {key}"));
            match key {
                "Delete" => {
                    let selected: Vec<usize> = (0..state.elements.len())
                        .filter(|&i| {
                            !state.elements[i].detached
                                && state.elements[i].classes.contains(dom::SELECTED_CLASS)
                        })
                        .collect();
                    for idx in selected {
                        detach_subtree(state, idx);
                    }
                }
                "Escape" => {
                    for el in &mut state.elements {
                        let _ = el.classes.remove(dom::SELECTED_CLASS);
                    }
                }
                _ => {}
            }
        });
        Ok(())
    }

    async fn click_at(&self, point: Point) -> TrazarResult<()> {
        self.with_state_mut(|state| {
            state
                .operations
                .push(format!("click-at ({},{})", point.x, point.y));
        });
        Ok(())
    }

    async fn wait_for_state(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout: Duration,
    ) -> TrazarResult<()> {
        let start = Instant::now();
        loop {
            let satisfied = self.with_state(|dom_state| {
                let found = query(dom_state, selector);
                match state {
                    ElementState::Attached => !found.is_empty(),
                    ElementState::Detached => found.is_empty(),
                    ElementState::Visible => {
                        found.len() == 1 && is_visible_idx(dom_state, found[0])
                    }
                    ElementState::Hidden => {
                        found.is_empty()
                            || found.iter().all(|&idx| !is_visible_idx(dom_state, idx))
                    }
                }
            });
            if satisfied {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(TrazarError::Timeout {
                    waiting_for: format!("element {} to be {state}", selector.summary()),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }
}

/// Start a mock-backed application for in-crate tests
#[cfg(test)]
pub(crate) async fn test_app(dom: &MockDom) -> crate::app::DiagramApp {
    dom.mark_api_ready();
    crate::app::DiagramApp::start(
        Arc::new(dom.clone()),
        Arc::new(crate::hosting::PageHost::new()),
        crate::app::AppOptions::default(),
    )
    .await
    .expect("mock-backed app should start")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seeded() -> MockDom {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("task_Push")
                .class("node")
                .attr(dom::TYPE_ATTRIBUTE, "task:manual"),
        );
        dom.insert(
            Some("task_Push"),
            MockElement::new("text").class("label").text("Push"),
        );
        dom
    }

    mod query_tests {
        use super::*;

        #[tokio::test]
        async fn test_count_by_class() {
            let dom = seeded();
            let n = dom.count(&Selector::has_class("node")).await.unwrap();
            assert_eq!(n, 1);
        }

        #[tokio::test]
        async fn test_raw_css_queries_are_parsed() {
            let dom = seeded();
            let n = dom
                .count(&Selector::css("svg.diagram-canvas g.node"))
                .await
                .unwrap();
            assert_eq!(n, 1);
        }

        #[tokio::test]
        async fn test_text_content_includes_descendants() {
            let dom = seeded();
            let text = dom
                .text_content(&Selector::id("task_Push"))
                .await
                .unwrap();
            assert_eq!(text, "Push");
        }

        #[tokio::test]
        async fn test_with_text_refinement() {
            let dom = seeded();
            let sel = Selector::has_class("node").with_text("Push");
            assert_eq!(dom.count(&sel).await.unwrap(), 1);
            let miss = Selector::has_class("node").with_text("Pull");
            assert_eq!(dom.count(&miss).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_attribute_read_requires_single_match() {
            let dom = seeded();
            dom.insert_under_selector(
                "svg.diagram-canvas",
                MockElement::new("g").id("task_Pull").class("node"),
            );
            let err = dom
                .attribute(&Selector::has_class("node"), "id")
                .await
                .unwrap_err();
            assert!(matches!(err, TrazarError::Cardinality { found: 2, .. }));
        }
    }

    mod emulation_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_selects_exclusively() {
            let dom = seeded();
            dom.insert_under_selector(
                "svg.diagram-canvas",
                MockElement::new("g").id("fork_1").class("node"),
            );
            dom.click(&Selector::id("task_Push")).await.unwrap();
            dom.click(&Selector::id("fork_1")).await.unwrap();

            let selected = dom
                .ids(&Selector::has_class(dom::SELECTED_CLASS))
                .await
                .unwrap();
            assert_eq!(selected, vec![Some("fork_1".to_string())]);
        }

        #[tokio::test]
        async fn test_delete_detaches_selected_subtree() {
            let dom = seeded();
            dom.click(&Selector::id("task_Push")).await.unwrap();
            dom.press_key("Delete").await.unwrap();

            assert_eq!(dom.count(&Selector::id("task_Push")).await.unwrap(), 0);
            assert_eq!(dom.count(&Selector::has_class("label")).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_escape_clears_selection() {
            let dom = seeded();
            dom.click(&Selector::id("task_Push")).await.unwrap();
            dom.press_key("Escape").await.unwrap();
            assert_eq!(
                dom.count(&Selector::has_class(dom::SELECTED_CLASS))
                    .await
                    .unwrap(),
                0
            );
        }

        #[tokio::test]
        async fn test_operations_are_recorded() {
            let dom = seeded();
            dom.hover(&Selector::id("task_Push")).await.unwrap();
            dom.press_key("Control+Space").await.unwrap();
            let ops = dom.operations();
            assert!(ops[0].starts_with("hover "));
            assert_eq!(ops[1], "press Control+Space");
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_detached() {
            let dom = seeded();
            let background = dom.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                background.remove("task_Push");
            });
            dom.wait_for_state(
                &Selector::id("task_Push"),
                ElementState::Detached,
                Duration::from_millis(1000),
            )
            .await
            .unwrap();
        }

        #[tokio::test]
        async fn test_wait_timeout_names_condition() {
            let dom = seeded();
            let err = dom
                .wait_for_state(
                    &Selector::id("missing"),
                    ElementState::Attached,
                    Duration::from_millis(80),
                )
                .await
                .unwrap_err();
            assert!(err.to_string().contains("to be attached"));
        }

        #[tokio::test]
        async fn test_action_auto_waits_for_element() {
            let dom = seeded();
            let background = dom.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                background.insert_under_selector(
                    "svg.diagram-canvas",
                    MockElement::new("g").id("late").class("node"),
                );
            });
            dom.click(&Selector::id("late")).await.unwrap();
        }
    }
}
