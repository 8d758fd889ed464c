//! Capability flows: independently-authored units of page-object behavior.
//!
//! Each flow is a trait with default async method bodies, bounded only on
//! the minimal capability surface it actually needs — supertrait bounds
//! encode "requires capability X". A wrapper class opts into a flow with an
//! empty `impl`, usually written for it by the composition macros. Flows
//! are pure and state-free, so attaching {A, B} behaves identically to
//! {B, A}.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::dom;
use crate::driver::ElementState;
use crate::element::Locateable;
use crate::interaction::{CommandPalette, Popup};
use crate::locator::{Locator, Point, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::model::{Edge, RoutingPoint};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;
use crate::wait::WaitOptions;

/// Click interactions
#[async_trait]
pub trait Clickable: Locateable {
    /// Click the element
    async fn click(&self) -> TrazarResult<()> {
        self.locator().click().await
    }

    /// Double-click the element
    async fn double_click(&self) -> TrazarResult<()> {
        self.locator().double_click().await
    }
}

/// Hover interactions
#[async_trait]
pub trait Hoverable: Locateable {
    /// Hover the element
    async fn hover(&self) -> TrazarResult<()> {
        self.locator().hover().await
    }
}

/// Drag interactions
#[async_trait]
pub trait Draggable: Locateable {
    /// Drag the element to an absolute point
    async fn drag_to_point(&self, target: Point) -> TrazarResult<()> {
        self.locator().drag_to(target).await
    }

    /// Drag the element onto the center of another element
    async fn drag_onto<O: Locateable + ?Sized>(&self, other: &O) -> TrazarResult<()> {
        let target = other.locator().bounding_box().await?.center();
        self.locator().drag_to(target).await
    }
}

/// Selection interactions
#[async_trait]
pub trait Selectable: Clickable {
    /// Select the element (click-to-select semantics)
    async fn select(&self) -> TrazarResult<()> {
        self.click().await
    }

    /// Whether the element carries the selection marker class
    async fn is_selected(&self) -> TrazarResult<bool> {
        let classes = self.locator().attribute("class").await?.unwrap_or_default();
        Ok(classes
            .split_whitespace()
            .any(|class| class == dom::SELECTED_CLASS))
    }

    /// Clear the current selection
    async fn deselect(&self) -> TrazarResult<()> {
        self.app().driver().press_key("Escape").await
    }
}

/// Keyboard deletion flow
#[async_trait]
pub trait Deletable: Selectable {
    /// Select the element, delete it by keyboard, and wait until it is
    /// fully detached from the document.
    ///
    /// Waits for the `detached` state explicitly instead of polling the
    /// match count, so the element disappearing mid-operation cannot
    /// produce a spurious failure.
    async fn delete_by_keyboard(&self) -> TrazarResult<()> {
        self.select().await?;
        self.app().driver().press_key("Delete").await?;
        self.locator()
            .wait_for_state(
                ElementState::Detached,
                Duration::from_millis(DEFAULT_TIMEOUT_MS),
            )
            .await
    }
}

/// Label renaming flow
#[async_trait]
pub trait Renameable: Clickable {
    /// Open the label editor by double-click and commit a new label
    async fn rename(&self, new_label: &str) -> TrazarResult<()> {
        self.double_click().await?;
        let editor = self.app().label_editor();
        editor.overwrite(new_label).await
    }
}

/// Corner of a resize handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandleKind {
    /// North-west corner
    TopLeft,
    /// North-east corner
    TopRight,
    /// South-west corner
    BottomLeft,
    /// South-east corner
    BottomRight,
}

impl ResizeHandleKind {
    /// Kind name as stamped in the DOM
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "nw",
            Self::TopRight => "ne",
            Self::BottomLeft => "sw",
            Self::BottomRight => "se",
        }
    }
}

/// Resize flow over the selection's corner handles
#[async_trait]
pub trait Resizable: Selectable {
    /// Locator of one of the element's resize handles
    fn resize_handle_locator(&self, kind: ResizeHandleKind) -> Locator {
        self.locator().child(
            Selector::has_class(dom::RESIZE_HANDLE_CLASS)
                .and(Selector::attr(dom::KIND_ATTRIBUTE, kind.as_str())),
        )
    }

    /// Select the element and drag a corner handle by a delta
    async fn resize_by(&self, kind: ResizeHandleKind, delta: Point) -> TrazarResult<()> {
        self.select().await?;
        let handle = self.resize_handle_locator(kind);
        let center = handle.bounding_box().await?.center();
        handle
            .drag_to(Point::new(center.x + delta.x, center.y + delta.y))
            .await
    }
}

/// Hover popup flow
#[async_trait]
pub trait PopupCapable: Hoverable {
    /// Hover the element and wait for the popup to open
    async fn open_popup(&self) -> TrazarResult<Popup> {
        self.hover().await?;
        let popup = self.app().popup();
        popup.wait_open().await?;
        Ok(popup)
    }
}

/// Severity of a validation marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Validation error
    Error,
    /// Validation warning
    Warning,
    /// Informational marker
    Info,
}

impl MarkerKind {
    /// Parse a kind from its DOM attribute value
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// A validation marker attached to an element
#[derive(Debug, Clone)]
pub struct Marker {
    locator: Locator,
    kind: MarkerKind,
}

impl Marker {
    /// The marker's severity
    #[must_use]
    pub const fn kind(&self) -> MarkerKind {
        self.kind
    }

    /// The marker's locator
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// Validation marker access
#[async_trait]
pub trait Markable: Locateable {
    /// The element's validation markers
    async fn markers(&self) -> TrazarResult<Vec<Marker>> {
        let markers = self
            .locator()
            .child(Selector::has_class(dom::MARKER_CLASS));
        let ids = markers.ids().await?;
        let kinds = markers.attributes(dom::KIND_ATTRIBUTE).await?;
        let mut out = Vec::with_capacity(ids.len());
        for (id, kind) in ids.into_iter().zip(kinds) {
            let id = id.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: markers.resolve().summary(),
            })?;
            let raw = kind.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: dom::KIND_ATTRIBUTE.to_string(),
                selector: format!("[id=\"{id}\"]"),
            })?;
            let kind = MarkerKind::parse(&raw).ok_or_else(|| {
                TrazarError::InvalidAttributeValue {
                    attribute: dom::KIND_ATTRIBUTE.to_string(),
                    value: raw,
                    selector: format!("[id=\"{id}\"]"),
                }
            })?;
            out.push(Marker {
                locator: self.locator().child(Selector::id(id)),
                kind,
            });
        }
        Ok(out)
    }
}

/// Command palette flow: open the palette against the selected element
#[async_trait]
pub trait CommandPaletteCapable: Selectable {
    /// Select the element and open the command palette
    async fn open_command_palette(&self) -> TrazarResult<CommandPalette> {
        self.select().await?;
        let palette = self.app().command_palette();
        palette.open().await?;
        Ok(palette)
    }
}

/// Routing point flow for edge wrappers
#[async_trait]
pub trait RoutingPointCapable: Selectable + std::ops::Deref<Target = Edge> {
    /// Select the edge and wait until at least `minimum` routing points
    /// have appeared
    async fn select_and_wait_for_routing_points(
        &self,
        minimum: usize,
        options: &WaitOptions,
    ) -> TrazarResult<Vec<RoutingPoint>> {
        self.select().await?;
        let start = Instant::now();
        loop {
            let points = self.routing_points().await?;
            if points.len() >= minimum {
                return Ok(points);
            }
            if start.elapsed() >= options.timeout() {
                return Err(TrazarError::Timeout {
                    waiting_for: format!("{minimum} routing point(s) to appear"),
                    ms: options.timeout_ms,
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagram_node;
    use crate::mock::{test_app, MockDom, MockElement};

    diagram_node! {
        pub struct FlowProbe: "probe:flow", capabilities = [Clickable, Hoverable, Draggable, Selectable, Deletable, Markable];
    }

    fn probe_dom() -> MockDom {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("probe_1")
                .class("node")
                .attr(crate::dom::TYPE_ATTRIBUTE, "probe:flow")
                .at(100.0, 100.0, 40.0, 20.0),
        );
        dom
    }

    async fn probe(dom: &MockDom) -> FlowProbe {
        FlowProbe::register();
        let app = test_app(dom).await;
        let graph = app.graph();
        graph
            .get_element(crate::selector::Selector::id("probe_1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_select_flow_marks_element() {
        let dom = probe_dom();
        let element = probe(&dom).await;

        assert!(!element.is_selected().await.unwrap());
        element.select().await.unwrap();
        assert!(element.is_selected().await.unwrap());
        element.deselect().await.unwrap();
        assert!(!element.is_selected().await.unwrap());
    }

    // Keyboard deletion drives count 1 -> 0 and waits for full detachment
    // without throwing.
    #[tokio::test]
    async fn test_delete_by_keyboard_waits_for_detachment() {
        let dom = probe_dom();
        let element = probe(&dom).await;

        assert_eq!(element.locator().count().await.unwrap(), 1);
        element.delete_by_keyboard().await.unwrap();
        assert_eq!(element.locator().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drag_flow_records_target() {
        let dom = probe_dom();
        let element = probe(&dom).await;

        element
            .drag_to_point(Point::new(300.0, 200.0))
            .await
            .unwrap();
        let ops = dom.operations();
        assert!(ops.iter().any(|op| op.contains("drag") && op.contains("(300,200)")));
    }

    #[tokio::test]
    async fn test_markers_are_enumerated_with_kinds() {
        let dom = probe_dom();
        dom.insert(
            Some("probe_1"),
            MockElement::new("g")
                .id("marker_0")
                .class("marker")
                .attr(crate::dom::KIND_ATTRIBUTE, "error"),
        );
        dom.insert(
            Some("probe_1"),
            MockElement::new("g")
                .id("marker_1")
                .class("marker")
                .attr(crate::dom::KIND_ATTRIBUTE, "warning"),
        );
        let element = probe(&dom).await;

        let markers = element.markers().await.unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].kind(), MarkerKind::Error);
        assert_eq!(markers[1].kind(), MarkerKind::Warning);
    }

    diagram_node! {
        pub struct RichProbe: "probe:rich", capabilities = [Clickable, Hoverable, Selectable, Renameable, Resizable, PopupCapable, CommandPaletteCapable];
    }

    async fn rich_probe(dom: &MockDom) -> RichProbe {
        RichProbe::register();
        let app = test_app(dom).await;
        app.graph()
            .get_element(crate::selector::Selector::id("rich_1"))
            .await
            .unwrap()
    }

    fn rich_dom() -> MockDom {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("rich_1")
                .class("node")
                .attr(crate::dom::TYPE_ATTRIBUTE, "probe:rich")
                .at(100.0, 100.0, 60.0, 40.0),
        );
        dom
    }

    #[tokio::test]
    async fn test_rename_flow_edits_through_the_label_editor() {
        let dom = rich_dom();
        dom.insert(None, MockElement::new("div").id("editor").class("label-editor"));
        dom.insert(Some("editor"), MockElement::new("input").id("editor_input"));
        let element = rich_probe(&dom).await;

        element.rename("Renamed8").await.unwrap();

        let ops = dom.operations();
        assert!(ops[0].starts_with("double-click"));
        assert!(ops[1].contains("type \"Renamed8\""));
        assert_eq!(ops[2], "press Enter");
    }

    #[tokio::test]
    async fn test_popup_flow_hovers_then_reads() {
        let dom = rich_dom();
        dom.insert(
            None,
            MockElement::new("div")
                .id("popup")
                .class("diagram-popup")
                .class("hidden")
                .text("probe details"),
        );
        let element = rich_probe(&dom).await;

        let background = dom.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(40)).await;
            background.remove_class("popup", "hidden");
        });

        let popup = element.open_popup().await.unwrap();
        assert_eq!(popup.text().await.unwrap(), "probe details");
        assert!(dom.operations()[0].starts_with("hover"));
    }

    #[tokio::test]
    async fn test_resize_flow_drags_the_corner_handle() {
        let dom = rich_dom();
        dom.insert(
            Some("rich_1"),
            MockElement::new("rect")
                .id("handle_se")
                .class("resize-handle")
                .attr(crate::dom::KIND_ATTRIBUTE, "se")
                .at(156.0, 136.0, 8.0, 8.0),
        );
        let element = rich_probe(&dom).await;

        element
            .resize_by(ResizeHandleKind::BottomRight, Point::new(20.0, 10.0))
            .await
            .unwrap();

        let ops = dom.operations();
        // select first, then drag the handle from its center by the delta
        assert!(ops[0].starts_with("click"));
        assert!(ops[1].contains("drag") && ops[1].contains("(180,150)"));
    }

    #[tokio::test]
    async fn test_command_palette_flow_opens_against_selection() {
        let dom = rich_dom();
        dom.insert(None, MockElement::new("div").id("cmd").class("command-palette"));
        let element = rich_probe(&dom).await;

        let palette = element.open_command_palette().await.unwrap();
        assert!(palette.is_open().await.unwrap());
        assert!(element.is_selected().await.unwrap());
        assert!(dom
            .operations()
            .iter()
            .any(|op| op == "press Control+Space"));
    }

    #[tokio::test]
    async fn test_marker_with_unknown_kind_fails() {
        let dom = probe_dom();
        dom.insert(
            Some("probe_1"),
            MockElement::new("g")
                .id("marker_0")
                .class("marker")
                .attr(crate::dom::KIND_ATTRIBUTE, "fatal"),
        );
        let element = probe(&dom).await;

        let err = element.markers().await.unwrap_err();
        assert!(matches!(err, TrazarError::InvalidAttributeValue { .. }));
    }
}
