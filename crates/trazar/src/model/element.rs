//! Generic model element with loud-failing bookkeeping readers.

use serde::{Deserialize, Serialize};

use crate::dom;
use crate::element::Locateable;
use crate::locator::Locator;
use crate::model::{DiagramElement, Graph, RoutingPointKind};
use crate::result::{TrazarError, TrazarResult};

/// Point-in-time snapshot of an element's bookkeeping attributes, taken
/// for later comparison across a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    /// DOM id
    pub id: String,
    /// Class list
    pub classes: Vec<String>,
    /// Logical element type
    pub element_type: String,
    /// Positional kind, for routing points
    pub kind: Option<RoutingPointKind>,
}

/// Wrapper over one live diagram entity of any kind.
///
/// Every diagram element is expected to always carry its bookkeeping
/// attributes (`id`, `class`, the type attribute); their absence indicates
/// a framework or markup bug and the readers fail loudly rather than
/// returning an optional value.
#[derive(Debug, Clone)]
pub struct ModelElement {
    locator: Locator,
    graph: Graph,
}

impl ModelElement {
    /// Create an element over a validated locator
    #[must_use]
    pub fn new(graph: &Graph, locator: Locator) -> Self {
        Self {
            locator,
            graph: graph.clone(),
        }
    }

    pub(crate) async fn require_attribute(&self, name: &str) -> TrazarResult<String> {
        self.locator
            .attribute(name)
            .await?
            .ok_or_else(|| TrazarError::MissingAttribute {
                attribute: name.to_string(),
                selector: self.locator.resolve().summary(),
            })
    }

    /// The element's DOM id
    pub async fn dom_id(&self) -> TrazarResult<String> {
        self.require_attribute("id").await
    }

    /// The element's class list
    pub async fn class_list(&self) -> TrazarResult<Vec<String>> {
        let raw = self.require_attribute("class").await?;
        Ok(raw.split_whitespace().map(str::to_string).collect())
    }

    /// The element's logical type
    pub async fn element_type(&self) -> TrazarResult<String> {
        self.require_attribute(dom::TYPE_ATTRIBUTE).await
    }

    /// Whether the element carries the selection marker class
    pub async fn is_selected(&self) -> TrazarResult<bool> {
        Ok(self
            .class_list()
            .await?
            .iter()
            .any(|class| class == dom::SELECTED_CLASS))
    }

    /// Take an attribute snapshot for later comparison
    pub async fn snapshot(&self) -> TrazarResult<AttributeSnapshot> {
        let kind = match self.locator.attribute(dom::KIND_ATTRIBUTE).await? {
            Some(raw) => RoutingPointKind::parse(&raw),
            None => None,
        };
        Ok(AttributeSnapshot {
            id: self.dom_id().await?,
            classes: self.class_list().await?,
            element_type: self.element_type().await?,
            kind,
        })
    }
}

impl Locateable for ModelElement {
    fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl DiagramElement for ModelElement {
    fn from_locator(graph: &Graph, locator: Locator) -> Self {
        Self::new(graph, locator)
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{test_app, MockDom, MockElement};
    use crate::selector::Selector;

    async fn element_for(dom: &MockDom, query: Selector) -> ModelElement {
        let app = test_app(dom).await;
        let graph = app.graph();
        let locator = graph.locator().child(query);
        ModelElement::new(&graph, locator)
    }

    #[tokio::test]
    async fn test_bookkeeping_readers() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("task_Push")
                .class("node")
                .class("task")
                .attr(crate::dom::TYPE_ATTRIBUTE, "task:manual"),
        );
        let element = element_for(&dom, Selector::id("task_Push")).await;

        assert_eq!(element.dom_id().await.unwrap(), "task_Push");
        assert_eq!(element.element_type().await.unwrap(), "task:manual");
        assert_eq!(
            element.class_list().await.unwrap(),
            vec!["node".to_string(), "task".to_string()]
        );
        assert!(!element.is_selected().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_attribute_fails_loudly() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g").id("bare").class("node"),
        );
        let element = element_for(&dom, Selector::id("bare")).await;

        let err = element.element_type().await.unwrap_err();
        assert!(matches!(err, TrazarError::MissingAttribute { .. }));
        assert!(err.to_string().contains("data-diagram-type"));
    }

    #[tokio::test]
    async fn test_snapshot_captures_bookkeeping() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("circle")
                .id("rp_0")
                .class("routing-point")
                .class("node")
                .attr(crate::dom::TYPE_ATTRIBUTE, "routing-point")
                .attr(crate::dom::KIND_ATTRIBUTE, "junction"),
        );
        let element = element_for(&dom, Selector::id("rp_0")).await;

        let snapshot = element.snapshot().await.unwrap();
        assert_eq!(snapshot.id, "rp_0");
        assert_eq!(snapshot.element_type, "routing-point");
        assert_eq!(snapshot.kind, Some(RoutingPointKind::Junction));
    }
}
