//! Edge elements with typed endpoint resolution.

use std::ops::Deref;

use crate::dom;
use crate::element::Locateable;
use crate::locator::Locator;
use crate::model::{
    DiagramElement, Graph, ModelElement, Node, RoutingPoint, RoutingPointKind,
    VolatileRoutingPoint,
};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Wrapper over a live diagram edge
#[derive(Debug, Clone)]
pub struct Edge {
    element: ModelElement,
}

impl Edge {
    /// The stored id of the edge's source element
    pub async fn source_id(&self) -> TrazarResult<String> {
        self.element
            .require_attribute(dom::EDGE_SOURCE_ATTRIBUTE)
            .await
    }

    /// The stored id of the edge's target element
    pub async fn target_id(&self) -> TrazarResult<String> {
        self.element
            .require_attribute(dom::EDGE_TARGET_ATTRIBUTE)
            .await
    }

    /// Resolve the source as a node of the given wrapper type.
    ///
    /// Matches "the element whose id suffix equals the stored source id AND
    /// whose type matches the wrapper", then re-validates type equality.
    /// The double-check guards against id collisions across
    /// independently-id'd subtrees.
    pub async fn source_of_type<N>(&self) -> TrazarResult<N>
    where
        N: DiagramElement + Deref<Target = Node>,
    {
        let source_ref = self.source_id().await?;
        self.graph()
            .typed_element_by_id_suffix::<N>(&source_ref)
            .await
    }

    /// Resolve the target as a node of the given wrapper type
    pub async fn target_of_type<N>(&self) -> TrazarResult<N>
    where
        N: DiagramElement + Deref<Target = Node>,
    {
        let target_ref = self.target_id().await?;
        self.graph()
            .typed_element_by_id_suffix::<N>(&target_ref)
            .await
    }

    /// The edge's persisted routing points, identified afresh
    pub async fn routing_points(&self) -> TrazarResult<Vec<RoutingPoint>> {
        let handles = self.point_handles(dom::ROUTING_POINT_CLASS).await?;
        Ok(handles
            .into_iter()
            .map(|(locator, kind)| RoutingPoint::new(locator, kind))
            .collect())
    }

    /// The edge's volatile routing points, present only during edits
    pub async fn volatile_routing_points(&self) -> TrazarResult<Vec<VolatileRoutingPoint>> {
        let handles = self
            .point_handles(dom::VOLATILE_ROUTING_POINT_CLASS)
            .await?;
        Ok(handles
            .into_iter()
            .map(|(locator, kind)| VolatileRoutingPoint::new(locator, kind))
            .collect())
    }

    async fn point_handles(
        &self,
        class: &str,
    ) -> TrazarResult<Vec<(Locator, RoutingPointKind)>> {
        let points = self.locator().child(Selector::has_class(class));
        let ids = points.ids().await?;
        let kinds = points.attributes(dom::KIND_ATTRIBUTE).await?;
        let mut out = Vec::with_capacity(ids.len());
        for (id, kind) in ids.into_iter().zip(kinds) {
            let id = id.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: points.resolve().summary(),
            })?;
            let raw = kind.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: dom::KIND_ATTRIBUTE.to_string(),
                selector: format!("[id=\"{id}\"]"),
            })?;
            let kind = RoutingPointKind::parse(&raw).ok_or_else(|| {
                TrazarError::InvalidAttributeValue {
                    attribute: dom::KIND_ATTRIBUTE.to_string(),
                    value: raw,
                    selector: format!("[id=\"{id}\"]"),
                }
            })?;
            out.push((self.locator().child(Selector::id(id)), kind));
        }
        Ok(out)
    }
}

impl Deref for Edge {
    type Target = ModelElement;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}

impl Locateable for Edge {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

impl DiagramElement for Edge {
    fn from_locator(graph: &Graph, locator: Locator) -> Self {
        Self {
            element: ModelElement::new(graph, locator),
        }
    }

    fn graph(&self) -> &Graph {
        self.element.graph()
    }
}

/// Relational filters for edge queries.
///
/// Each populated filter is an independent boolean check; a candidate edge
/// must pass all of them. No single filter is encoded into the element
/// query string, because relational filters require a secondary lookup
/// (resolving a stored endpoint id to a live element) that a selector
/// cannot express.
#[derive(Debug, Clone, Default)]
pub struct EdgeSearch {
    pub(crate) source: Option<Locator>,
    pub(crate) target: Option<Locator>,
    pub(crate) source_id: Option<String>,
    pub(crate) target_id: Option<String>,
    pub(crate) source_type: Option<String>,
    pub(crate) target_type: Option<String>,
}

impl EdgeSearch {
    /// An unconstrained search
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the edge's source to be the given live element
    #[must_use]
    pub fn with_source(mut self, element: &impl Locateable) -> Self {
        self.source = Some(element.locator().clone());
        self
    }

    /// Require the edge's target to be the given live element
    #[must_use]
    pub fn with_target(mut self, element: &impl Locateable) -> Self {
        self.target = Some(element.locator().clone());
        self
    }

    /// Require the edge's source id to be a suffix of the given DOM id
    #[must_use]
    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Require the edge's target id to be a suffix of the given DOM id
    #[must_use]
    pub fn with_target_id(mut self, id: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    /// Require the edge's source element to carry the given type
    #[must_use]
    pub fn with_source_type(mut self, element_type: impl Into<String>) -> Self {
        self.source_type = Some(element_type.into());
        self
    }

    /// Require the edge's target element to carry the given type
    #[must_use]
    pub fn with_target_type(mut self, element_type: impl Into<String>) -> Self {
        self.target_type = Some(element_type.into());
        self
    }

    /// Describe the populated filters for error messages
    #[must_use]
    pub(crate) fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(locator) = &self.source {
            parts.push(format!("source matching {}", locator.resolve().summary()));
        }
        if let Some(id) = &self.source_id {
            parts.push(format!("source id `{id}`"));
        }
        if let Some(ty) = &self.source_type {
            parts.push(format!("source type `{ty}`"));
        }
        if let Some(locator) = &self.target {
            parts.push(format!("target matching {}", locator.resolve().summary()));
        }
        if let Some(id) = &self.target_id {
            parts.push(format!("target id `{id}`"));
        }
        if let Some(ty) = &self.target_type {
            parts.push(format!("target type `{ty}`"));
        }
        if parts.is_empty() {
            "no endpoint filters".to_string()
        } else {
            parts.join(" and ")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::diagram_edge;
    use crate::flows::{Clickable, RoutingPointCapable, Selectable};
    use crate::mock::{test_app, MockDom, MockElement};
    use crate::selector::Selector;
    use crate::wait::WaitOptions;

    diagram_edge! {
        pub struct BendyEdge: "edge", capabilities = [Clickable, Selectable, RoutingPointCapable];
    }

    fn edge_dom() -> MockDom {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
        dom.insert_under_selector(
            "svg.diagram-canvas",
            MockElement::new("g")
                .id("edge_1")
                .class("edge")
                .attr(crate::dom::TYPE_ATTRIBUTE, "edge")
                .attr(crate::dom::EDGE_SOURCE_ATTRIBUTE, "task_Push")
                .attr(crate::dom::EDGE_TARGET_ATTRIBUTE, "fork_1"),
        );
        dom
    }

    fn routing_point(dom: &MockDom, id: &str, kind: &str, volatile: bool) {
        let class = if volatile {
            "volatile-routing-point"
        } else {
            "routing-point"
        };
        dom.insert(
            Some("edge_1"),
            MockElement::new("circle")
                .id(id)
                .class(class)
                .attr(crate::dom::KIND_ATTRIBUTE, kind)
                .at(50.0, 60.0, 8.0, 8.0),
        );
    }

    async fn edge(dom: &MockDom) -> BendyEdge {
        BendyEdge::register();
        let app = test_app(dom).await;
        app.graph()
            .get_element(Selector::id("edge_1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_routing_points_are_identified_afresh() {
        let dom = edge_dom();
        routing_point(&dom, "rp_0", "junction", false);
        routing_point(&dom, "vrp_0", "line", true);
        let edge = edge(&dom).await;

        let points = edge.routing_points().await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].kind(), RoutingPointKind::Junction);

        let volatile = edge.volatile_routing_points().await.unwrap();
        assert_eq!(volatile.len(), 1);
        assert_eq!(volatile[0].kind(), RoutingPointKind::Line);

        // ids are re-read on every query, so a regenerated id is picked up
        dom.remove("rp_0");
        routing_point(&dom, "rp_7", "junction", false);
        let points = edge.routing_points().await.unwrap();
        assert_eq!(points.len(), 1);
        let position = points[0].position().await.unwrap();
        assert!((position.x - 54.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_kind_attribute_fails_loudly() {
        let dom = edge_dom();
        dom.insert(
            Some("edge_1"),
            MockElement::new("circle").id("rp_0").class("routing-point"),
        );
        let edge = edge(&dom).await;

        let err = edge.routing_points().await.unwrap_err();
        assert!(matches!(err, TrazarError::MissingAttribute { .. }));
    }

    // Routing points appear asynchronously after the edge is selected; the
    // flow polls until the minimum count is reached.
    #[tokio::test]
    async fn test_select_and_wait_for_routing_points() {
        let dom = edge_dom();
        let edge = edge(&dom).await;

        let background = dom.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            routing_point(&background, "rp_0", "source", false);
            routing_point(&background, "rp_1", "target", false);
        });

        let points = edge
            .select_and_wait_for_routing_points(2, &WaitOptions::default())
            .await
            .unwrap();
        assert_eq!(points.len(), 2);
        assert!(edge.is_selected().await.unwrap());
    }

    #[tokio::test]
    async fn test_routing_point_wait_times_out_loudly() {
        let dom = edge_dom();
        let edge = edge(&dom).await;

        let options = WaitOptions::default().with_timeout(150).with_poll_interval(30);
        let err = edge
            .select_and_wait_for_routing_points(1, &options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("routing point"));
    }
}
