//! Node elements: labelled entities with children and connected edges.

use std::ops::Deref;

use crate::dom;
use crate::element::Locateable;
use crate::locator::Locator;
use crate::metadata::Metadata;
use crate::model::{DiagramElement, Edge, EdgeSearch, Graph, ModelElement};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Depth of a child query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildDepth {
    /// Direct children only
    Direct,
    /// Descendants at any depth
    Any,
}

/// Direction of an edge relative to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Edges whose target is the node
    Incoming,
    /// Edges whose source is the node
    Outgoing,
}

/// Wrapper over a live diagram node
#[derive(Debug, Clone)]
pub struct Node {
    element: ModelElement,
}

impl Node {
    /// The node's display label (text of its label child)
    pub async fn label(&self) -> TrazarResult<String> {
        self.locator()
            .child(Selector::has_class(dom::LABEL_CLASS))
            .text_content()
            .await
    }

    /// Locator over the node's children matching a query
    #[must_use]
    pub fn children_locator(&self, query: Selector, depth: ChildDepth) -> Locator {
        match depth {
            ChildDepth::Direct => self.locator().direct_child(query),
            ChildDepth::Any => self.locator().child(query),
        }
    }

    /// All settled children of the given wrapper type
    pub async fn children_of_type<T: DiagramElement>(
        &self,
        depth: ChildDepth,
    ) -> TrazarResult<Vec<T>> {
        let selector = Metadata::settled_type_selector::<T>()?;
        let ids = self.children_locator(selector.clone(), depth).ids().await?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.ok_or_else(|| TrazarError::MissingAttribute {
                attribute: "id".to_string(),
                selector: selector.summary(),
            })?;
            out.push(self.graph().adopt_by_id::<T>(&id));
        }
        Ok(out)
    }

    /// Edges of the given wrapper type connected to this node
    pub async fn edges_of_type<E>(&self, direction: EdgeDirection) -> TrazarResult<Vec<E>>
    where
        E: DiagramElement + Deref<Target = Edge>,
    {
        self.edges_matching(direction, EdgeSearch::new()).await
    }

    /// Connected edges narrowed by additional neighbor filters.
    ///
    /// The node itself becomes the source (outgoing) or target (incoming)
    /// filter; the remaining filters of `search` apply to the far end.
    pub async fn edges_matching<E>(
        &self,
        direction: EdgeDirection,
        search: EdgeSearch,
    ) -> TrazarResult<Vec<E>>
    where
        E: DiagramElement + Deref<Target = Edge>,
    {
        let dom_id = self.dom_id().await?;
        let search = match direction {
            EdgeDirection::Outgoing => search.with_source_id(dom_id),
            EdgeDirection::Incoming => search.with_target_id(dom_id),
        };
        self.graph().get_edges_matching::<E>(&search).await
    }
}

impl Deref for Node {
    type Target = ModelElement;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}

impl Locateable for Node {
    fn locator(&self) -> &Locator {
        self.element.locator()
    }
}

impl DiagramElement for Node {
    fn from_locator(graph: &Graph, locator: Locator) -> Self {
        Self {
            element: ModelElement::new(graph, locator),
        }
    }

    fn graph(&self) -> &Graph {
        self.element.graph()
    }
}
