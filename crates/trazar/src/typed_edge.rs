//! Typed edge decorator.
//!
//! Narrows an edge's `source()`/`target()` accessors to statically-known
//! node types when the caller supplies hints. Rendered as an explicit
//! decorator with pre-declared hint flags rather than a dynamic proxy:
//! an accessor invoked without its corresponding hint fails immediately
//! with a descriptive error instead of degrading to the untyped resolver,
//! and every other operation falls through to the wrapped edge via
//! `Deref`.

use std::marker::PhantomData;
use std::ops::Deref;

use crate::element::Locateable;
use crate::locator::Locator;
use crate::model::{DiagramElement, Edge, Graph, Node};
use crate::result::{TrazarError, TrazarResult};

/// Placeholder for an endpoint whose type was not hinted.
///
/// Never constructed: the hint flag is checked before resolution.
#[derive(Debug, Clone)]
pub struct UnhintedEndpoint {
    inner: Node,
}

impl Deref for UnhintedEndpoint {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Locateable for UnhintedEndpoint {
    fn locator(&self) -> &Locator {
        self.inner.locator()
    }
}

impl DiagramElement for UnhintedEndpoint {
    fn from_locator(graph: &Graph, locator: Locator) -> Self {
        Self {
            inner: Node::from_locator(graph, locator),
        }
    }

    fn graph(&self) -> &Graph {
        self.inner.graph()
    }
}

/// An edge whose endpoint accessors are narrowed to known node types
#[derive(Debug, Clone)]
pub struct TypedEdge<S, T> {
    edge: Edge,
    source_hinted: bool,
    target_hinted: bool,
    _hints: PhantomData<fn() -> (S, T)>,
}

impl<S, T> TypedEdge<S, T>
where
    S: DiagramElement + Deref<Target = Node>,
    T: DiagramElement + Deref<Target = Node>,
{
    /// Resolve the source as the hinted node type
    pub async fn source(&self) -> TrazarResult<S> {
        if !self.source_hinted {
            return Err(TrazarError::MissingTypeHint { accessor: "source" });
        }
        self.edge.source_of_type::<S>().await
    }

    /// Resolve the target as the hinted node type
    pub async fn target(&self) -> TrazarResult<T> {
        if !self.target_hinted {
            return Err(TrazarError::MissingTypeHint { accessor: "target" });
        }
        self.edge.target_of_type::<T>().await
    }
}

impl<S, T> Deref for TypedEdge<S, T> {
    type Target = Edge;

    fn deref(&self) -> &Self::Target {
        &self.edge
    }
}

impl Edge {
    /// Narrow both endpoint accessors to known node types
    #[must_use]
    pub fn typed<S, T>(&self) -> TypedEdge<S, T>
    where
        S: DiagramElement + Deref<Target = Node>,
        T: DiagramElement + Deref<Target = Node>,
    {
        TypedEdge {
            edge: self.clone(),
            source_hinted: true,
            target_hinted: true,
            _hints: PhantomData,
        }
    }

    /// Narrow only the source accessor
    #[must_use]
    pub fn typed_source<S>(&self) -> TypedEdge<S, UnhintedEndpoint>
    where
        S: DiagramElement + Deref<Target = Node>,
    {
        TypedEdge {
            edge: self.clone(),
            source_hinted: true,
            target_hinted: false,
            _hints: PhantomData,
        }
    }

    /// Narrow only the target accessor
    #[must_use]
    pub fn typed_target<T>(&self) -> TypedEdge<UnhintedEndpoint, T>
    where
        T: DiagramElement + Deref<Target = Node>,
    {
        TypedEdge {
            edge: self.clone(),
            source_hinted: false,
            target_hinted: true,
            _hints: PhantomData,
        }
    }
}
