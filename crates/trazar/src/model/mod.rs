//! Diagram model element hierarchy.
//!
//! Runtime wrappers over live diagram entities: the generic
//! [`ModelElement`], [`Node`] and [`Edge`] built on top of it, transient
//! routing points, and the [`Graph`] query root that constructs and
//! validates all of them. Wrappers are created on every query and never
//! cache DOM identity; each call re-resolves against the live document.

mod edge;
mod element;
mod graph;
mod node;
mod routing;

pub use edge::{Edge, EdgeSearch};
pub use element::{AttributeSnapshot, ModelElement};
pub use graph::Graph;
pub use node::{ChildDepth, EdgeDirection, Node};
pub use routing::{RoutingPoint, RoutingPointKind, VolatileRoutingPoint};

use crate::element::Locateable;
use crate::locator::Locator;

/// A runtime wrapper over one live diagram entity.
///
/// Implementations are constructed by the [`Graph`] after cardinality and
/// type validation; they are short-lived and scoped to one test step.
/// `'static` because metadata lookups key on the wrapper's `TypeId`.
pub trait DiagramElement: Locateable + Sized + 'static {
    /// Construct the wrapper over a validated locator
    fn from_locator(graph: &Graph, locator: Locator) -> Self;

    /// The owning graph
    fn graph(&self) -> &Graph;
}
