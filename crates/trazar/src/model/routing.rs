//! Routing points: transient sub-elements of an edge.
//!
//! Persisted routing points survive re-renders; volatile ones exist only
//! while an edge is being interactively edited. Both appear and disappear
//! as the edge is selected, dragged or realigned, and their DOM ids may be
//! regenerated, so they are identified afresh on every query.

use serde::{Deserialize, Serialize};

use crate::element::Locateable;
use crate::locator::{Locator, Point};
use crate::result::TrazarResult;

/// Positional kind of a routing point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingPointKind {
    /// Bend at a junction between segments
    Junction,
    /// Point on a straight segment
    Line,
    /// Anchor at the edge's source
    Source,
    /// Anchor at the edge's target
    Target,
}

impl RoutingPointKind {
    /// Kind name as stamped in the DOM
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Junction => "junction",
            Self::Line => "line",
            Self::Source => "source",
            Self::Target => "target",
        }
    }

    /// Parse a kind from its DOM attribute value
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "junction" => Some(Self::Junction),
            "line" => Some(Self::Line),
            "source" => Some(Self::Source),
            "target" => Some(Self::Target),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoutingPointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted bend point of an edge
#[derive(Debug, Clone)]
pub struct RoutingPoint {
    locator: Locator,
    kind: RoutingPointKind,
}

impl RoutingPoint {
    pub(crate) fn new(locator: Locator, kind: RoutingPointKind) -> Self {
        Self { locator, kind }
    }

    /// The point's positional kind
    #[must_use]
    pub const fn kind(&self) -> RoutingPointKind {
        self.kind
    }

    /// Current position (bounding-box center)
    pub async fn position(&self) -> TrazarResult<Point> {
        Ok(self.locator.bounding_box().await?.center())
    }

    /// Drag the point to a new position
    pub async fn drag_to(&self, target: Point) -> TrazarResult<()> {
        self.locator.drag_to(target).await
    }
}

impl Locateable for RoutingPoint {
    fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// An interactively-editable bend point, present only while the edge is
/// being edited
#[derive(Debug, Clone)]
pub struct VolatileRoutingPoint {
    locator: Locator,
    kind: RoutingPointKind,
}

impl VolatileRoutingPoint {
    pub(crate) fn new(locator: Locator, kind: RoutingPointKind) -> Self {
        Self { locator, kind }
    }

    /// The point's positional kind
    #[must_use]
    pub const fn kind(&self) -> RoutingPointKind {
        self.kind
    }

    /// Current position (bounding-box center)
    pub async fn position(&self) -> TrazarResult<Point> {
        Ok(self.locator.bounding_box().await?.center())
    }

    /// Drag the point to a new position
    pub async fn drag_to(&self, target: Point) -> TrazarResult<()> {
        self.locator.drag_to(target).await
    }
}

impl Locateable for VolatileRoutingPoint {
    fn locator(&self) -> &Locator {
        &self.locator
    }
}
