//! DOM contract shared with the diagram client.
//!
//! The rendering pipeline stamps every committed element with bookkeeping
//! attributes and marker classes. All selector generation goes through these
//! constants; query code never spells the strings out.

/// Attribute carrying the logical element type (e.g. `task:manual`)
pub const TYPE_ATTRIBUTE: &str = "data-diagram-type";

/// Attribute set on `body` once the client's metadata API is attached
pub const API_MARKER_ATTRIBUTE: &str = "data-diagram-api";

/// Class marking a transient, not-yet-committed element
pub const GHOST_CLASS: &str = "ghost";

/// Class marking a selected element
pub const SELECTED_CLASS: &str = "selected";

/// Class marking a hidden element (mock backend visibility contract)
pub const HIDDEN_CLASS: &str = "hidden";

/// Attribute storing an edge's source element id
pub const EDGE_SOURCE_ATTRIBUTE: &str = "data-edge-source";

/// Attribute storing an edge's target element id
pub const EDGE_TARGET_ATTRIBUTE: &str = "data-edge-target";

/// Attribute carrying the kind of a routing point, marker, or resize handle
pub const KIND_ATTRIBUTE: &str = "data-kind";

/// Class of a node's label child
pub const LABEL_CLASS: &str = "label";

/// Class of a persisted routing point
pub const ROUTING_POINT_CLASS: &str = "routing-point";

/// Class of an interactively-editable routing point
pub const VOLATILE_ROUTING_POINT_CLASS: &str = "volatile-routing-point";

/// Class of a validation marker child
pub const MARKER_CLASS: &str = "marker";

/// Class of a resize handle child
pub const RESIZE_HANDLE_CLASS: &str = "resize-handle";

/// Base-kind class of node elements, present from first render
pub const NODE_BASE_CLASS: &str = "node";

/// Base-kind class of edge elements, present from first render
pub const EDGE_BASE_CLASS: &str = "edge";

/// Base-kind class of generic html elements
pub const HTML_BASE_CLASS: &str = "html-element";

/// Default selector of the diagram canvas inside the hosting context
pub const DEFAULT_GRAPH_SELECTOR: &str = "svg.diagram-canvas";
