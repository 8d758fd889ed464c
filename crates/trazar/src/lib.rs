//! Trazar: page-object testing framework for SVG diagram editors.
//!
//! Trazar (Spanish: "to trace/draw") drives and asserts against graphical
//! modeling clients rendered as SVG in a browser, embedded in a plain
//! page, an IDE webview, or a desktop shell. Wrapper classes are composed
//! from independent capability flows, resolved lazily against the live,
//! mutating document, and validated through an out-of-band type registry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      TRAZAR Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────┐   ┌──────────────┐               │
//! │  │ Test      │   │ Graph      │   │ Hosting      │               │
//! │  │ (wrapper  │──►│ queries +  │──►│ context      │──► browser    │
//! │  │  classes) │   │ wait engine│   │ (page/frame/ │    (CDP or    │
//! │  └───────────┘   └────────────┘   │  desktop)    │     mock DOM) │
//! │                                   └──────────────┘               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trazar::flows::{Clickable, Deletable, Selectable};
//! use trazar::{AppOptions, DiagramApp, MockDom, PageHost};
//!
//! trazar::diagram_node! {
//!     pub struct TaskManual: "task:manual", capabilities = [Clickable, Selectable, Deletable];
//! }
//!
//! # async fn run(dom: MockDom) -> trazar::TrazarResult<()> {
//! TaskManual::register();
//! let app = DiagramApp::start(
//!     Arc::new(dom),
//!     Arc::new(PageHost::new()),
//!     AppOptions::default(),
//! )
//! .await?;
//!
//! let task: TaskManual = app.graph().get_node_by_label("Push").await?;
//! task.delete_by_keyboard().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Application root object and launch options
pub mod app;
/// Composition macros for wrapper classes
pub mod compose;
/// DOM contract shared with the diagram client
pub mod dom;
/// Automation driver contract
pub mod driver;
/// Element base capabilities
pub mod element;
/// Capability flows
pub mod flows;
/// Hosting-context adapters
pub mod hosting;
/// Workbench interaction handles
pub mod interaction;
/// Locator abstraction
pub mod locator;
/// Type metadata registry
pub mod metadata;
/// In-memory DOM backend
pub mod mock;
/// Diagram model element hierarchy
pub mod model;
/// Result and error types
pub mod result;
/// Structured selectors
pub mod selector;
/// Typed edge decorator
pub mod typed_edge;
/// Change-detection wait engine
pub mod wait;

/// CDP browser backend
#[cfg(feature = "browser")]
pub mod cdp;

pub use app::{AppOptions, DiagramApp};
pub use driver::{DomDriver, ElementState};
pub use element::{Locateable, PageElement};
pub use hosting::{DesktopHost, HostingContext, PageHost, WebviewHost};
pub use interaction::{CommandPalette, ContextMenu, LabelEditor, PaletteItem, Popup, ToolPalette};
pub use locator::{BoundingBox, LocateContext, Locator, Point};
pub use metadata::{BaseKind, ElementMetadata, Metadata};
pub use mock::{MockDom, MockElement};
pub use model::{
    AttributeSnapshot, ChildDepth, DiagramElement, Edge, EdgeDirection, EdgeSearch, Graph,
    ModelElement, Node, RoutingPoint, RoutingPointKind, VolatileRoutingPoint,
};
pub use result::{TrazarError, TrazarResult};
pub use selector::Selector;
pub use typed_edge::{TypedEdge, UnhintedEndpoint};
pub use wait::WaitOptions;

#[cfg(feature = "browser")]
pub use cdp::{Browser, BrowserConfig, CdpDriver};
