//! Locator abstraction for scoped element references.
//!
//! A locator is a node in a tree mirroring DOM scoping: it pairs a
//! [`Selector`] with the owning application handle and an optional parent.
//! Locators are never mutated in place; `child`, `direct_child` and
//! `override_query` all return new instances, and the parent chain is fixed
//! at creation, so `root()` always terminates.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::DiagramApp;
use crate::driver::ElementState;
use crate::result::TrazarResult;
use crate::selector::Selector;

/// Default timeout for element-state waits (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for waits (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Scoping context for [`Locator::locate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateContext {
    /// The locator's own scope (full parent chain)
    SelfScope,
    /// The top of the parent chain
    Root,
}

/// How a locator attaches to its parent scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attachment {
    Descendant,
    DirectChild,
}

/// A composable, scoped reference to zero-or-more elements in the remote
/// document.
///
/// Holds no DOM identity: every operation re-resolves the full selector
/// chain against the live page.
#[derive(Debug, Clone)]
pub struct Locator {
    app: DiagramApp,
    query: Selector,
    parent: Option<Arc<Locator>>,
    attachment: Attachment,
}

impl Locator {
    /// Create a root-level locator
    #[must_use]
    pub fn new(app: DiagramApp, query: impl Into<Selector>) -> Self {
        Self {
            app,
            query: query.into(),
            parent: None,
            attachment: Attachment::Descendant,
        }
    }

    /// The owning application handle
    #[must_use]
    pub fn app(&self) -> &DiagramApp {
        &self.app
    }

    /// The locator's own (unscoped) query
    #[must_use]
    pub fn query(&self) -> &Selector {
        &self.query
    }

    /// Create a locator scoped as a descendant of this one
    #[must_use]
    pub fn child(&self, query: impl Into<Selector>) -> Self {
        Self {
            app: self.app.clone(),
            query: query.into(),
            parent: Some(Arc::new(self.clone())),
            attachment: Attachment::Descendant,
        }
    }

    /// Create a locator scoped as a direct child of this one
    #[must_use]
    pub fn direct_child(&self, query: impl Into<Selector>) -> Self {
        Self {
            app: self.app.clone(),
            query: query.into(),
            parent: Some(Arc::new(self.clone())),
            attachment: Attachment::DirectChild,
        }
    }

    /// Create a locator with the same parent but a replaced query.
    ///
    /// Used when a concrete DOM id has been discovered and should replace a
    /// broader selector for stability.
    #[must_use]
    pub fn override_query(&self, query: impl Into<Selector>) -> Self {
        Self {
            app: self.app.clone(),
            query: query.into(),
            parent: self.parent.clone(),
            attachment: self.attachment,
        }
    }

    /// Walk to the top of the parent chain.
    ///
    /// O(depth); terminates for any locator because parents are fixed at
    /// creation and cannot point back to a descendant.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Some(parent) = &current.parent {
            current = parent;
        }
        current
    }

    /// The scoping query for the given context, valid for the current
    /// hosting context.
    #[must_use]
    pub fn locate(&self, context: LocateContext) -> Selector {
        match context {
            LocateContext::SelfScope => self.resolve(),
            LocateContext::Root => self.root().resolve(),
        }
    }

    /// The full selector chain, prefixed for the current hosting context
    #[must_use]
    pub fn resolve(&self) -> Selector {
        self.app.prefix_root_selector(self.chain_query())
    }

    fn chain_query(&self) -> Selector {
        match &self.parent {
            None => self.query.clone(),
            Some(parent) => match self.attachment {
                Attachment::Descendant => {
                    Selector::descendant(parent.chain_query(), self.query.clone())
                }
                Attachment::DirectChild => {
                    Selector::direct_child(parent.chain_query(), self.query.clone())
                }
            },
        }
    }

    // ------------------------------------------------------------------
    // Driver delegates
    // ------------------------------------------------------------------

    /// Number of matching elements
    pub async fn count(&self) -> TrazarResult<usize> {
        self.app.driver().count(&self.resolve()).await
    }

    /// The `id` attribute of every match
    pub async fn ids(&self) -> TrazarResult<Vec<Option<String>>> {
        self.app.driver().ids(&self.resolve()).await
    }

    /// Attribute of the single matching element
    pub async fn attribute(&self, name: &str) -> TrazarResult<Option<String>> {
        self.app.driver().attribute(&self.resolve(), name).await
    }

    /// The given attribute of every match
    pub async fn attributes(&self, name: &str) -> TrazarResult<Vec<Option<String>>> {
        self.app.driver().attribute_all(&self.resolve(), name).await
    }

    /// Text content of the single matching element
    pub async fn text_content(&self) -> TrazarResult<String> {
        self.app.driver().text_content(&self.resolve()).await
    }

    /// Text content of every match
    pub async fn texts(&self) -> TrazarResult<Vec<String>> {
        self.app.driver().texts(&self.resolve()).await
    }

    /// Whether the single matching element is rendered
    pub async fn is_visible(&self) -> TrazarResult<bool> {
        self.app.driver().is_visible(&self.resolve()).await
    }

    /// Bounding box of the single matching element
    pub async fn bounding_box(&self) -> TrazarResult<BoundingBox> {
        self.app.driver().bounding_box(&self.resolve()).await
    }

    /// Click the single matching element
    pub async fn click(&self) -> TrazarResult<()> {
        self.app.driver().click(&self.resolve()).await
    }

    /// Double-click the single matching element
    pub async fn double_click(&self) -> TrazarResult<()> {
        self.app.driver().double_click(&self.resolve()).await
    }

    /// Right-click the single matching element
    pub async fn context_click(&self) -> TrazarResult<()> {
        self.app.driver().context_click(&self.resolve()).await
    }

    /// Hover the single matching element
    pub async fn hover(&self) -> TrazarResult<()> {
        self.app.driver().hover(&self.resolve()).await
    }

    /// Drag the single matching element to a point
    pub async fn drag_to(&self, target: Point) -> TrazarResult<()> {
        self.app.driver().drag(&self.resolve(), target).await
    }

    /// Type text into the single matching element
    pub async fn type_text(&self, text: &str) -> TrazarResult<()> {
        self.app.driver().type_text(&self.resolve(), text).await
    }

    /// Wait until the match reaches the given state
    pub async fn wait_for_state(
        &self,
        state: ElementState,
        timeout: Duration,
    ) -> TrazarResult<()> {
        self.app
            .driver()
            .wait_for_state(&self.resolve(), state, timeout)
            .await
    }
}
