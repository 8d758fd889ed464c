//! Automation driver contract.
//!
//! Trazar does not reimplement browser automation. Everything it needs from
//! the underlying primitive is captured by [`DomDriver`]: selector-scoped
//! reads, element state waits, and input simulation. Two backends ship with
//! the crate: the in-memory [`crate::mock::MockDom`] (always available) and
//! a CDP implementation behind the `browser` feature.

use std::time::Duration;

use async_trait::async_trait;

use crate::locator::{BoundingBox, Point};
use crate::result::TrazarResult;
use crate::selector::Selector;

/// Lifecycle states an element can be waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Present in the document
    Attached,
    /// Fully removed from the document
    Detached,
    /// Present and rendered
    Visible,
    /// Absent or not rendered
    Hidden,
}

impl ElementState {
    /// State name for error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The browser-automation primitive consumed by the framework.
///
/// Element-targeted actions are strict: they require the selector to
/// resolve to exactly one element and fail otherwise. Bulk reads
/// (`count`, `ids`, `texts`) accept any number of matches.
#[async_trait]
pub trait DomDriver: Send + Sync + std::fmt::Debug {
    /// Number of elements matching the selector
    async fn count(&self, selector: &Selector) -> TrazarResult<usize>;

    /// The `id` attribute of every match, in document order
    async fn ids(&self, selector: &Selector) -> TrazarResult<Vec<Option<String>>>;

    /// Attribute of the single matching element
    async fn attribute(&self, selector: &Selector, name: &str) -> TrazarResult<Option<String>>;

    /// The given attribute of every match, in document order
    async fn attribute_all(
        &self,
        selector: &Selector,
        name: &str,
    ) -> TrazarResult<Vec<Option<String>>>;

    /// Text content of the single matching element (including descendants)
    async fn text_content(&self, selector: &Selector) -> TrazarResult<String>;

    /// Text content of every match, in document order
    async fn texts(&self, selector: &Selector) -> TrazarResult<Vec<String>>;

    /// Whether the single matching element is rendered; `false` when the
    /// selector matches nothing
    async fn is_visible(&self, selector: &Selector) -> TrazarResult<bool>;

    /// Bounding box of the single matching element
    async fn bounding_box(&self, selector: &Selector) -> TrazarResult<BoundingBox>;

    /// Click the single matching element
    async fn click(&self, selector: &Selector) -> TrazarResult<()>;

    /// Double-click the single matching element
    async fn double_click(&self, selector: &Selector) -> TrazarResult<()>;

    /// Right-click the single matching element
    async fn context_click(&self, selector: &Selector) -> TrazarResult<()>;

    /// Hover the single matching element
    async fn hover(&self, selector: &Selector) -> TrazarResult<()>;

    /// Drag the single matching element to a point
    async fn drag(&self, selector: &Selector, target: Point) -> TrazarResult<()>;

    /// Type text into the single matching element
    async fn type_text(&self, selector: &Selector, text: &str) -> TrazarResult<()>;

    /// Press a key (optionally with `+`-joined modifiers, e.g.
    /// `Control+Space`) against the focused element
    async fn press_key(&self, key: &str) -> TrazarResult<()>;

    /// Click at an absolute point on the page
    async fn click_at(&self, point: Point) -> TrazarResult<()>;

    /// Wait until the selector's match reaches the given state
    async fn wait_for_state(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout: Duration,
    ) -> TrazarResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(ElementState::Attached.as_str(), "attached");
        assert_eq!(ElementState::Detached.as_str(), "detached");
        assert_eq!(ElementState::Visible.to_string(), "visible");
        assert_eq!(ElementState::Hidden.to_string(), "hidden");
    }
}
