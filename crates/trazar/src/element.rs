//! Element base capabilities, independent of diagram semantics.

use std::time::Duration;

use crate::app::DiagramApp;
use crate::driver::ElementState;
use crate::locator::{BoundingBox, Locator, DEFAULT_TIMEOUT_MS};
use crate::result::TrazarResult;

/// The common surface every page object builds on: access to its scoped
/// locator and, through it, the owning application.
pub trait Locateable: Send + Sync {
    /// The element's scoped locator
    fn locator(&self) -> &Locator;

    /// The owning application handle
    fn app(&self) -> &DiagramApp {
        self.locator().app()
    }
}

/// A generic page object wrapping a locator.
///
/// Interaction handles (palette, popup, editors) and diagram model elements
/// all build on this.
#[derive(Debug, Clone)]
pub struct PageElement {
    locator: Locator,
}

impl PageElement {
    /// Create a page element over a locator
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }

    /// Whether the element is rendered
    pub async fn is_visible(&self) -> TrazarResult<bool> {
        self.locator.is_visible().await
    }

    /// Wait until the element reaches the given state, with the default
    /// timeout
    pub async fn wait_for(&self, state: ElementState) -> TrazarResult<()> {
        self.locator
            .wait_for_state(state, Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .await
    }

    /// Wait until the element reaches the given state
    pub async fn wait_for_with_timeout(
        &self,
        state: ElementState,
        timeout: Duration,
    ) -> TrazarResult<()> {
        self.locator.wait_for_state(state, timeout).await
    }

    /// Bounding box of the element
    pub async fn bounding_box(&self) -> TrazarResult<BoundingBox> {
        self.locator.bounding_box().await
    }

    /// Text content of the element
    pub async fn text(&self) -> TrazarResult<String> {
        self.locator.text_content().await
    }
}

impl Locateable for PageElement {
    fn locator(&self) -> &Locator {
        &self.locator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{test_app, MockDom, MockElement};
    use crate::selector::Selector;

    #[tokio::test]
    async fn test_visibility_and_text() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("div").class("tool-palette").text("Palette"));
        let app = test_app(&dom).await;
        let element = PageElement::new(Locator::new(app, Selector::css("div.tool-palette")));
        assert!(element.is_visible().await.unwrap());
        assert_eq!(element.text().await.unwrap(), "Palette");
    }

    #[tokio::test]
    async fn test_hidden_element_is_not_visible() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("div").class("diagram-popup").class("hidden"));
        let app = test_app(&dom).await;
        let element = PageElement::new(Locator::new(app, Selector::css("div.diagram-popup")));
        assert!(!element.is_visible().await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_for_visible() {
        let dom = MockDom::new();
        dom.insert(None, MockElement::new("div").id("popup").class("diagram-popup").class("hidden"));
        let app = test_app(&dom).await;
        let element = PageElement::new(Locator::new(app, Selector::css("div.diagram-popup")));

        let background = dom.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            background.remove_class("popup", "hidden");
        });

        element.wait_for(ElementState::Visible).await.unwrap();
        assert!(element.is_visible().await.unwrap());
    }
}
