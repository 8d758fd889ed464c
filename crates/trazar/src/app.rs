//! Application root object.
//!
//! A [`DiagramApp`] ties together the automation driver and the hosting
//! context, runs the hosting lifecycle in its fixed order, and hands out
//! the graph and the interaction handles. It is cheap to clone; every
//! locator holds one.

use std::sync::Arc;

use crate::driver::DomDriver;
use crate::hosting::HostingContext;
use crate::interaction::{CommandPalette, ContextMenu, LabelEditor, Popup, ToolPalette};
use crate::locator::Locator;
use crate::model::Graph;
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;
use crate::dom;

/// Options for starting an application
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Selector of the diagram canvas inside the hosting context
    pub graph_selector: Selector,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            graph_selector: Selector::css(dom::DEFAULT_GRAPH_SELECTOR),
        }
    }
}

impl AppOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the diagram canvas selector
    #[must_use]
    pub fn with_graph_selector(mut self, selector: impl Into<Selector>) -> Self {
        self.graph_selector = selector.into();
        self
    }
}

#[derive(Debug)]
struct AppInner {
    driver: Arc<dyn DomDriver>,
    hosting: Arc<dyn HostingContext>,
    options: AppOptions,
}

/// Handle to a running diagram application under test
#[derive(Debug, Clone)]
pub struct DiagramApp {
    inner: Arc<AppInner>,
}

impl DiagramApp {
    /// Launch the hosting context and connect to the application.
    ///
    /// Runs the hosting lifecycle hooks in fixed order: `before_launch`,
    /// `launch`, `after_launch` (which by default waits for the client's
    /// metadata API marker).
    pub async fn start(
        driver: Arc<dyn DomDriver>,
        hosting: Arc<dyn HostingContext>,
        options: AppOptions,
    ) -> TrazarResult<Self> {
        tracing::debug!(host = hosting.name(), "starting hosting context");
        hosting.before_launch().await?;
        hosting.launch(driver.as_ref()).await?;
        hosting.after_launch(driver.as_ref()).await?;
        tracing::debug!(host = hosting.name(), "hosting context ready");
        Ok(Self {
            inner: Arc::new(AppInner {
                driver,
                hosting,
                options,
            }),
        })
    }

    /// Close the hosting context
    pub async fn close(&self) -> TrazarResult<()> {
        self.inner.hosting.close().await
    }

    /// The automation driver
    #[must_use]
    pub fn driver(&self) -> &dyn DomDriver {
        self.inner.driver.as_ref()
    }

    /// The active hosting context
    #[must_use]
    pub fn hosting(&self) -> &dyn HostingContext {
        self.inner.hosting.as_ref()
    }

    /// Translate a logical selector into one valid for the current hosting
    /// context
    #[must_use]
    pub fn prefix_root_selector(&self, selector: Selector) -> Selector {
        self.inner.hosting.prefix_root_selector(selector)
    }

    /// Locator of the diagram canvas
    #[must_use]
    pub fn root_locator(&self) -> Locator {
        Locator::new(self.clone(), self.inner.options.graph_selector.clone())
    }

    /// The semantic graph query surface
    #[must_use]
    pub fn graph(&self) -> Graph {
        Graph::new(self.root_locator())
    }

    /// The tool palette handle
    #[must_use]
    pub fn tool_palette(&self) -> ToolPalette {
        ToolPalette::new(self.clone())
    }

    /// The label editor handle
    #[must_use]
    pub fn label_editor(&self) -> LabelEditor {
        LabelEditor::new(self.clone())
    }

    /// The hover popup handle
    #[must_use]
    pub fn popup(&self) -> Popup {
        Popup::new(self.clone())
    }

    /// The global command palette handle
    #[must_use]
    pub fn command_palette(&self) -> CommandPalette {
        CommandPalette::new(self.clone())
    }

    /// The context menu handle.
    ///
    /// Fails with a descriptive error when the active hosting context
    /// cannot provide one, rather than silently no-op'ing.
    pub fn context_menu(&self) -> TrazarResult<ContextMenu> {
        if !self.inner.hosting.supports_context_menu() {
            return Err(TrazarError::UnsupportedCapability {
                capability: "context-menu",
                host: self.inner.hosting.name().to_string(),
            });
        }
        Ok(ContextMenu::new(self.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hosting::WebviewHost;
    use crate::mock::MockDom;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingHost {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl HostingContext for RecordingHost {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn prefix_root_selector(&self, selector: Selector) -> Selector {
            selector
        }

        fn supports_context_menu(&self) -> bool {
            false
        }

        async fn before_launch(&self) -> TrazarResult<()> {
            self.calls.lock().unwrap().push("before_launch");
            Ok(())
        }

        async fn launch(&self, _driver: &dyn DomDriver) -> TrazarResult<()> {
            self.calls.lock().unwrap().push("launch");
            Ok(())
        }

        async fn after_launch(&self, _driver: &dyn DomDriver) -> TrazarResult<()> {
            self.calls.lock().unwrap().push("after_launch");
            Ok(())
        }

        async fn close(&self) -> TrazarResult<()> {
            self.calls.lock().unwrap().push("close");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lifecycle_runs_in_fixed_order() {
        let dom = MockDom::new();
        let host = Arc::new(RecordingHost::default());
        let app = DiagramApp::start(
            Arc::new(dom),
            host.clone(),
            AppOptions::default(),
        )
        .await
        .unwrap();
        app.close().await.unwrap();

        assert_eq!(
            *host.calls.lock().unwrap(),
            vec!["before_launch", "launch", "after_launch", "close"]
        );
    }

    #[tokio::test]
    async fn test_context_menu_unsupported_host_errors() {
        use crate::mock::MockElement;

        let dom = MockDom::new();
        dom.insert(None, MockElement::new("iframe").id("wv").class("webview"));
        dom.insert(
            Some("wv"),
            MockElement::new("body").attr(crate::dom::API_MARKER_ATTRIBUTE, "true"),
        );
        let app = DiagramApp::start(
            Arc::new(dom),
            Arc::new(WebviewHost::new("iframe.webview")),
            AppOptions::default(),
        )
        .await
        .unwrap();

        let err = app.context_menu().unwrap_err();
        assert!(matches!(
            err,
            TrazarError::UnsupportedCapability {
                capability: "context-menu",
                ..
            }
        ));
        assert!(err.to_string().contains("webview"));
    }
}
