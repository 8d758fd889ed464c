//! Hosting-context adapters.
//!
//! The diagram client may be embedded in a bare browser page, an
//! IDE-embedded webview frame, or a desktop-shell window. Each integration
//! supplies a root selector-prefixing function and a readiness signal; the
//! core stays hosting-agnostic. Lifecycle hooks run once per test, in
//! fixed order: `before_launch`, `launch`, `after_launch`, `close`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use uuid::Uuid;

use crate::dom;
use crate::driver::DomDriver;
use crate::locator::DEFAULT_POLL_INTERVAL_MS;
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Default timeout for the metadata-API readiness wait (10 seconds)
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

/// Contract each hosting integration must satisfy.
#[async_trait]
pub trait HostingContext: Send + Sync + std::fmt::Debug {
    /// Hosting context name, used in error messages
    fn name(&self) -> &'static str;

    /// Translate a logical selector into one valid for this hosting
    /// context (plain page vs. nested iframe vs. desktop window frame)
    fn prefix_root_selector(&self, selector: Selector) -> Selector;

    /// Whether this context can provide a native context menu
    fn supports_context_menu(&self) -> bool;

    /// Hook run before the context is launched
    async fn before_launch(&self) -> TrazarResult<()> {
        Ok(())
    }

    /// Hook that launches the context
    async fn launch(&self, driver: &dyn DomDriver) -> TrazarResult<()> {
        let _ = driver;
        Ok(())
    }

    /// Hook run after launch. By default waits until the client's metadata
    /// API marker is attached to the document; no diagram query is valid
    /// before that.
    async fn after_launch(&self, driver: &dyn DomDriver) -> TrazarResult<()> {
        wait_for_api_marker(self, driver, Duration::from_millis(DEFAULT_READY_TIMEOUT_MS)).await
    }

    /// Hook run when the application is closed
    async fn close(&self) -> TrazarResult<()> {
        Ok(())
    }
}

/// Poll until the metadata-API marker attribute is attached to the
/// document of the given hosting context.
pub async fn wait_for_api_marker<H>(
    host: &H,
    driver: &dyn DomDriver,
    timeout: Duration,
) -> TrazarResult<()>
where
    H: HostingContext + ?Sized,
{
    let marker = host.prefix_root_selector(
        Selector::tag("body").and(Selector::attr_present(dom::API_MARKER_ATTRIBUTE)),
    );
    let start = Instant::now();
    loop {
        if driver.count(&marker).await? > 0 {
            tracing::trace!(host = host.name(), "metadata API marker attached");
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(TrazarError::Timeout {
                waiting_for: "metadata API marker to be attached".to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
    }
}

/// Plain browser page hosting
#[derive(Debug, Default)]
pub struct PageHost;

impl PageHost {
    /// Create a plain-page hosting context
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostingContext for PageHost {
    fn name(&self) -> &'static str {
        "page"
    }

    fn prefix_root_selector(&self, selector: Selector) -> Selector {
        selector
    }

    fn supports_context_menu(&self) -> bool {
        true
    }
}

/// IDE-embedded webview hosting: the diagram lives inside an iframe.
///
/// Context menus are owned by the surrounding IDE shell and are not
/// reachable from the frame, so `supports_context_menu` is `false`.
#[derive(Debug)]
pub struct WebviewHost {
    frame_css: String,
}

impl WebviewHost {
    /// Create a webview hosting context for the given frame selector
    #[must_use]
    pub fn new(frame_css: impl Into<String>) -> Self {
        Self {
            frame_css: frame_css.into(),
        }
    }
}

#[async_trait]
impl HostingContext for WebviewHost {
    fn name(&self) -> &'static str {
        "webview"
    }

    fn prefix_root_selector(&self, selector: Selector) -> Selector {
        Selector::in_frame(Selector::css(self.frame_css.clone()), selector)
    }

    fn supports_context_menu(&self) -> bool {
        false
    }
}

/// Sidecar recording a downloaded application executable for reuse across
/// a test run
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExecutableCache {
    executable: PathBuf,
}

/// Desktop-shell window hosting.
///
/// Owns a run-scoped temp directory (created at `before_launch`, removed
/// at `close`) and optionally a JSON sidecar caching the path of a
/// downloaded application executable.
#[derive(Debug)]
pub struct DesktopHost {
    shell_css: String,
    session: Uuid,
    workdir: Mutex<Option<TempDir>>,
    cache_path: Option<PathBuf>,
}

impl DesktopHost {
    /// Create a desktop hosting context for the given shell-frame selector
    #[must_use]
    pub fn new(shell_css: impl Into<String>) -> Self {
        Self {
            shell_css: shell_css.into(),
            session: Uuid::new_v4(),
            workdir: Mutex::new(None),
            cache_path: None,
        }
    }

    /// Enable the executable-path sidecar at the given location
    #[must_use]
    pub fn with_executable_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Path of the run-scoped workdir, while the context is launched
    #[must_use]
    pub fn workdir_path(&self) -> Option<PathBuf> {
        self.workdir
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
    }

    /// Read the cached executable path, if a sidecar exists
    pub fn cached_executable(&self) -> TrazarResult<Option<PathBuf>> {
        let Some(path) = &self.cache_path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let cache: ExecutableCache = serde_json::from_str(&raw)?;
        Ok(Some(cache.executable))
    }

    /// Record an executable path in the sidecar for reuse across the run
    pub fn remember_executable(&self, executable: &Path) -> TrazarResult<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        let cache = ExecutableCache {
            executable: executable.to_path_buf(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&cache)?)?;
        Ok(())
    }
}

#[async_trait]
impl HostingContext for DesktopHost {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn prefix_root_selector(&self, selector: Selector) -> Selector {
        Selector::descendant(Selector::css(self.shell_css.clone()), selector)
    }

    fn supports_context_menu(&self) -> bool {
        true
    }

    async fn before_launch(&self) -> TrazarResult<()> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("trazar-{}-", self.session))
            .tempdir()?;
        tracing::debug!(path = %dir.path().display(), "created desktop workdir");
        *self.workdir.lock().unwrap_or_else(|e| e.into_inner()) = Some(dir);
        Ok(())
    }

    async fn launch(&self, _driver: &dyn DomDriver) -> TrazarResult<()> {
        if let Some(executable) = self.cached_executable()? {
            tracing::debug!(path = %executable.display(), "reusing cached executable");
        }
        Ok(())
    }

    async fn close(&self) -> TrazarResult<()> {
        let dir = self.workdir.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(dir) = dir {
            tracing::debug!(path = %dir.path().display(), "removing desktop workdir");
            dir.close()?;
        }
        Ok(())
    }
}
