//! CDP browser backend (requires the `browser` feature and a chromium).
//!
//! Implements [`DomDriver`] over chromiumoxide. Reads are executed as
//! JavaScript rendered from the structured selector; input goes through
//! the CDP Input domain so the page receives trusted events.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::driver::{DomDriver, ElementState};
use crate::locator::{BoundingBox, Point, DEFAULT_POLL_INTERVAL_MS};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

fn driver_err(error: impl std::fmt::Display) -> TrazarError {
    TrazarError::Driver {
        message: error.to_string(),
    }
}

/// Browser instance with a live CDP connection
#[derive(Debug)]
pub struct Browser {
    inner: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a browser
    pub async fn launch(config: BrowserConfig) -> TrazarResult<Self> {
        let mut builder = CdpConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|message| TrazarError::Launch {
            message,
        })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| TrazarError::Launch {
                message: e.to_string(),
            })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a page on the given URL and wrap it as a driver
    pub async fn new_driver(&self, url: &str) -> TrazarResult<CdpDriver> {
        let browser = self.inner.lock().await;
        let page = browser.new_page(url).await.map_err(driver_err)?;
        Ok(CdpDriver {
            page: Arc::new(Mutex::new(page)),
        })
    }

    /// Close the browser
    pub async fn close(self) -> TrazarResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(driver_err)?;
        Ok(())
    }
}

/// [`DomDriver`] implementation over one CDP page
#[derive(Debug, Clone)]
pub struct CdpDriver {
    page: Arc<Mutex<CdpPage>>,
}

impl CdpDriver {
    /// Navigate the page
    pub async fn goto(&self, url: &str) -> TrazarResult<()> {
        let page = self.page.lock().await;
        page.goto(url).await.map_err(driver_err)?;
        Ok(())
    }

    /// Take a PNG screenshot of the page
    pub async fn screenshot(&self) -> TrazarResult<Vec<u8>> {
        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = page.execute(params).await.map_err(driver_err)?;
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(driver_err)
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> TrazarResult<T> {
        let page = self.page.lock().await;
        let result = page.evaluate(js).await.map_err(driver_err)?;
        result.into_value().map_err(driver_err)
    }

    /// JavaScript expression evaluating to the array of matched elements
    fn elements_js(selector: &Selector) -> TrazarResult<String> {
        let flat = selector.flatten().ok_or_else(|| TrazarError::Driver {
            message: format!(
                "selector not expressible for the CDP backend: {}",
                selector.summary()
            ),
        })?;
        let doc = match flat.frame_css {
            Some(frame) => format!("document.querySelector({frame:?}).contentDocument"),
            None => "document".to_string(),
        };
        let mut js = format!("Array.from({doc}.querySelectorAll({:?}))", flat.css);
        for text in &flat.text_filters {
            js.push_str(&format!(
                ".filter(el => el.textContent.includes({text:?}))"
            ));
        }
        Ok(js)
    }

    async fn require_single(&self, selector: &Selector) -> TrazarResult<String> {
        let js = Self::elements_js(selector)?;
        let found: usize = self.eval(format!("{js}.length")).await?;
        if found != 1 {
            return Err(TrazarError::Cardinality {
                expected: "exactly one",
                found,
                criteria: selector.summary(),
            });
        }
        Ok(js)
    }

    async fn center_of(&self, selector: &Selector) -> TrazarResult<Point> {
        Ok(self.bounding_box(selector).await?.center())
    }

    async fn mouse_event(
        &self,
        kind: DispatchMouseEventType,
        point: Point,
        button: MouseButton,
        click_count: i64,
    ) -> TrazarResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(f64::from(point.x))
            .y(f64::from(point.y))
            .button(button)
            .click_count(click_count)
            .build()
            .map_err(driver_err)?;
        let page = self.page.lock().await;
        page.execute(params).await.map_err(driver_err)?;
        Ok(())
    }

    async fn click_with(
        &self,
        point: Point,
        button: MouseButton,
        click_count: i64,
    ) -> TrazarResult<()> {
        self.mouse_event(DispatchMouseEventType::MouseMoved, point, button, 0)
            .await?;
        self.mouse_event(DispatchMouseEventType::MousePressed, point, button, click_count)
            .await?;
        self.mouse_event(
            DispatchMouseEventType::MouseReleased,
            point,
            button,
            click_count,
        )
        .await
    }

    async fn key_event(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
        modifiers: i64,
    ) -> TrazarResult<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .modifiers(modifiers)
            .build()
            .map_err(driver_err)?;
        let page = self.page.lock().await;
        page.execute(params).await.map_err(driver_err)?;
        Ok(())
    }
}

/// CDP modifier bitmask for a `+`-joined key chord
fn parse_chord(chord: &str) -> (i64, String) {
    let mut modifiers = 0;
    let mut key = chord.to_string();
    let parts: Vec<&str> = chord.split('+').collect();
    if parts.len() > 1 {
        key = (*parts.last().unwrap_or(&chord)).to_string();
        for part in &parts[..parts.len() - 1] {
            modifiers |= match *part {
                "Alt" => 1,
                "Control" => 2,
                "Meta" => 4,
                "Shift" => 8,
                _ => 0,
            };
        }
    }
    (modifiers, key)
}

#[async_trait]
impl DomDriver for CdpDriver {
    async fn count(&self, selector: &Selector) -> TrazarResult<usize> {
        let js = Self::elements_js(selector)?;
        self.eval(format!("{js}.length")).await
    }

    async fn ids(&self, selector: &Selector) -> TrazarResult<Vec<Option<String>>> {
        let js = Self::elements_js(selector)?;
        self.eval(format!("{js}.map(el => el.getAttribute('id'))"))
            .await
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> TrazarResult<Option<String>> {
        let js = self.require_single(selector).await?;
        self.eval(format!("{js}[0].getAttribute({name:?})")).await
    }

    async fn attribute_all(
        &self,
        selector: &Selector,
        name: &str,
    ) -> TrazarResult<Vec<Option<String>>> {
        let js = Self::elements_js(selector)?;
        self.eval(format!("{js}.map(el => el.getAttribute({name:?}))"))
            .await
    }

    async fn text_content(&self, selector: &Selector) -> TrazarResult<String> {
        let js = self.require_single(selector).await?;
        self.eval(format!("{js}[0].textContent")).await
    }

    async fn texts(&self, selector: &Selector) -> TrazarResult<Vec<String>> {
        let js = Self::elements_js(selector)?;
        self.eval(format!("{js}.map(el => el.textContent)")).await
    }

    async fn is_visible(&self, selector: &Selector) -> TrazarResult<bool> {
        let js = Self::elements_js(selector)?;
        let found: usize = self.eval(format!("{js}.length")).await?;
        match found {
            0 => Ok(false),
            1 => {
                self.eval(format!(
                    "(() => {{ const el = {js}[0]; \
                     return !!(el.offsetParent || el.getClientRects().length); }})()"
                ))
                .await
            }
            n => Err(TrazarError::Cardinality {
                expected: "exactly one",
                found: n,
                criteria: selector.summary(),
            }),
        }
    }

    async fn bounding_box(&self, selector: &Selector) -> TrazarResult<BoundingBox> {
        let js = self.require_single(selector).await?;
        self.eval(format!(
            "(() => {{ const r = {js}[0].getBoundingClientRect(); \
             return {{ x: r.x, y: r.y, width: r.width, height: r.height }}; }})()"
        ))
        .await
    }

    async fn click(&self, selector: &Selector) -> TrazarResult<()> {
        let center = self.center_of(selector).await?;
        self.click_with(center, MouseButton::Left, 1).await
    }

    async fn double_click(&self, selector: &Selector) -> TrazarResult<()> {
        let center = self.center_of(selector).await?;
        self.click_with(center, MouseButton::Left, 2).await
    }

    async fn context_click(&self, selector: &Selector) -> TrazarResult<()> {
        let center = self.center_of(selector).await?;
        self.click_with(center, MouseButton::Right, 1).await
    }

    async fn hover(&self, selector: &Selector) -> TrazarResult<()> {
        let center = self.center_of(selector).await?;
        self.mouse_event(DispatchMouseEventType::MouseMoved, center, MouseButton::None, 0)
            .await
    }

    async fn drag(&self, selector: &Selector, target: Point) -> TrazarResult<()> {
        let from = self.center_of(selector).await?;
        self.mouse_event(DispatchMouseEventType::MouseMoved, from, MouseButton::None, 0)
            .await?;
        self.mouse_event(DispatchMouseEventType::MousePressed, from, MouseButton::Left, 1)
            .await?;
        let steps = 10;
        for step in 1..=steps {
            let progress = step as f32 / steps as f32;
            let point = Point::new(
                from.x + (target.x - from.x) * progress,
                from.y + (target.y - from.y) * progress,
            );
            self.mouse_event(
                DispatchMouseEventType::MouseMoved,
                point,
                MouseButton::Left,
                0,
            )
            .await?;
        }
        self.mouse_event(
            DispatchMouseEventType::MouseReleased,
            target,
            MouseButton::Left,
            1,
        )
        .await
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> TrazarResult<()> {
        let js = self.require_single(selector).await?;
        let _: Option<bool> = self
            .eval(format!(
                "(() => {{ const el = {js}[0]; el.focus(); el.value = {text:?}; \
                 el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 return true; }})()"
            ))
            .await?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> TrazarResult<()> {
        let (modifiers, key_name) = parse_chord(key);
        self.key_event(DispatchKeyEventType::KeyDown, &key_name, modifiers)
            .await?;
        self.key_event(DispatchKeyEventType::KeyUp, &key_name, modifiers)
            .await
    }

    async fn click_at(&self, point: Point) -> TrazarResult<()> {
        self.click_with(point, MouseButton::Left, 1).await
    }

    async fn wait_for_state(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout: Duration,
    ) -> TrazarResult<()> {
        let start = Instant::now();
        loop {
            let satisfied = match state {
                ElementState::Attached => self.count(selector).await? > 0,
                ElementState::Detached => self.count(selector).await? == 0,
                ElementState::Visible => self.is_visible(selector).await?,
                ElementState::Hidden => {
                    self.count(selector).await? == 0 || !self.is_visible(selector).await?
                }
            };
            if satisfied {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(TrazarError::Timeout {
                    waiting_for: format!("element {} to be {state}", selector.summary()),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_parsing() {
        assert_eq!(parse_chord("Delete"), (0, "Delete".to_string()));
        assert_eq!(parse_chord("Control+Space"), (2, "Space".to_string()));
        assert_eq!(
            parse_chord("Control+Shift+Z"),
            (10, "Z".to_string())
        );
    }

    #[test]
    fn test_elements_js_rendering() {
        let js = CdpDriver::elements_js(&Selector::css("g.node")).unwrap();
        assert!(js.contains("querySelectorAll(\"g.node\")"));

        let js = CdpDriver::elements_js(
            &Selector::has_class("node").with_text("Push"),
        )
        .unwrap();
        assert!(js.contains("textContent.includes(\"Push\")"));
    }
}
