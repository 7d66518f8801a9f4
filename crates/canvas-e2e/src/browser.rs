//! Browser control for end-to-end runs.
//!
//! With the `browser` feature, [`Browser`] launches Chromium over the Chrome
//! `DevTools` Protocol (chromiumoxide) and hands out [`ChromiumPage`]s, which
//! implement [`PageDriver`](crate::PageDriver). Without the feature only the
//! configuration is available and helpers run against
//! [`MockDriver`](crate::MockDriver).

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

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

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::BrowserConfig;
    use crate::config::E2eConfig;
    use crate::driver::{eval_on_selector, BoundingBox, PageDriver, Point, PointerOptions};
    use crate::keyboard::{KeyChord, KeyDefinition, Modifier, Platform};
    use crate::locator::Selector;
    use crate::result::{E2eError, E2eResult};
    use crate::wait::WaitOptions;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde_json::Value;
    use std::fmt::Display;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const BOUNDING_BOX: &str = "el => { \
        el.scrollIntoView({ block: 'center', inline: 'center' }); \
        const r = el.getBoundingClientRect(); \
        return { x: r.x, y: r.y, width: r.width, height: r.height }; }";

    const FOCUS: &str = "el => { el.focus(); return null; }";

    fn input_error(e: impl Display) -> E2eError {
        E2eError::InputError {
            message: e.to_string(),
        }
    }

    fn page_error(e: impl Display) -> E2eError {
        E2eError::PageError {
            message: e.to_string(),
        }
    }

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        wait: WaitOptions,
        platform: Platform,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance with default waits
        pub async fn launch(config: BrowserConfig) -> E2eResult<Self> {
            Self::launch_with(config, WaitOptions::default(), Platform::current()).await
        }

        /// Launch the browser described by a run configuration
        pub async fn launch_from(config: &E2eConfig) -> E2eResult<Self> {
            Self::launch_with(config.browser.clone(), config.wait, config.platform()).await
        }

        async fn launch_with(
            config: BrowserConfig,
            wait: WaitOptions,
            platform: Platform,
        ) -> E2eResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| E2eError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                E2eError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                wait,
                platform,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a blank page
        pub async fn new_page(&self) -> E2eResult<ChromiumPage> {
            let browser = self.inner.lock().await;
            let page = browser.new_page("about:blank").await.map_err(page_error)?;

            if let Some(ref ua) = self.config.user_agent {
                page.execute(SetUserAgentOverrideParams::new(ua.clone()))
                    .await
                    .map_err(page_error)?;
            }

            Ok(ChromiumPage {
                inner: page,
                wait: self.wait,
                platform: self.platform,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> E2eResult<()> {
            {
                let mut browser = self.inner.lock().await;
                browser
                    .close()
                    .await
                    .map_err(|e| E2eError::BrowserLaunchError {
                        message: e.to_string(),
                    })?;
            }
            self.handle.abort();
            tracing::info!("browser closed");
            Ok(())
        }
    }

    /// A browser tab driven over CDP
    #[derive(Debug, Clone)]
    pub struct ChromiumPage {
        inner: CdpPage,
        wait: WaitOptions,
        platform: Platform,
    }

    impl ChromiumPage {
        /// Underlying chromiumoxide page, for anything the driver does not cover
        #[must_use]
        pub const fn cdp(&self) -> &CdpPage {
            &self.inner
        }

        async fn pointer_target(
            &self,
            selector: &Selector,
            options: &PointerOptions,
        ) -> E2eResult<Point> {
            if !options.force {
                self.wait_for_selector(selector, self.wait.timeout()).await?;
            }
            let value = eval_on_selector(self, selector, BOUNDING_BOX, &Value::Null).await?;
            let bounds: BoundingBox = serde_json::from_value(value)?;
            Ok(bounds.target(options.position))
        }

        async fn dispatch_mouse(
            &self,
            kind: DispatchMouseEventType,
            point: Point,
            pressed: bool,
        ) -> E2eResult<()> {
            let mut builder = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(point.x)
                .y(point.y);
            if pressed {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder.build().map_err(input_error)?;
            self.inner.execute(params).await.map_err(input_error)?;
            Ok(())
        }

        async fn dispatch_key(
            &self,
            kind: DispatchKeyEventType,
            key: &KeyDefinition,
            modifiers: i64,
            text: Option<&str>,
        ) -> E2eResult<()> {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key.key.clone())
                .code(key.code.clone())
                .windows_virtual_key_code(key.key_code)
                .native_virtual_key_code(key.key_code)
                .modifiers(modifiers);
            if let Some(text) = text {
                builder = builder.text(text).unmodified_text(text);
            }
            let params = builder.build().map_err(input_error)?;
            self.inner.execute(params).await.map_err(input_error)?;
            Ok(())
        }

        async fn type_char(&self, c: char) -> E2eResult<()> {
            let key = KeyDefinition::for_char(c);
            self.dispatch_key(DispatchKeyEventType::KeyDown, &key, 0, key.text.as_deref())
                .await?;
            self.dispatch_key(DispatchKeyEventType::KeyUp, &key, 0, None)
                .await
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumPage {
        async fn navigate(&self, url: &str) -> E2eResult<()> {
            tracing::debug!(url, "navigate");
            self.inner
                .goto(url)
                .await
                .map_err(|e| E2eError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> E2eResult<String> {
            Ok(self.inner.url().await.map_err(page_error)?.unwrap_or_default())
        }

        async fn click(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()> {
            tracing::debug!(%selector, "click");
            let point = self.pointer_target(selector, options).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, point, false)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, point, true)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, point, true)
                .await
        }

        async fn hover(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()> {
            tracing::debug!(%selector, "hover");
            let point = self.pointer_target(selector, options).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, point, false)
                .await
        }

        async fn focus(&self, selector: &Selector) -> E2eResult<()> {
            self.wait_for_selector(selector, self.wait.timeout()).await?;
            eval_on_selector(self, selector, FOCUS, &Value::Null).await?;
            Ok(())
        }

        async fn type_text(&self, selector: &Selector, text: &str) -> E2eResult<()> {
            tracing::debug!(%selector, text, "type");
            self.focus(selector).await?;
            for c in text.chars() {
                self.type_char(c).await?;
            }
            Ok(())
        }

        async fn press_key(&self, key: &str) -> E2eResult<()> {
            let chord = KeyChord::parse(key)?;
            let target = KeyDefinition::lookup(&chord.key)?;

            let mut flags = 0;
            for modifier in &chord.modifiers {
                flags |= modifier.flag();
                let held = KeyDefinition::lookup(modifier.key_name())?;
                self.dispatch_key(DispatchKeyEventType::RawKeyDown, &held, flags, None)
                    .await?;
            }

            let shifted = chord.modifiers.contains(&Modifier::Shift);
            let text = if chord.is_shortcut() {
                None
            } else if shifted {
                target.text.as_deref().map(str::to_uppercase)
            } else {
                target.text.clone()
            };
            let down = if text.is_some() {
                DispatchKeyEventType::KeyDown
            } else {
                DispatchKeyEventType::RawKeyDown
            };
            self.dispatch_key(down, &target, flags, text.as_deref())
                .await?;
            self.dispatch_key(DispatchKeyEventType::KeyUp, &target, flags, None)
                .await?;

            for modifier in chord.modifiers.iter().rev() {
                flags &= !modifier.flag();
                let held = KeyDefinition::lookup(modifier.key_name())?;
                self.dispatch_key(DispatchKeyEventType::KeyUp, &held, flags, None)
                    .await?;
            }
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> E2eResult<Value> {
            let result =
                self.inner
                    .evaluate(expression)
                    .await
                    .map_err(|e| E2eError::EvaluationError {
                        message: e.to_string(),
                    })?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        async fn close(&self) -> E2eResult<()> {
            self.inner.clone().close().await.map_err(page_error)
        }

        fn wait_options(&self) -> WaitOptions {
            self.wait
        }

        fn platform(&self) -> Platform {
            self.platform
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumPage};
