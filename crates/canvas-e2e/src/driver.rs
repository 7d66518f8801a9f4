//! PageDriver - the page-automation primitives every helper is built on.
//!
//! Helpers never talk to a browser directly. They take any `PageDriver`, so
//! scenarios run against the real Chromium backend (`browser` feature) and
//! unit tests run against [`MockDriver`], which records every call.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  helpers (navigation, handlers, expect, analysis, ...)       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  PageDriver (click, type, press, evaluate, wait, ...)        │
//! ├────────────────────────────┬─────────────────────────────────┤
//! │  ChromiumPage (CDP)        │  MockDriver (unit tests)        │
//! └────────────────────────────┴─────────────────────────────────┘
//! ```

use crate::keyboard::Platform;
use crate::locator::{js_literal, Selector};
use crate::result::{E2eError, E2eResult};
use crate::wait::{self, WaitOptions};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A point relative to an element's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X offset in CSS pixels
    pub x: f64,
    /// Y offset in CSS pixels
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Element bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Viewport point for a pointer action: the offset if given, else the center
    #[must_use]
    pub fn target(&self, offset: Option<Point>) -> Point {
        match offset {
            Some(p) => Point::new(self.x + p.x, self.y + p.y),
            None => Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0),
        }
    }
}

/// Options for click and hover
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerOptions {
    /// Offset from the element's top-left corner (default: center)
    pub position: Option<Point>,
    /// Skip waiting for the element to be actionable
    pub force: bool,
}

impl PointerOptions {
    /// Pointer options with an explicit position
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            position: Some(Point::new(x, y)),
            force: false,
        }
    }

    /// Skip actionability waits
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Abstract page-automation trait.
///
/// Every method acts on the page's current document. Selectors are resolved
/// inside the page with [`Selector::to_query`].
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Get current URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Click element
    async fn click(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()>;

    /// Move the mouse over an element
    async fn hover(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()>;

    /// Focus an element
    async fn focus(&self, selector: &Selector) -> E2eResult<()>;

    /// Focus an element and type text one key at a time
    async fn type_text(&self, selector: &Selector, text: &str) -> E2eResult<()>;

    /// Press a key or chord (`"Enter"`, `"Control+a"`) on the focused element
    async fn press_key(&self, key: &str) -> E2eResult<()>;

    /// Evaluate a JavaScript expression in page context; promises are awaited
    async fn evaluate(&self, expression: &str) -> E2eResult<Value>;

    /// Close the page
    async fn close(&self) -> E2eResult<()>;

    /// Wait for selector to match an element
    async fn wait_for_selector(&self, selector: &Selector, timeout: Duration) -> E2eResult<()> {
        let script = format!("({}) !== null", selector.to_query());
        let script = &script;
        let poll_interval = self.wait_options().poll_interval();
        wait::poll_until(timeout, poll_interval, selector.to_string(), move || async move {
            let found = self.evaluate(script).await?;
            Ok((found == Value::Bool(true)).then_some(()))
        })
        .await?;
        Ok(())
    }

    /// Sleep for a fixed duration (prefer conditions over this)
    async fn wait_for_timeout(&self, duration: Duration) -> E2eResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Timeouts used by waits and expectations on this page
    fn wait_options(&self) -> WaitOptions {
        WaitOptions::default()
    }

    /// Keyboard convention for shortcuts
    fn platform(&self) -> Platform {
        Platform::current()
    }
}

/// Evaluate an expression and deserialize the result
pub async fn evaluate_as<T, D>(page: &D, expression: &str) -> E2eResult<T>
where
    T: DeserializeOwned,
    D: PageDriver + ?Sized,
{
    Ok(serde_json::from_value(page.evaluate(expression).await?)?)
}

/// Outcome of running a function against a selector's element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SelectorEvaluation {
    pub(crate) found: bool,
    #[serde(default)]
    pub(crate) value: Value,
}

/// Script calling `function(element, arg)` on the selector's element.
///
/// Evaluates to `{ found: false }` when nothing matches, else
/// `{ found: true, value }`.
pub(crate) fn selector_script<A: Serialize + ?Sized>(
    selector: &Selector,
    function: &str,
    arg: &A,
) -> String {
    format!(
        "(() => {{ const el = {}; if (el === null) return {{ found: false }}; \
         return {{ found: true, value: ({function})(el, {}) }}; }})()",
        selector.to_query(),
        js_literal(arg)
    )
}

/// Run a JavaScript function with the matched element and `arg`, returning its result
pub async fn eval_on_selector<D, A>(
    page: &D,
    selector: &Selector,
    function: &str,
    arg: &A,
) -> E2eResult<Value>
where
    D: PageDriver + ?Sized,
    A: Serialize + ?Sized + Sync,
{
    let script = selector_script(selector, function, arg);
    let result: SelectorEvaluation = evaluate_as(page, &script).await?;
    if result.found {
        Ok(result.value)
    } else {
        Err(E2eError::ElementNotFound {
            selector: selector.to_string(),
        })
    }
}

/// JSON a page returns for a matched element whose function produced `value`.
///
/// Handy when scripting [`MockDriver`] responses.
pub fn found(value: impl Into<Value>) -> Value {
    json!({ "found": true, "value": value.into() })
}

// ============================================================================
// Mock Implementation
// ============================================================================

#[derive(Debug, Default)]
struct MockState {
    url: String,
    calls: Vec<String>,
    responses: Vec<(String, VecDeque<Value>)>,
    missing: HashSet<String>,
}

/// In-memory driver for unit tests.
///
/// Records every primitive call as `"<method>:<argument>"` and answers
/// `evaluate` from scripted responses: the first registered pattern contained
/// in the expression wins, its values are consumed in order and the last one
/// repeats. Unscripted expressions evaluate to `null`.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
    options: WaitOptions,
    platform: Option<Platform>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom wait options
    #[must_use]
    pub fn with_wait_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Pretend to run on `platform`
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Script responses for expressions containing `pattern`
    pub fn respond_to(&self, pattern: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        let values: VecDeque<Value> = values.into_iter().collect();
        if !values.is_empty() {
            self.lock().responses.push((pattern.into(), values));
        }
    }

    /// Make a selector never match (waits time out, clicks fail)
    pub fn mark_missing(&self, selector: impl Into<Selector>) {
        let selector: Selector = selector.into();
        self.lock().missing.insert(selector.to_string());
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Call history without `evaluate` calls
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| !c.starts_with("evaluate:"))
            .cloned()
            .collect()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }

    fn require(&self, selector: &Selector) -> E2eResult<()> {
        let key = selector.to_string();
        if self.lock().missing.contains(&key) {
            Err(E2eError::ElementNotFound { selector: key })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.record(format!("navigate:{url}"));
        self.lock().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn click(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()> {
        match options.position {
            Some(p) => self.record(format!("click:{selector}@{},{}", p.x, p.y)),
            None => self.record(format!("click:{selector}")),
        }
        self.require(selector)
    }

    async fn hover(&self, selector: &Selector, options: &PointerOptions) -> E2eResult<()> {
        let forced = if options.force { "!" } else { "" };
        self.record(format!("hover{forced}:{selector}"));
        self.require(selector)
    }

    async fn focus(&self, selector: &Selector) -> E2eResult<()> {
        self.record(format!("focus:{selector}"));
        self.require(selector)
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> E2eResult<()> {
        self.record(format!("type:{selector}:{text}"));
        self.require(selector)
    }

    async fn press_key(&self, key: &str) -> E2eResult<()> {
        self.record(format!("press:{key}"));
        crate::keyboard::KeyChord::parse(key).map(|_| ())
    }

    async fn evaluate(&self, expression: &str) -> E2eResult<Value> {
        self.record(format!("evaluate:{expression}"));
        let mut state = self.lock();
        let response = state
            .responses
            .iter_mut()
            .find(|(pattern, _)| expression.contains(pattern.as_str()))
            .map(|(_, values)| {
                if values.len() > 1 {
                    values.pop_front().unwrap_or_default()
                } else {
                    values.front().cloned().unwrap_or_default()
                }
            });
        Ok(response.unwrap_or(Value::Null))
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &Selector, timeout: Duration) -> E2eResult<()> {
        self.record(format!("wait_for_selector:{selector}"));
        if self.require(selector).is_err() {
            return Err(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
                waited_for: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_timeout(&self, duration: Duration) -> E2eResult<()> {
        self.record(format!("wait_for_timeout:{}", duration.as_millis()));
        Ok(())
    }

    fn wait_options(&self) -> WaitOptions {
        self.options
    }

    fn platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod geometry_tests {
        use super::*;

        #[test]
        fn test_target_defaults_to_center() {
            let bbox = BoundingBox {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 40.0,
            };
            assert_eq!(bbox.target(None), Point::new(60.0, 40.0));
        }

        #[test]
        fn test_target_with_offset() {
            let bbox = BoundingBox {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 40.0,
            };
            assert_eq!(bbox.target(Some(Point::new(16.0, 4.0))), Point::new(26.0, 24.0));
        }

        #[test]
        fn test_pointer_options() {
            let opts = PointerOptions::at(8.0, 4.0).forced();
            assert_eq!(opts.position, Some(Point::new(8.0, 4.0)));
            assert!(opts.force);
            assert!(!PointerOptions::default().force);
        }
    }

    mod script_tests {
        use super::*;

        #[test]
        fn test_selector_script_shape() {
            let script = selector_script(
                &Selector::css("#entry-box"),
                "(el, prop) => el.style[prop]",
                "color",
            );
            assert!(script.contains("document.querySelector(\"#entry-box\")"));
            assert!(script.contains("return { found: false }"));
            assert!(script.contains("((el, prop) => el.style[prop])(el, \"color\")"));
        }

        #[test]
        fn test_found_helper() {
            assert_eq!(found("x"), json!({"found": true, "value": "x"}));
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_updates_url() {
            let driver = MockDriver::new();
            driver.navigate("http://localhost/a/test-x").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "http://localhost/a/test-x");
            assert!(driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_responses_consume_then_repeat() {
            let driver = MockDriver::new();
            driver.respond_to("lastRun", [json!(1), json!(2)]);

            assert_eq!(driver.evaluate("window.lastRun").await.unwrap(), json!(1));
            assert_eq!(driver.evaluate("window.lastRun").await.unwrap(), json!(2));
            assert_eq!(driver.evaluate("window.lastRun").await.unwrap(), json!(2));
            assert_eq!(driver.evaluate("other").await.unwrap(), Value::Null);
        }

        #[tokio::test]
        async fn test_missing_selector() {
            let driver = MockDriver::new();
            driver.mark_missing("[title='HTTP'] + div");

            let sel = Selector::css("[title='HTTP'] + div");
            let err = driver.click(&sel, &PointerOptions::default()).await.unwrap_err();
            assert!(matches!(err, E2eError::ElementNotFound { .. }));

            let err = driver
                .wait_for_selector(&sel, Duration::from_millis(10))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test]
        async fn test_press_rejects_bad_chord() {
            let driver = MockDriver::new();
            assert!(driver.press_key("Control+").await.is_err());
            assert_eq!(driver.history(), vec!["press:Control+"]);
        }

        #[tokio::test]
        async fn test_actions_skip_evaluate() {
            let driver = MockDriver::new();
            driver.evaluate("1 + 1").await.unwrap();
            driver.close().await.unwrap();
            assert_eq!(driver.actions(), vec!["close"]);
            assert_eq!(driver.history().len(), 2);
        }
    }

    mod helper_tests {
        use super::*;

        #[tokio::test]
        async fn test_evaluate_as() {
            let driver = MockDriver::new();
            driver.respond_to("answer", [json!(42)]);
            let n: u32 = evaluate_as(&driver, "window.answer").await.unwrap();
            assert_eq!(n, 42);
        }

        #[tokio::test]
        async fn test_eval_on_selector_found() {
            let driver = MockDriver::new();
            driver.respond_to("selectionStart", [found(3)]);
            let value = eval_on_selector(
                &driver,
                &Selector::css("#entry-box"),
                "el => el.selectionStart",
                &Value::Null,
            )
            .await
            .unwrap();
            assert_eq!(value, json!(3));
        }

        #[tokio::test]
        async fn test_eval_on_selector_missing() {
            let driver = MockDriver::new();
            driver.respond_to("selectionStart", [json!({"found": false})]);
            let err = eval_on_selector(
                &driver,
                &Selector::css("#nope"),
                "el => el.selectionStart",
                &Value::Null,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, E2eError::ElementNotFound { selector } if selector == "#nope"));
        }

        #[tokio::test]
        async fn test_default_wait_for_selector_polls_evaluate() {
            struct EvalOnly(MockDriver);

            #[async_trait]
            impl PageDriver for EvalOnly {
                async fn navigate(&self, url: &str) -> E2eResult<()> {
                    self.0.navigate(url).await
                }
                async fn current_url(&self) -> E2eResult<String> {
                    self.0.current_url().await
                }
                async fn click(&self, s: &Selector, o: &PointerOptions) -> E2eResult<()> {
                    self.0.click(s, o).await
                }
                async fn hover(&self, s: &Selector, o: &PointerOptions) -> E2eResult<()> {
                    self.0.hover(s, o).await
                }
                async fn focus(&self, s: &Selector) -> E2eResult<()> {
                    self.0.focus(s).await
                }
                async fn type_text(&self, s: &Selector, t: &str) -> E2eResult<()> {
                    self.0.type_text(s, t).await
                }
                async fn press_key(&self, k: &str) -> E2eResult<()> {
                    self.0.press_key(k).await
                }
                async fn evaluate(&self, e: &str) -> E2eResult<Value> {
                    self.0.evaluate(e).await
                }
                async fn close(&self) -> E2eResult<()> {
                    self.0.close().await
                }
                fn wait_options(&self) -> WaitOptions {
                    WaitOptions::new().with_poll_interval(1)
                }
            }

            let driver = EvalOnly(MockDriver::new());
            driver
                .0
                .respond_to("!== null", [json!(false), json!(false), json!(true)]);
            driver
                .wait_for_selector(&Selector::empty("#entry-box"), Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(driver.0.count("evaluate:"), 3);
        }
    }
}
