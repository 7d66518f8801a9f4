//! Wait Mechanisms
//!
//! Polling waits used to synchronise tests with the editor. Every wait is an
//! async poll with a timeout; nothing blocks the runtime thread.
//!
//! The editor-specific waits cover the entry box and the fluid editor: both
//! sometimes carry state over briefly after an action, so tests wait until
//! they are empty and focused before typing again.

use crate::driver::PageDriver;
use crate::expect::expect;
use crate::locator::{Locators, Selector};
use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for expectations (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// How long the canvas takes to settle after a toplevel is created
pub const PAGE_SETTLE_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Timeouts used by waits and expectations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout for waits in milliseconds
    pub timeout_ms: u64,
    /// Timeout for expectations in milliseconds
    pub expect_timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set wait timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set expectation timeout in milliseconds
    #[must_use]
    pub const fn with_expect_timeout(mut self, expect_timeout_ms: u64) -> Self {
        self.expect_timeout_ms = expect_timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Wait timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Expectation timeout as Duration
    #[must_use]
    pub const fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the satisfied probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields a value or `timeout` elapses.
///
/// The probe runs at least once, so a zero timeout still checks the condition.
/// Errors from the probe abort the wait immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    waited_for: impl Into<String>,
    mut probe: F,
) -> E2eResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Option<T>>>,
{
    let waited_for = waited_for.into();
    let start = Instant::now();

    loop {
        if let Some(value) = probe().await? {
            tracing::debug!(waited_for = %waited_for, elapsed_ms = start.elapsed().as_millis() as u64, "wait satisfied");
            return Ok(WaitResult {
                value,
                elapsed: start.elapsed(),
                waited_for,
            });
        }
        if start.elapsed() >= timeout {
            return Err(E2eError::Timeout {
                ms: timeout.as_millis() as u64,
                waited_for,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// JavaScript truthiness of an evaluation result
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Poll a page expression until it evaluates to a truthy value, which is returned
pub async fn wait_for_function<D: PageDriver + ?Sized>(
    page: &D,
    expression: &str,
) -> E2eResult<WaitResult<Value>> {
    let options = page.wait_options();
    poll_until(
        options.timeout(),
        options.poll_interval(),
        expression,
        move || async move {
            let value = page.evaluate(expression).await?;
            Ok(is_truthy(&value).then_some(value))
        },
    )
    .await
}

// =============================================================================
// EDITOR WAITS
// =============================================================================

/// Wait until the entry box is cleared and focused
pub async fn wait_for_empty_entry_box<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    page.wait_for_selector(
        &Selector::empty(Locators::ENTRY_BOX),
        page.wait_options().timeout(),
    )
    .await?;
    expect(page, Locators::ENTRY_BOX).to_be_focused().await
}

/// Wait until the fluid editor holds the cursor
pub async fn wait_for_fluid_cursor<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    expect(page, Locators::ACTIVE_EDITOR).to_be_focused().await
}

/// Wait until the fluid editor is empty and holds the cursor
pub async fn wait_for_empty_fluid_entry_box<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    page.wait_for_selector(
        &Selector::empty(Locators::ACTIVE_EDITOR),
        page.wait_options().timeout(),
    )
    .await?;
    wait_for_fluid_cursor(page).await
}

/// Give canvas animations time to finish
// TODO: replace the fixed settle with a wait on the canvas scroll animation ending
pub async fn wait_for_page_to_stop_moving<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    page.wait_for_timeout(Duration::from_millis(PAGE_SETTLE_MS))
        .await
}

// =============================================================================
// TESTS
// =============================================================================
