//! Auto-retrying expectations.
//!
//! `expect(page, selector).to_have_text("GET")` keeps re-reading the element
//! until the condition holds or the page's expectation timeout elapses, so a
//! test never fails just because the editor had not re-rendered yet. A missing
//! element counts as "not yet", not as an error.

use crate::driver::{selector_script, PageDriver, SelectorEvaluation};
use crate::locator::{Locators, Selector};
use crate::result::{E2eError, E2eResult};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Expectation builder for one element
#[derive(Debug)]
pub struct Expect<'a, D: PageDriver + ?Sized> {
    page: &'a D,
    selector: Selector,
    timeout: Duration,
    poll_interval: Duration,
}

/// Start an expectation on the element matched by `selector`
pub fn expect<D: PageDriver + ?Sized>(page: &D, selector: impl Into<Selector>) -> Expect<'_, D> {
    let options = page.wait_options();
    Expect {
        page,
        selector: selector.into(),
        timeout: options.expect_timeout(),
        poll_interval: options.poll_interval(),
    }
}

impl<'a, D: PageDriver + ?Sized> Expect<'a, D> {
    /// Override the expectation timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Element text equals `expected` (whitespace normalized)
    pub async fn to_have_text(&self, expected: &str) -> E2eResult<()> {
        let expected = normalize_whitespace(expected);
        self.retry(&format!("to have text {expected:?}"), TEXT_CONTENT, |observed| {
            observed
                .as_str()
                .is_some_and(|text| normalize_whitespace(text) == expected)
        })
        .await
    }

    /// Element text contains `expected` (whitespace normalized)
    pub async fn to_contain_text(&self, expected: &str) -> E2eResult<()> {
        let expected = normalize_whitespace(expected);
        self.retry(&format!("to contain text {expected:?}"), TEXT_CONTENT, |observed| {
            observed
                .as_str()
                .is_some_and(|text| normalize_whitespace(text).contains(&expected))
        })
        .await
    }

    /// Element attribute `name` equals `value`
    pub async fn to_have_attribute(&self, name: &str, value: &str) -> E2eResult<()> {
        let function = format!(
            "el => el.getAttribute({})",
            crate::locator::js_literal(name)
        );
        self.retry(
            &format!("to have attribute {name}={value:?}"),
            &function,
            |observed| observed.as_str() == Some(value),
        )
        .await
    }

    /// Element is the document's active element
    pub async fn to_be_focused(&self) -> E2eResult<()> {
        self.retry("to be focused", FOCUSED, |observed| observed == &Value::Bool(true))
            .await
    }

    async fn retry<P>(&self, expectation: &str, function: &str, matches: P) -> E2eResult<()>
    where
        P: Fn(&Value) -> bool,
    {
        let script = selector_script(&self.selector, function, &Value::Null);
        let page = self.page;
        let script = &script;
        retry_observation(
            self.timeout,
            self.poll_interval,
            move || async move {
                let observed: SelectorEvaluation =
                    serde_json::from_value(page.evaluate(script).await?)?;
                Ok(observed)
            },
            |observed| observed.found && matches(&observed.value),
        )
        .await
        .map_err(|last| {
            let last = match last {
                Some(observed) if observed.found => observed.value.to_string(),
                _ => "no matching element".to_string(),
            };
            E2eError::AssertionFailed {
                message: format!("expected {} {expectation}, last observed {last}", self.selector),
            }
        })
    }
}

const TEXT_CONTENT: &str = "el => el.textContent";
const FOCUSED: &str = "el => document.activeElement === el";

/// Observe until `accept` holds; on timeout return the last observation.
async fn retry_observation<F, Fut, A>(
    timeout: Duration,
    poll_interval: Duration,
    mut observe: F,
    accept: A,
) -> Result<(), Option<SelectorEvaluation>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<SelectorEvaluation>>,
    A: Fn(&SelectorEvaluation) -> bool,
{
    let start = Instant::now();
    let mut last = None;
    loop {
        match observe().await {
            Ok(observed) if accept(&observed) => return Ok(()),
            Ok(observed) => last = Some(observed),
            Err(err) => tracing::debug!(error = %err, "expectation probe failed, retrying"),
        }
        if start.elapsed() >= timeout {
            return Err(last);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Collapse runs of whitespace to one space and trim both ends
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expect the element's text to equal `text`
pub async fn expect_exact_text<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
    text: &str,
) -> E2eResult<()> {
    expect(page, selector).to_have_text(text).await
}

/// Expect the element's text to contain `text`
pub async fn expect_contains_text<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
    text: &str,
) -> E2eResult<()> {
    expect(page, selector).to_contain_text(text).await
}

/// Expect the entry box placeholder to read `text`
pub async fn expect_placeholder_text<D: PageDriver + ?Sized>(page: &D, text: &str) -> E2eResult<()> {
    expect(page, Locators::ENTRY_BOX)
        .to_have_attribute("placeholder", text)
        .await
}
