//! Navigation: canvas URLs, user-handler URLs and the AST cursor.
//!
//! Every scenario gets its own canvas named `test-<title>`, where `title` is
//! the scenario's [`TestInfo::title`]. Requests to the canvas's deployed HTTP
//! handlers go to `http://test-<title><bwd_base_url><path>`.

use crate::config::E2eConfig;
use crate::driver::{PageDriver, PointerOptions};
use crate::expect::expect;
use crate::locator::{Locators, Selector};
use crate::result::E2eResult;
use serde::{Deserialize, Serialize};

/// Identity of the running scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestInfo {
    /// Scenario title; names the scenario's canvas
    pub title: String,
}

impl TestInfo {
    /// Create test info for a scenario title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Name of the scenario's canvas
    #[must_use]
    pub fn canvas_name(&self) -> String {
        format!("test-{}", self.title)
    }
}

/// URL of a user HTTP handler on the scenario's canvas
#[must_use]
pub fn bwd_url(config: &E2eConfig, test: &TestInfo, path: &str) -> String {
    format!("http://{}{}{path}", test.canvas_name(), config.bwd_base_url)
}

/// Editor URL of the test canvas `test-<canvas_name>`
#[must_use]
pub fn canvas_url(config: &E2eConfig, canvas_name: &str) -> String {
    format!(
        "{}/a/test-{canvas_name}?integration-test=true",
        config.base_url.trim_end_matches('/')
    )
}

/// Open the scenario's canvas at a location hash (e.g. `handler=123`)
pub async fn goto_hash<D: PageDriver + ?Sized>(
    page: &D,
    config: &E2eConfig,
    test: &TestInfo,
    hash: &str,
) -> E2eResult<()> {
    let url = format!("{}#{hash}", canvas_url(config, &test.title));
    tracing::debug!(%url, "navigating to canvas");
    page.navigate(&url).await
}

/// Put the cursor into the fluid editor
pub async fn goto_ast<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    page.click(
        &Selector::css(Locators::ACTIVE_EDITOR_SPAN),
        &PointerOptions::default(),
    )
    .await?;
    expect(page, Locators::ACTIVE_EDITOR).to_be_focused().await
}
