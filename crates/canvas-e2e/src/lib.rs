//! canvas-e2e: end-to-end test helpers for the Dark canvas editor
//!
//! A library of page-automation helpers that browser scenarios call to drive
//! the editor: building handler and editor URLs, creating toplevels from the
//! sidebar, typing into the entry box, waiting for the editor to settle,
//! asserting on element text and waiting for live-value analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   scenario (#[tokio::test])                                     │
//! │        │                                                        │
//! │        ▼                                                        │
//! │   helpers: navigation, handlers, selection, expect, analysis    │
//! │        │                                                        │
//! │        ▼                                                        │
//! │   PageDriver ──► ChromiumPage (CDP, `browser` feature)          │
//! │              └─► MockDriver (records calls, unit tests)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```ignore
//! let config = E2eConfig::from_env()?;
//! init_tracing(&config.log);
//! let browser = Browser::launch_from(&config).await?;
//! let page = browser.new_page().await?;
//! let test = TestInfo::new("http_handler");
//!
//! page.navigate(&canvas_url(&config, "http_handler")).await?;
//! create_http_handler(&page, "GET", "/hello").await?;
//! expect(&page, ".toplevel .handler-name").to_have_text("/hello").await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod analysis;
pub mod api;
mod browser;
mod config;
mod dom;
mod driver;
mod expect;
mod handlers;
mod keyboard;
mod locator;
mod logging;
mod navigation;
mod result;
mod selection;
mod wait;

pub use analysis::{await_analysis, await_analysis_loaded, last_analysis_run, AnalysisLoadedToken};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumPage};
pub use browser::BrowserConfig;
pub use config::{
    E2eConfig, DEFAULT_BASE_URL, DEFAULT_BWD_BASE_URL, ENV_BASE_URL, ENV_BWD_BASE_URL,
    ENV_CHROMIUM_PATH, ENV_CONFIG_FILE, ENV_HEADLESS,
};
pub use dom::{caret_pos, get_style_property, CHAR_WIDTH_PX};
pub use driver::{
    eval_on_selector, evaluate_as, found, BoundingBox, MockDriver, PageDriver, Point,
    PointerOptions,
};
pub use expect::{
    expect, expect_contains_text, expect_exact_text, expect_placeholder_text,
    normalize_whitespace, Expect,
};
pub use handlers::{
    create_empty_http_handler, create_function, create_http_handler, create_repl, create_secret,
    create_worker_handler,
};
pub use keyboard::{press_shortcut, KeyChord, KeyDefinition, Modifier, Platform};
pub use locator::{Locators, Selector};
pub use logging::{init_tracing, LogConfig, DEFAULT_LOG_FILTER};
pub use navigation::{bwd_url, canvas_url, goto_ast, goto_hash, TestInfo};
pub use result::{E2eError, E2eResult};
pub use selection::{
    get_element_selection_end, get_element_selection_start, select_all, select_text,
};
pub use wait::{
    is_truthy, poll_until, wait_for_empty_entry_box, wait_for_empty_fluid_entry_box,
    wait_for_fluid_cursor, wait_for_function, wait_for_page_to_stop_moving, WaitOptions,
    WaitResult, DEFAULT_EXPECT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
    PAGE_SETTLE_MS,
};
