//! Scenario tests: helpers chained the way editor scenarios use them.
//!
//! Run against `MockDriver`; the Chromium smoke test needs the `browser`
//! feature and a local chromium, so it is ignored by default.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use canvas_e2e::{
    api, await_analysis, await_analysis_loaded, bwd_url, caret_pos, create_http_handler,
    create_repl, expect, found, goto_ast, goto_hash, init_tracing, last_analysis_run,
    press_shortcut, select_all, select_text, E2eConfig, LogConfig, Locators, MockDriver,
    PageDriver, Platform, Selector, TestInfo, WaitOptions,
};
use serde_json::json;

fn page() -> MockDriver {
    MockDriver::new()
        .with_platform(Platform::Other)
        .with_wait_options(
            WaitOptions::new()
                .with_timeout(100)
                .with_expect_timeout(100)
                .with_poll_interval(5),
        )
}

// ============================================================================
// Handler Scenarios
// ============================================================================

#[tokio::test]
async fn test_http_handler_round_trip() {
    init_tracing(&LogConfig::default().with_filter("canvas_e2e=debug"));
    let config = E2eConfig::default();
    let test = TestInfo::new("http_handler");
    let page = page();
    page.respond_to("el.textContent", [found("GET"), found("/hello")]);
    page.respond_to("document.activeElement", [found(true)]);
    page.respond_to("fetch(url, init)", [json!("hello world")]);

    goto_hash(&page, &config, &test, "handler=1").await.unwrap();
    create_http_handler(&page, "GET", "/hello").await.unwrap();
    let body = api::get(&page, &bwd_url(&config, &test, "/hello"))
        .await
        .unwrap();

    assert_eq!(body, "hello world");
    assert_eq!(
        page.actions()[0],
        "navigate:http://darklang.localhost:9000/a/test-http_handler?integration-test=true#handler=1"
    );
    assert!(page.was_called("click:[title='HTTP'] + div"));
    assert!(page.was_called("type:#entry-box:GET"));
    assert!(page.was_called("type:#entry-box:/hello"));
    assert_eq!(page.count("press:Enter"), 2);
    assert!(page
        .history()
        .iter()
        .any(|c| c.contains("http://test-http_handler.builtwithdark.localhost:11001/hello")));
}

#[tokio::test]
async fn test_handler_fails_when_autocomplete_disagrees() {
    let page = page();
    page.respond_to("el.textContent", [found("POST")]);
    page.respond_to("document.activeElement", [found(true)]);

    let err = create_http_handler(&page, "GET", "/").await.unwrap_err();
    assert!(err.to_string().contains("to have text \"GET\""));
    assert!(!page.was_called("press:Enter"));
}

// ============================================================================
// Editing Scenarios
// ============================================================================

#[tokio::test]
async fn test_repl_editing() {
    let page = page();
    page.respond_to("document.activeElement", [found(true)]);
    page.respond_to("el.textContent", [found("let x = 5")]);

    create_repl(&page).await.unwrap();
    goto_ast(&page).await.unwrap();
    page.click(&Selector::css(Locators::ACTIVE_EDITOR_SPAN), &caret_pos(4))
        .await
        .unwrap();
    select_text(&page, Locators::ACTIVE_EDITOR, 4, 1).await.unwrap();
    select_all(&page).await.unwrap();
    press_shortcut(&page, "z").await.unwrap();
    expect(&page, Locators::ACTIVE_EDITOR)
        .to_contain_text("x = 5")
        .await
        .unwrap();

    assert!(page.was_called("click:#active-editor > span@32,4"));
    assert_eq!(page.count("press:Shift+ArrowRight"), 1);
    assert_eq!(page.count("press:Control+a"), 3);
    assert!(page.was_called("press:Control+z"));
}

// ============================================================================
// Analysis Scenarios
// ============================================================================

#[tokio::test]
async fn test_analysis_after_edit() {
    let page = page();
    page.respond_to("initialized", [json!(false), json!(true)]);
    page.respond_to("lastRun", [json!(100.0), json!(100.0), json!(2100.0)]);

    let token = await_analysis_loaded(&page).await.unwrap();
    let before = last_analysis_run(&page, &token).await.unwrap().unwrap_or(0.0);
    page.type_text(&Selector::css(Locators::ACTIVE_EDITOR), "1")
        .await
        .unwrap();
    let after = await_analysis(&page, before, &token).await.unwrap();

    assert!((after - 2100.0).abs() < f64::EPSILON);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_drives_urls() {
    let config = E2eConfig::from_yaml_str(
        "base_url: https://editor.test/\nbwd_base_url: .handlers.test\n",
    )
    .unwrap();
    let test = TestInfo::new("cfg");
    assert_eq!(
        canvas_e2e::canvas_url(&config, "cfg"),
        "https://editor.test/a/test-cfg?integration-test=true"
    );
    assert_eq!(
        bwd_url(&config, &test, "/x"),
        "http://test-cfg.handlers.test/x"
    );
}

// ============================================================================
// Real Browser
// ============================================================================

#[cfg(feature = "browser")]
#[tokio::test]
#[ignore = "requires a local chromium"]
async fn test_chromium_smoke() {
    use canvas_e2e::{Browser, BrowserConfig};

    let browser = Browser::launch(BrowserConfig::default().with_no_sandbox())
        .await
        .unwrap();
    let page = browser.new_page().await.unwrap();
    page.navigate("data:text/html,<input id='entry-box' placeholder='route'>")
        .await
        .unwrap();
    page.type_text(&Selector::css(Locators::ENTRY_BOX), "GET")
        .await
        .unwrap();

    let value = page
        .evaluate("document.querySelector('#entry-box').value")
        .await
        .unwrap();
    assert_eq!(value, json!("GET"));
    canvas_e2e::expect_placeholder_text(&page, "route")
        .await
        .unwrap();

    page.close().await.unwrap();
    browser.close().await.unwrap();
}
