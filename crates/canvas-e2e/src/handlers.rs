//! Create toplevels (handlers, REPLs, secrets, functions) from the sidebar.

use crate::driver::{PageDriver, PointerOptions};
use crate::expect::expect_exact_text;
use crate::locator::{Locators, Selector};
use crate::result::E2eResult;
use crate::wait::{wait_for_empty_entry_box, wait_for_empty_fluid_entry_box, wait_for_page_to_stop_moving};

/// Click the "+" next to a sidebar heading and let the canvas settle
async fn create_from_sidebar<D: PageDriver + ?Sized>(page: &D, title: &str) -> E2eResult<()> {
    tracing::info!(title, "creating toplevel from sidebar");
    page.click(
        &Selector::css(Locators::sidebar_plus(title)),
        &PointerOptions::default(),
    )
    .await?;
    // move the mouse off the sidebar so it collapses
    page.hover(&Selector::text("Docs"), &PointerOptions::default().forced())
        .await?;
    wait_for_page_to_stop_moving(page).await
}

/// Create an HTTP handler with no method or route
pub async fn create_empty_http_handler<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    create_from_sidebar(page, "HTTP").await
}

/// Create an HTTP handler and fill in its method and route
pub async fn create_http_handler<D: PageDriver + ?Sized>(
    page: &D,
    method: &str,
    path: &str,
) -> E2eResult<()> {
    let entry_box = Selector::css(Locators::ENTRY_BOX);

    create_empty_http_handler(page).await?;
    page.type_text(&entry_box, method).await?;
    page.wait_for_selector(
        &Selector::empty(Locators::ENTRY_BOX),
        page.wait_options().timeout(),
    )
    .await?;
    expect_exact_text(page, Locators::AC_HIGHLIGHTED_VALUE, method).await?;
    page.press_key("Enter").await?;
    wait_for_empty_entry_box(page).await?;

    page.type_text(&entry_box, path).await?;
    expect_exact_text(page, Locators::AC_HIGHLIGHTED_VALUE, path).await?;
    page.press_key("Enter").await?;
    wait_for_empty_fluid_entry_box(page).await
}

/// Create a worker handler and wait for its name to be editable
pub async fn create_worker_handler<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    create_from_sidebar(page, "Worker").await?;
    wait_for_empty_entry_box(page).await
}

/// Create a REPL and wait for the fluid editor
pub async fn create_repl<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    create_from_sidebar(page, "REPL").await?;
    wait_for_empty_fluid_entry_box(page).await
}

/// Open the secret-key form
pub async fn create_secret<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    create_from_sidebar(page, "Secret Keys").await
}

/// Create a user function
pub async fn create_function<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    create_from_sidebar(page, "Functions").await
}
