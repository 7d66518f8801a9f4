//! Text selection in inputs and the fluid editor.

use crate::driver::{eval_on_selector, PageDriver};
use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use serde_json::Value;

/// Select everything in the focused element.
///
/// The chord is pressed three times: a single press does not always take
/// while the editor is re-rendering.
pub async fn select_all<D: PageDriver + ?Sized>(page: &D) -> E2eResult<()> {
    let chord = page.platform().chord("a");
    for _ in 0..3 {
        page.press_key(&chord).await?;
    }
    Ok(())
}

/// Select `length` characters starting `start` characters into the element
pub async fn select_text<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
    start: usize,
    length: usize,
) -> E2eResult<()> {
    page.focus(&Selector::parse(selector)).await?;
    page.press_key("Home").await?;
    for _ in 0..start {
        page.press_key("ArrowRight").await?;
    }
    for _ in 0..length {
        page.press_key("Shift+ArrowRight").await?;
    }
    Ok(())
}

async fn selection_offset<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
    property: &str,
) -> E2eResult<Option<u32>> {
    let value = eval_on_selector(
        page,
        &Selector::parse(selector),
        "(el, prop) => el[prop] ?? null",
        property,
    )
    .await?;
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| E2eError::EvaluationError {
                message: format!("{property} of {selector} is not an offset: {n}"),
            }),
        other => Err(E2eError::EvaluationError {
            message: format!("{property} of {selector} is not an offset: {other}"),
        }),
    }
}

/// `selectionStart` of an input; `None` if the element has no text selection
pub async fn get_element_selection_start<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
) -> E2eResult<Option<u32>> {
    selection_offset(page, selector, "selectionStart").await
}

/// `selectionEnd` of an input; `None` if the element has no text selection
pub async fn get_element_selection_end<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
) -> E2eResult<Option<u32>> {
    selection_offset(page, selector, "selectionEnd").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{found, MockDriver};
    use crate::keyboard::Platform;
    use serde_json::json;

    #[tokio::test]
    async fn test_select_all_presses_three_times() {
        let page = MockDriver::new().with_platform(Platform::Other);
        select_all(&page).await.unwrap();
        assert_eq!(page.history(), vec!["press:Control+a"; 3]);

        let mac = MockDriver::new().with_platform(Platform::MacOs);
        select_all(&mac).await.unwrap();
        assert_eq!(mac.count("press:Meta+a"), 3);
    }

    #[tokio::test]
    async fn test_select_text() {
        let page = MockDriver::new();
        select_text(&page, "#entry-box", 2, 3).await.unwrap();
        assert_eq!(
            page.history(),
            vec![
                "focus:#entry-box",
                "press:Home",
                "press:ArrowRight",
                "press:ArrowRight",
                "press:Shift+ArrowRight",
                "press:Shift+ArrowRight",
                "press:Shift+ArrowRight",
            ]
        );
    }

    #[tokio::test]
    async fn test_select_text_zero_length() {
        let page = MockDriver::new();
        select_text(&page, "#entry-box", 0, 0).await.unwrap();
        assert_eq!(page.history(), vec!["focus:#entry-box", "press:Home"]);
    }

    #[tokio::test]
    async fn test_select_text_missing_element() {
        let page = MockDriver::new();
        page.mark_missing("#entry-box");
        assert!(select_text(&page, "#entry-box", 1, 1).await.is_err());
        assert!(!page.was_called("press"));
    }

    #[tokio::test]
    async fn test_selection_offsets() {
        let page = MockDriver::new();
        page.respond_to("\"selectionStart\"", [found(4)]);
        page.respond_to("\"selectionEnd\"", [found(9)]);

        assert_eq!(
            get_element_selection_start(&page, "#entry-box").await.unwrap(),
            Some(4)
        );
        assert_eq!(
            get_element_selection_end(&page, "#entry-box").await.unwrap(),
            Some(9)
        );
    }

    #[tokio::test]
    async fn test_selection_offset_null() {
        let page = MockDriver::new();
        page.respond_to("selectionStart", [found(Value::Null)]);
        assert_eq!(
            get_element_selection_start(&page, ".fluid-entry").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_selection_offset_rejects_garbage() {
        let page = MockDriver::new();
        page.respond_to("selectionEnd", [found(json!(-1))]);
        assert!(get_element_selection_end(&page, "#entry-box").await.is_err());
    }
}
