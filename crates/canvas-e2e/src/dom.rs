//! Element inspection and click positions.

use crate::driver::{eval_on_selector, PageDriver, PointerOptions};
use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use serde_json::Value;

/// Width of one character in the editor's monospace font
pub const CHAR_WIDTH_PX: f64 = 8.0;

/// Click options landing on character `pos` of a single-line token
#[must_use]
pub fn caret_pos(pos: u32) -> PointerOptions {
    PointerOptions::at(f64::from(pos) * CHAR_WIDTH_PX, 4.0)
}

/// Computed CSS property value of an element
pub async fn get_style_property<D: PageDriver + ?Sized>(
    page: &D,
    selector: &str,
    property: &str,
) -> E2eResult<String> {
    let value = eval_on_selector(
        page,
        &Selector::parse(selector),
        "(el, prop) => window.getComputedStyle(el).getPropertyValue(prop)",
        property,
    )
    .await?;
    match value {
        Value::String(s) => Ok(s),
        other => Err(E2eError::EvaluationError {
            message: format!("style {property} of {selector} is not a string: {other}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{found, MockDriver, Point};

    #[test]
    fn test_caret_pos() {
        assert_eq!(caret_pos(0).position, Some(Point::new(0.0, 4.0)));
        assert_eq!(caret_pos(3).position, Some(Point::new(24.0, 4.0)));
        assert!(!caret_pos(3).force);
    }

    #[tokio::test]
    async fn test_click_at_caret_pos() {
        let page = MockDriver::new();
        page.click(&Selector::css(".fluid-string"), &caret_pos(2))
            .await
            .unwrap();
        assert_eq!(page.history(), vec!["click:.fluid-string@16,4"]);
    }

    #[tokio::test]
    async fn test_get_style_property() {
        let page = MockDriver::new();
        page.respond_to("getComputedStyle", [found("rgb(255, 0, 0)")]);

        let color = get_style_property(&page, ".selected", "color").await.unwrap();
        assert_eq!(color, "rgb(255, 0, 0)");
        assert!(page.was_called("evaluate:(() => { const el = document.querySelector(\".selected\")"));
    }

    #[tokio::test]
    async fn test_get_style_property_missing_element() {
        let page = MockDriver::new();
        page.respond_to("getComputedStyle", [serde_json::json!({"found": false})]);

        let err = get_style_property(&page, ".nope", "color").await.unwrap_err();
        assert!(matches!(err, E2eError::ElementNotFound { .. }));
    }
}
