//! HTTP calls made from inside the page.
//!
//! Requests run through the page's own `fetch`, so they carry the page's
//! cookies and origin exactly as the editor's requests would.

use crate::driver::PageDriver;
use crate::locator::js_literal;
use crate::result::{E2eError, E2eResult};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct FetchRequest<'a> {
    url: &'a str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

fn fetch_script(request: &FetchRequest<'_>) -> String {
    format!(
        "(async ({{ url, method, body }}) => {{ \
         const init = {{ method }}; \
         if (body !== undefined) {{ \
         init.headers = {{ \"Content-Type\": \"application/json\" }}; \
         init.body = body; \
         }} \
         const response = await fetch(url, init); \
         return response.text(); \
         }})({})",
        js_literal(request)
    )
}

async fn fetch_text<D: PageDriver + ?Sized>(page: &D, request: FetchRequest<'_>) -> E2eResult<String> {
    tracing::debug!(method = request.method, url = request.url, "fetch from page");
    match page.evaluate(&fetch_script(&request)).await? {
        Value::String(text) => Ok(text),
        other => Err(E2eError::EvaluationError {
            message: format!(
                "{} {} returned {other} instead of a response body",
                request.method, request.url
            ),
        }),
    }
}

/// GET `url` from the page and return the response body
pub async fn get<D: PageDriver + ?Sized>(page: &D, url: &str) -> E2eResult<String> {
    fetch_text(
        page,
        FetchRequest {
            url,
            method: "GET",
            body: None,
        },
    )
    .await
}

/// POST a JSON `body` to `url` from the page and return the response body
pub async fn post<D: PageDriver + ?Sized>(page: &D, url: &str, body: &str) -> E2eResult<String> {
    fetch_text(
        page,
        FetchRequest {
            url,
            method: "POST",
            body: Some(body),
        },
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use serde_json::json;

    #[test]
    fn test_get_script_has_no_body() {
        let script = fetch_script(&FetchRequest {
            url: "http://test-x.builtwithdark.localhost:11001/hello",
            method: "GET",
            body: None,
        });
        assert!(script.contains(
            "({\"url\":\"http://test-x.builtwithdark.localhost:11001/hello\",\"method\":\"GET\"})"
        ));
        assert!(script.contains("await fetch(url, init)"));
    }

    #[test]
    fn test_post_body_is_json_encoded() {
        let script = fetch_script(&FetchRequest {
            url: "/api",
            method: "POST",
            body: Some("{\"a\":\"it's\"}"),
        });
        assert!(script.contains(r#""body":"{\"a\":\"it's\"}""#));
        assert!(script.contains("\"Content-Type\": \"application/json\""));
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let page = MockDriver::new();
        page.respond_to("fetch(url, init)", [json!("hello world")]);

        let body = get(&page, "http://test-x.builtwithdark.localhost:11001/")
            .await
            .unwrap();
        assert_eq!(body, "hello world");
        assert!(page.was_called("evaluate:(async"));
    }

    #[tokio::test]
    async fn test_post_returns_body() {
        let page = MockDriver::new();
        page.respond_to("\"method\":\"POST\"", [json!("{\"ok\":true}")]);

        let body = post(&page, "/echo", "{\"x\":1}").await.unwrap();
        assert_eq!(body, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_non_string_result_is_an_error() {
        let page = MockDriver::new();
        let err = get(&page, "/missing").await.unwrap_err();
        assert!(err.to_string().contains("GET /missing returned null"));
    }
}
