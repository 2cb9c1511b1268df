//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many characters are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values never reach the logs.
const REDACTED_FIELDS: [&str; 4] = [
    "password",
    "confirm_password",
    "old_password",
    "new_password",
];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Password fields in submitted forms are redacted.
///
/// Bodies are passed on byte for byte, only the logged copy is decoded, so
/// binary or non-UTF-8 bodies such as CSV exports are not altered.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body_text = loggable_text(&body_bytes);
    if parts.method == Method::POST && is_form(&parts.headers) {
        log_request(&parts, &redact_form_fields(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &loggable_text(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_form(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Replace the values of [REDACTED_FIELDS] in a URL encoded form body.
fn redact_form_fields(form_text: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if REDACTED_FIELDS.contains(&name) => format!("{name}=********"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// A copy of `body` for the logs, invalid UTF-8 is replaced with U+FFFD.
fn loggable_text(body: &Bytes) -> String {
    String::from_utf8_lossy(body).into_owned()
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, `None` if it is not longer than that.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{Router, body::Bytes, middleware, routing::get};
    use axum_test::TestServer;

    use crate::logging::{
        LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_form_fields, truncate,
    };

    /// "ação\n" in Latin-1.
    const LATIN_1: [u8; 5] = [97, 231, 227, 111, 10];

    fn server() -> TestServer {
        let app = Router::new()
            .route(
                "/latin1",
                get(|| async { LATIN_1.to_vec() }).post(|body: Bytes| async move { body }),
            )
            .layer(middleware::from_fn(logging_middleware));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn passes_non_utf8_response_through_unchanged() {
        let response = server().get("/latin1").await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), LATIN_1.as_slice());
    }

    #[tokio::test]
    async fn passes_non_utf8_request_through_unchanged() {
        let response = server()
            .post("/latin1")
            .bytes(Bytes::from_static(&LATIN_1))
            .await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), LATIN_1.as_slice());
    }

    #[test]
    fn redacts_every_password_field() {
        let form = "username=alice&password=hunter2&confirm_password=hunter2";

        assert_eq!(
            redact_form_fields(form),
            "username=alice&password=********&confirm_password=********"
        );
        assert_eq!(
            redact_form_fields("old_password=a&new_password=b&confirm_password=b"),
            "old_password=********&new_password=********&confirm_password=********"
        );
    }

    #[test]
    fn keeps_other_fields() {
        let form = "amount=35%2C90&note=password%3D1";

        assert_eq!(redact_form_fields(form), form);
    }

    #[test]
    fn truncates_long_bodies_by_character() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        assert_eq!(
            truncate(&body).map(|text| text.chars().count()),
            Some(LOG_BODY_LENGTH_LIMIT)
        );
        assert_eq!(truncate("short"), None);
    }
}
