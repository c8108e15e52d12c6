//! Failure-path response normalization.
//!
//! Any response leaving the application with a 4xx/5xx status is rewritten into
//! `{timestamp, path, statusCode, message}`. Recognized [`AppError`]s keep their
//! own status and message; anything else (framework rejections, unmatched
//! routes, panics) is described from whatever the response carries.
//!
//! [`AppError`]: crate::core::error::AppError

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};

use crate::core::error::{Failure, FailureMessage};
use crate::core::i18n::I18n;
use crate::shared::types::{ErrorMessage, ErrorResponse};

/// Largest unrecognized error body read back to describe a failure
const MAX_DESCRIBED_BODY: usize = 64 * 1024;

pub async fn normalize_exception(
    State(i18n): State<Arc<I18n>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let lang = i18n.resolve_language(req.uri(), req.headers());

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let failure = response.extensions().get::<Failure>().cloned();
    let (mut parts, body) = response.into_parts();

    let message = match failure {
        Some(failure) => failure.message.resolve(&i18n, &lang),
        None => describe_unrecognized(status, body).await,
    };

    let envelope = ErrorResponse {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path,
        status_code: status.as_u16(),
        message,
    };

    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| {
        // ErrorResponse only holds strings; kept total for safety
        format!(r#"{{"statusCode":{}}}"#, status.as_u16()).into_bytes()
    });

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(body))
}

/// Best-effort text for a failure that did not come from `AppError`
async fn describe_unrecognized(status: StatusCode, body: Body) -> ErrorMessage {
    let text = to_bytes(body, MAX_DESCRIBED_BODY)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .filter(|text| !text.is_empty());

    let message = text.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });

    ErrorMessage::Single(message)
}

/// Turns a handler panic into a 500 failure rendered by [`normalize_exception`]
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let description = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", description);

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(Failure {
        message: FailureMessage::Plain(ErrorMessage::Single(description)),
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{AppError, LocalizedMessage, Result};
    use crate::shared::test_helpers::{test_i18n, with_pipeline};
    use axum::{http::HeaderName, routing::get, Json, Router};
    use axum_test::TestServer;
    use chrono::DateTime;
    use serde_json::Value;

    async fn not_found() -> Result<Json<Value>> {
        Err(AppError::NotFound("Not found".to_string()))
    }

    async fn teapot() -> Result<Json<Value>> {
        Err(AppError::Http {
            status: StatusCode::IM_A_TEAPOT,
            message: vec!["first".to_string(), "second".to_string()].into(),
        })
    }

    async fn unexpected() -> Result<Json<Value>> {
        Err(AppError::Storage("connection reset by peer".to_string()))
    }

    async fn bad_file() -> Result<Json<Value>> {
        Err(AppError::InvalidFile(
            LocalizedMessage::new("general.FILE_VALIDATION_MAX").arg("maximum", 1024),
        ))
    }

    async fn raw_status() -> (StatusCode, &'static str) {
        (StatusCode::UNPROCESSABLE_ENTITY, "Failed to deserialize")
    }

    async fn boom() -> Json<Value> {
        panic!("curriculum table exploded")
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/x", get(not_found))
            .route("/teapot", get(teapot))
            .route("/unexpected", get(unexpected))
            .route("/bad-file", get(bad_file))
            .route("/raw", get(raw_status))
            .route("/boom", get(boom));

        TestServer::new(with_pipeline(app, test_i18n())).unwrap()
    }

    #[tokio::test]
    async fn test_intentional_error_keeps_status_and_message() {
        let response = server().get("/x").await;
        response.assert_status_not_found();

        let body: ErrorResponse = response.json();
        assert_eq!(body.status_code, 404);
        assert_eq!(body.message, ErrorMessage::Single("Not found".to_string()));
        assert_eq!(body.path, "/x");
        assert!(DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
        assert!(body.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_message_list_is_preserved() {
        let response = server().get("/teapot").await;
        response.assert_status(StatusCode::IM_A_TEAPOT);

        let body: Value = response.json();
        assert_eq!(body["message"], serde_json::json!(["first", "second"]));
    }

    #[tokio::test]
    async fn test_unexpected_error_is_500_with_description() {
        let response = server().get("/unexpected").await;
        response.assert_status_internal_server_error();

        let body: ErrorResponse = response.json();
        assert_eq!(body.status_code, 500);
        assert_eq!(
            body.message,
            ErrorMessage::Single("Storage error: connection reset by peer".to_string())
        );
    }

    #[tokio::test]
    async fn test_localized_failure_uses_request_language() {
        let server = server();

        let body: Value = server.get("/bad-file").await.json();
        assert_eq!(
            body["message"],
            "Ukuran file melebihi batas maksimum 1024 byte"
        );

        let body: Value = server
            .get("/bad-file")
            .add_header(
                HeaderName::from_static("accept-language"),
                HeaderValue::from_static("en-US"),
            )
            .await
            .json();
        assert_eq!(
            body["message"],
            "File size exceeds the maximum of 1024 bytes"
        );
    }

    #[tokio::test]
    async fn test_path_includes_query() {
        let body: ErrorResponse = server().get("/x?page=2").await.json();
        assert_eq!(body.path, "/x?page=2");
    }

    #[tokio::test]
    async fn test_unrecognized_failure_uses_body_text() {
        let response = server().get("/raw").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: ErrorResponse = response.json();
        assert_eq!(
            body.message,
            ErrorMessage::Single("Failed to deserialize".to_string())
        );
    }

    #[tokio::test]
    async fn test_unmatched_route_uses_reason_phrase() {
        let response = server().get("/does-not-exist").await;
        response.assert_status_not_found();

        let body: ErrorResponse = response.json();
        assert_eq!(body.message, ErrorMessage::Single("Not Found".to_string()));
        assert_eq!(body.path, "/does-not-exist");
    }

    #[tokio::test]
    async fn test_panic_becomes_500_envelope() {
        let response = server().get("/boom").await;
        response.assert_status_internal_server_error();

        let body: ErrorResponse = response.json();
        assert_eq!(
            body.message,
            ErrorMessage::Single("curriculum table exploded".to_string())
        );
    }
}
