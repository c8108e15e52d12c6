//! Success-path response normalization.
//!
//! Every successful JSON (or empty) handler result leaves the API wrapped as
//! `{statusCode, message, data}`. The message comes from the handler's declared
//! [`ResponseIntent`] when there is one, otherwise from the HTTP method.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::core::error::AppError;
use crate::core::i18n::I18n;
use crate::shared::types::ApiResponse;

/// Explicit success intent declared by a handler.
///
/// Returned as part of the handler's response, e.g.
/// `(Extension(ResponseIntent::Login), Json(tokens))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ResponseIntent {
    Login,
    Register,
}

/// Catalog key of the success message for a request
pub fn success_message_key(intent: Option<ResponseIntent>, method: &Method) -> &'static str {
    match intent {
        Some(ResponseIntent::Login) => "general.LOGIN_SUCCESS",
        Some(ResponseIntent::Register) => "general.REGISTER_SUCCESS",
        None => match *method {
            Method::GET => "general.SUCCESS_GET",
            Method::POST => "general.SUCCESS_POST",
            Method::PUT | Method::PATCH => "general.SUCCESS_PUT",
            Method::DELETE => "general.SUCCESS_DELETE",
            _ => "general.SUCCESS",
        },
    }
}

pub async fn normalize_response(
    State(i18n): State<Arc<I18n>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let lang = i18n.resolve_language(req.uri(), req.headers());

    let response = next.run(req).await;
    if !is_wrappable(&response) {
        return response;
    }

    let intent = response.extensions().get::<ResponseIntent>().copied();
    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::Internal(format!("Failed to read response body: {}", e))
                .into_response();
        }
    };

    let data = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(data) => data,
            // Labelled as JSON but isn't; leave it alone
            Err(_) => return Response::from_parts(parts, Body::from(bytes)),
        }
    };

    let envelope = ApiResponse {
        status_code: parts.status.as_u16(),
        message: i18n.t(&lang, success_message_key(intent, &method)),
        data,
    };

    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(e) => {
            return AppError::Internal(format!("Failed to encode response: {}", e))
                .into_response();
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(body))
}

/// Successful responses carrying JSON or nothing at all
fn is_wrappable(response: &Response) -> bool {
    let status = response.status();
    if !status.is_success() || status == StatusCode::NO_CONTENT {
        return false;
    }

    match response.headers().get(header::CONTENT_TYPE) {
        None => true,
        Some(content_type) => content_type
            .to_str()
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false),
    }
}
