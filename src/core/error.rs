use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::core::i18n::I18n;
use crate::shared::types::ErrorMessage;

/// Catalog key plus the arguments interpolated into it.
///
/// Rendered in the caller's language once the request's language is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedMessage {
    pub key: &'static str,
    pub args: BTreeMap<&'static str, String>,
}

impl LocalizedMessage {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, name: &'static str, value: impl ToString) -> Self {
        self.args.insert(name, value.to_string());
        self
    }
}

impl std::fmt::Display for LocalizedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key)?;
        for (name, value) in &self.args {
            write!(f, " {}={}", name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(ErrorMessage),

    /// Rejected upload (bad extension, oversized file)
    #[error("{0}")]
    InvalidFile(LocalizedMessage),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// Failure raised on purpose with an explicit status
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: ErrorMessage,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// What a failed response wants rendered as its envelope message.
#[derive(Debug, Clone)]
pub enum FailureMessage {
    Plain(ErrorMessage),
    Localized(LocalizedMessage),
}

impl FailureMessage {
    pub fn resolve(&self, i18n: &I18n, lang: &str) -> ErrorMessage {
        match self {
            FailureMessage::Plain(message) => message.clone(),
            FailureMessage::Localized(message) => {
                ErrorMessage::Single(i18n.translate(lang, message.key, &message.args))
            }
        }
    }
}

/// Marker left in the response extensions by every recognized failure
#[derive(Debug, Clone)]
pub struct Failure {
    pub message: FailureMessage,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidFile(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Http { status, .. } => *status,
        }
    }

    fn failure_message(&self) -> FailureMessage {
        match self {
            AppError::Validation(message) => FailureMessage::Plain(message.clone()),
            AppError::Http { message, .. } => FailureMessage::Plain(message.clone()),
            AppError::InvalidFile(message) => FailureMessage::Localized(message.clone()),
            other => FailureMessage::Plain(ErrorMessage::Single(other.to_string())),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let messages = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();

        AppError::Validation(ErrorMessage::Many(messages))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Request failed with {}: {}", status, self);
        }

        let message = self.failure_message();
        let fallback = match &message {
            FailureMessage::Plain(message) => json!(message),
            FailureMessage::Localized(message) => json!(message.key),
        };

        // The exception normalizer replaces this body with the full envelope.
        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": fallback,
        }));

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(Failure { message });
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
