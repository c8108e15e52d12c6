use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, FromRequest, Multipart, Request,
    },
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, LocalizedMessage};
use crate::modules::storage::RawUpload;
use crate::shared::constants::DEFAULT_MAX_UPLOAD_SIZE;

/// JSON body that has been deserialized and passed `validator` checks.
///
/// Malformed bodies become a 400 `BadRequest`, failed field rules a 400
/// carrying every validation message.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;

        value.validate()?;
        Ok(Self(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
        JsonRejection::MissingJsonContentType(err) => {
            format!("Missing JSON content type: {}", err)
        }
        _ => "Failed to parse JSON body".to_string(),
    };

    AppError::BadRequest(message)
}

/// The `file` part of a multipart/form-data request.
///
/// Other parts are ignored. Size and extension checks are left to the
/// storage adapter.
pub struct FileUpload(pub RawUpload);

impl<S> FromRequest<S> for FileUpload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "Failed to read multipart data"))?
        {
            if field.name() != Some("file") {
                debug!("Ignoring multipart field: {:?}", field.name());
                continue;
            }

            let mime_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let original_filename = field
                .file_name()
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty());

            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, "Failed to read file data"))?;

            return Ok(Self(RawUpload {
                original_filename,
                mime_type,
                size: data.len() as u64,
                data,
            }));
        }

        Err(AppError::BadRequest("File is required".to_string()))
    }
}

/// A body cut off by the route's length limit is an oversized file, reported
/// with the same message the storage adapter uses
fn multipart_error(err: MultipartError, context: &str) -> AppError {
    debug!("{}: {}", context, err);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::InvalidFile(
            LocalizedMessage::new("general.FILE_VALIDATION_MAX")
                .arg("maximum", DEFAULT_MAX_UPLOAD_SIZE),
        );
    }
    AppError::BadRequest(format!("{}: {}", context, err.body_text()))
}
