use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::curriculums::models::Curriculum;
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::CODE_REGEX;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query params for listing curricula
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CurriculumQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Case-insensitive match on code or name
    pub search: Option<String>,
}

impl CurriculumQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCurriculumDto {
    /// Lowercase kebab-case code, unique among active curricula
    #[schema(example = "kurikulum-merdeka")]
    #[validate(
        length(min = 1, max = 100, message = "code must be between 1 and 100 characters"),
        regex(
            path = *CODE_REGEX,
            message = "code must contain lowercase letters, digits and single hyphens only"
        )
    )]
    pub code: String,

    #[schema(example = "Kurikulum Merdeka")]
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: String,

    pub description: Option<String>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCurriculumDto {
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Upload form for Swagger UI only; the handler reads the `file` part itself.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadCurriculumDocumentDto {
    /// PDF, DOC or DOCX document, at most 10 MiB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumResponseDto {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub document_file_name: Option<String>,
    pub document_url: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Curriculum> for CurriculumResponseDto {
    fn from(c: Curriculum) -> Self {
        Self {
            id: c.base.id,
            code: c.code,
            name: c.name,
            description: c.description,
            document_file_name: c.document_file_name,
            document_url: c.document_url,
            created_by: c.base.created_by,
            created_at: c.base.created_at,
            updated_at: c.base.updated_at,
        }
    }
}

/// Compact curriculum entry for the mobile app
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MobileCurriculumDto {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub document_url: Option<String>,
}

impl From<Curriculum> for MobileCurriculumDto {
    fn from(c: Curriculum) -> Self {
        Self {
            id: c.base.id,
            code: c.code,
            name: c.name,
            document_url: c.document_url,
        }
    }
}
