use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{FileUpload, ValidatedJson};
use crate::features::curriculums::dtos::{
    CreateCurriculumDto, CurriculumQueryParams, CurriculumResponseDto, MobileCurriculumDto,
    UpdateCurriculumDto, UploadCurriculumDocumentDto,
};
use crate::features::curriculums::services::CurriculumService;
use crate::shared::types::{ApiResponse, ErrorResponse, Paginated};

/// List active curricula
#[utoipa::path(
    get,
    path = "/curriculums",
    params(CurriculumQueryParams),
    responses(
        (status = 200, description = "Curricula retrieved successfully", body = ApiResponse<Paginated<CurriculumResponseDto>>),
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_curriculums(
    State(service): State<Arc<CurriculumService>>,
    Query(params): Query<CurriculumQueryParams>,
) -> Result<Json<Paginated<CurriculumResponseDto>>> {
    Ok(Json(service.list(&params).await?))
}

/// Get a curriculum by ID
#[utoipa::path(
    get,
    path = "/curriculums/{id}",
    params(
        ("id" = Uuid, Path, description = "Curriculum ID")
    ),
    responses(
        (status = 200, description = "Curriculum retrieved successfully", body = ApiResponse<CurriculumResponseDto>),
        (status = 404, description = "Curriculum not found", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_curriculum(
    State(service): State<Arc<CurriculumService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumResponseDto>> {
    Ok(Json(service.get(id).await?))
}

/// Create a curriculum
#[utoipa::path(
    post,
    path = "/curriculums",
    request_body = CreateCurriculumDto,
    responses(
        (status = 201, description = "Curriculum created successfully", body = ApiResponse<CurriculumResponseDto>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Code already used by an active curriculum", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_curriculum(
    State(service): State<Arc<CurriculumService>>,
    ValidatedJson(dto): ValidatedJson<CreateCurriculumDto>,
) -> Result<(StatusCode, Json<CurriculumResponseDto>)> {
    let curriculum = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(curriculum)))
}

/// Update a curriculum's name or description
#[utoipa::path(
    put,
    path = "/curriculums/{id}",
    params(
        ("id" = Uuid, Path, description = "Curriculum ID")
    ),
    request_body = UpdateCurriculumDto,
    responses(
        (status = 200, description = "Curriculum updated successfully", body = ApiResponse<CurriculumResponseDto>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Curriculum not found", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_curriculum(
    State(service): State<Arc<CurriculumService>>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCurriculumDto>,
) -> Result<Json<CurriculumResponseDto>> {
    Ok(Json(service.update(id, dto).await?))
}

/// Soft delete a curriculum
#[utoipa::path(
    delete,
    path = "/curriculums/{id}",
    params(
        ("id" = Uuid, Path, description = "Curriculum ID")
    ),
    responses(
        (status = 200, description = "Curriculum deleted successfully"),
        (status = 404, description = "Curriculum not found", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_curriculum(
    State(service): State<Arc<CurriculumService>>,
    Path(id): Path<Uuid>,
) -> Result<()> {
    service.delete(id).await
}

/// Upload the curriculum document
///
/// Accepts multipart/form-data with a single `file` part (pdf, doc or docx,
/// at most 10 MiB). The document is stored under the curriculum code.
#[utoipa::path(
    post,
    path = "/curriculums/{id}/document",
    params(
        ("id" = Uuid, Path, description = "Curriculum ID")
    ),
    request_body(
        content = UploadCurriculumDocumentDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Document uploaded successfully", body = ApiResponse<CurriculumResponseDto>),
        (status = 400, description = "Missing file, unsupported format or file too large", body = ErrorResponse),
        (status = 404, description = "Curriculum not found", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_curriculum_document(
    State(service): State<Arc<CurriculumService>>,
    Path(id): Path<Uuid>,
    FileUpload(file): FileUpload,
) -> Result<(StatusCode, Json<CurriculumResponseDto>)> {
    let curriculum = service.upload_document(id, file).await?;
    Ok((StatusCode::CREATED, Json(curriculum)))
}

/// Remove the curriculum document
#[utoipa::path(
    delete,
    path = "/curriculums/{id}/document",
    params(
        ("id" = Uuid, Path, description = "Curriculum ID")
    ),
    responses(
        (status = 200, description = "Document removed successfully", body = ApiResponse<CurriculumResponseDto>),
        (status = 404, description = "Curriculum or document not found", body = ErrorResponse)
    ),
    tag = "curriculums",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_curriculum_document(
    State(service): State<Arc<CurriculumService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumResponseDto>> {
    Ok(Json(service.remove_document(id).await?))
}

/// List active curricula for the mobile app
#[utoipa::path(
    get,
    path = "/mobile/curriculums",
    responses(
        (status = 200, description = "Curricula retrieved successfully", body = ApiResponse<Vec<MobileCurriculumDto>>),
    ),
    tag = "mobile",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_mobile_curriculums(
    State(service): State<Arc<CurriculumService>>,
) -> Result<Json<Vec<MobileCurriculumDto>>> {
    Ok(Json(service.list_mobile().await?))
}
