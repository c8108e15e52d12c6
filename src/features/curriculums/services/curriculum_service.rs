use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::curriculums::dtos::{
    CreateCurriculumDto, CurriculumQueryParams, CurriculumResponseDto, MobileCurriculumDto,
    UpdateCurriculumDto,
};
use crate::features::curriculums::models::Curriculum;
use crate::modules::storage::{RawUpload, StorageService, UploadOptions, UploadSource};
use crate::shared::base_entity::ACTIVE_FILTER;
use crate::shared::constants::{
    CURRICULUM_DOCUMENT_EXTENSIONS, CURRICULUM_DOCUMENT_FOLDER, DEFAULT_MAX_UPLOAD_SIZE,
};
use crate::shared::types::Paginated;

/// Map unique violations on the active-code index to a conflict
fn handle_db_error(e: sqlx::Error, code: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("Curriculum with code '{}' already exists", code));
        }
    }

    AppError::Database(e)
}

/// `ILIKE` pattern for a search term; blank terms disable the filter
fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Curriculum with id {} not found", id))
}

pub struct CurriculumService {
    pool: PgPool,
    storage: Arc<StorageService>,
}

impl CurriculumService {
    pub fn new(pool: PgPool, storage: Arc<StorageService>) -> Self {
        Self { pool, storage }
    }

    /// List active curricula, newest first
    pub async fn list(
        &self,
        params: &CurriculumQueryParams,
    ) -> Result<Paginated<CurriculumResponseDto>> {
        let pagination = params.pagination();
        let pattern = search_pattern(params.search.as_deref());

        let where_clause = if pattern.is_some() {
            format!("WHERE {} AND (code ILIKE $1 OR name ILIKE $1)", ACTIVE_FILTER)
        } else {
            format!("WHERE {}", ACTIVE_FILTER)
        };
        let (limit_param, offset_param) = if pattern.is_some() {
            ("$2", "$3")
        } else {
            ("$1", "$2")
        };

        let count_query = format!("SELECT COUNT(*) FROM curriculums {}", where_clause);
        let query = format!(
            "SELECT {} FROM curriculums {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            Curriculum::columns(),
            where_clause,
            limit_param,
            offset_param
        );

        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        let mut select = sqlx::query_as::<_, Curriculum>(&query);
        if let Some(pattern) = &pattern {
            count = count.bind(pattern);
            select = select.bind(pattern);
        }

        let total = count.fetch_one(&self.pool).await?;
        let curricula = select
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list curriculums: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(pagination.paginate(
            curricula.into_iter().map(CurriculumResponseDto::from).collect(),
            total,
        ))
    }

    pub async fn get(&self, id: Uuid) -> Result<CurriculumResponseDto> {
        Ok(self.find_active(id).await?.into())
    }

    pub async fn create(&self, dto: CreateCurriculumDto) -> Result<CurriculumResponseDto> {
        let query = format!(
            r#"
            INSERT INTO curriculums (code, name, description)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            Curriculum::columns()
        );

        let curriculum = sqlx::query_as::<_, Curriculum>(&query)
            .bind(&dto.code)
            .bind(&dto.name)
            .bind(&dto.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, &dto.code))?;

        info!("Created curriculum '{}' ({})", curriculum.code, curriculum.base.id);
        Ok(curriculum.into())
    }

    pub async fn update(&self, id: Uuid, dto: UpdateCurriculumDto) -> Result<CurriculumResponseDto> {
        let query = format!(
            r#"
            UPDATE curriculums
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3 AND {}
            RETURNING {}
            "#,
            ACTIVE_FILTER,
            Curriculum::columns()
        );

        let curriculum = sqlx::query_as::<_, Curriculum>(&query)
            .bind(&dto.name)
            .bind(&dto.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;

        Ok(curriculum.into())
    }

    /// Soft delete; the stored document is kept
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let query = format!(
            "UPDATE curriculums SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND {}",
            ACTIVE_FILTER
        );

        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        info!("Soft-deleted curriculum {}", id);
        Ok(())
    }

    /// Store the document under the curriculum code and record its URL.
    ///
    /// A previous document with a different file name (other extension) is
    /// removed afterwards.
    pub async fn upload_document(&self, id: Uuid, file: RawUpload) -> Result<CurriculumResponseDto> {
        let curriculum = self.find_active(id).await?;

        let options = UploadOptions::new(CURRICULUM_DOCUMENT_EXTENSIONS)
            .custom_name(&curriculum.code)
            .max_size(DEFAULT_MAX_UPLOAD_SIZE);
        let descriptor = self
            .storage
            .upload(UploadSource::File(file), CURRICULUM_DOCUMENT_FOLDER, options)
            .await?;

        let updated = self
            .set_document(id, Some(&descriptor.file_name), Some(&descriptor.file_url))
            .await?;

        if let Some(previous) = curriculum.document_file_name.as_deref() {
            if previous != descriptor.file_name {
                if let Err(e) = self.storage.delete(CURRICULUM_DOCUMENT_FOLDER, previous).await {
                    warn!("Failed to remove previous document '{}': {}", previous, e);
                }
            }
        }

        Ok(updated.into())
    }

    pub async fn remove_document(&self, id: Uuid) -> Result<CurriculumResponseDto> {
        let curriculum = self.find_active(id).await?;
        let file_name = curriculum.document_file_name.as_deref().ok_or_else(|| {
            AppError::NotFound(format!("Curriculum with id {} has no document", id))
        })?;

        self.storage
            .delete(CURRICULUM_DOCUMENT_FOLDER, file_name)
            .await?;

        Ok(self.set_document(id, None, None).await?.into())
    }

    /// Every active curriculum, ordered by name
    pub async fn list_mobile(&self) -> Result<Vec<MobileCurriculumDto>> {
        let query = format!(
            "SELECT {} FROM curriculums WHERE {} ORDER BY name",
            Curriculum::columns(),
            ACTIVE_FILTER
        );

        let curricula = sqlx::query_as::<_, Curriculum>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(curricula.into_iter().map(MobileCurriculumDto::from).collect())
    }

    async fn find_active(&self, id: Uuid) -> Result<Curriculum> {
        let query = format!(
            "SELECT {} FROM curriculums WHERE id = $1 AND {}",
            Curriculum::columns(),
            ACTIVE_FILTER
        );

        sqlx::query_as::<_, Curriculum>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn set_document(
        &self,
        id: Uuid,
        file_name: Option<&str>,
        url: Option<&str>,
    ) -> Result<Curriculum> {
        let query = format!(
            r#"
            UPDATE curriculums
            SET document_file_name = $1, document_url = $2, updated_at = NOW()
            WHERE id = $3 AND {}
            RETURNING {}
            "#,
            ACTIVE_FILTER,
            Curriculum::columns()
        );

        sqlx::query_as::<_, Curriculum>(&query)
            .bind(file_name)
            .bind(url)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryObjectStore;
    use crate::shared::test_helpers::test_s3_config;
    use axum::body::Bytes;

    #[test]
    fn test_search_pattern_wraps_term() {
        assert_eq!(
            search_pattern(Some("  merdeka ")),
            Some("%merdeka%".to_string())
        );
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(
            search_pattern(Some("100%_a\\b")),
            Some("%100\\%\\_a\\\\b%".to_string())
        );
    }

    #[test]
    fn test_blank_search_disables_filter() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
    }

    #[test]
    fn test_non_database_errors_stay_database_errors() {
        let error = handle_db_error(sqlx::Error::RowNotFound, "k13");
        assert!(matches!(error, AppError::Database(_)));
    }

    fn service(pool: PgPool) -> (Arc<MemoryObjectStore>, CurriculumService) {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = Arc::new(StorageService::new(store.clone(), &test_s3_config("test")));
        (store, CurriculumService::new(pool, storage))
    }

    fn create_dto(code: &str) -> CreateCurriculumDto {
        CreateCurriculumDto {
            code: code.to_string(),
            name: format!("Kurikulum {}", code),
            description: None,
        }
    }

    fn document(name: &str, mime: &str) -> RawUpload {
        let data = Bytes::from_static(b"%PDF-1.7");
        RawUpload {
            original_filename: Some(name.to_string()),
            mime_type: mime.to_string(),
            size: data.len() as u64,
            data,
        }
    }

    fn all_pages() -> CurriculumQueryParams {
        CurriculumQueryParams {
            page: 1,
            page_size: 100,
            search: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_soft_deleted_curriculum_is_hidden(pool: PgPool) {
        let (_, service) = service(pool);
        let kept = service.create(create_dto("merdeka")).await.unwrap();
        let deleted = service.create(create_dto("k13")).await.unwrap();

        service.delete(deleted.id).await.unwrap();

        assert!(matches!(
            service.get(deleted.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(deleted.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update(
                    deleted.id,
                    UpdateCurriculumDto {
                        name: Some("Baru".to_string()),
                        description: None,
                    },
                )
                .await,
            Err(AppError::NotFound(_))
        ));

        let page = service.list(&all_pages()).await.unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, kept.id);

        let mobile = service.list_mobile().await.unwrap();
        assert_eq!(mobile.len(), 1);
        assert_eq!(mobile[0].code, "merdeka");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_active_code_conflicts_until_deleted(pool: PgPool) {
        let (_, service) = service(pool);
        let first = service.create(create_dto("k13")).await.unwrap();

        let duplicate = service.create(create_dto("k13")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(msg)) if msg.contains("'k13'")));

        service.delete(first.id).await.unwrap();

        let reused = service.create(create_dto("k13")).await.unwrap();
        assert_ne!(reused.id, first.id);
        assert_eq!(reused.code, "k13");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_filters_by_search_and_paginates(pool: PgPool) {
        let (_, service) = service(pool);
        for code in ["merdeka-sd", "merdeka-smp", "k13"] {
            service.create(create_dto(code)).await.unwrap();
        }

        let page = service
            .list(&CurriculumQueryParams {
                page: 2,
                page_size: 1,
                search: Some("MERDEKA".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(page.meta.total, 2);
        assert_eq!(page.meta.page, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].code.starts_with("merdeka"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_new_extension_replaces_previous_document(pool: PgPool) {
        let (store, service) = service(pool);
        let curriculum = service.create(create_dto("k13")).await.unwrap();

        let first = service
            .upload_document(curriculum.id, document("Silabus.pdf", "application/pdf"))
            .await
            .unwrap();
        assert_eq!(first.document_file_name.as_deref(), Some("k13.pdf"));
        assert_eq!(store.keys().await, vec!["test/curriculums/k13.pdf".to_string()]);

        let second = service
            .upload_document(
                curriculum.id,
                document(
                    "Silabus Revisi.docx",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                ),
            )
            .await
            .unwrap();

        assert_eq!(second.document_file_name.as_deref(), Some("k13.docx"));
        assert_eq!(
            second.document_url.as_deref(),
            Some("https://bpk-test.s3.ap-southeast-1.amazonaws.com/test/curriculums/k13.docx")
        );
        assert_eq!(store.keys().await, vec!["test/curriculums/k13.docx".to_string()]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_rejected_document_leaves_record_untouched(pool: PgPool) {
        let (store, service) = service(pool);
        let curriculum = service.create(create_dto("k13")).await.unwrap();

        let result = service
            .upload_document(curriculum.id, document("silabus.exe", "application/octet-stream"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidFile(_))));
        assert!(store.keys().await.is_empty());
        let unchanged = service.get(curriculum.id).await.unwrap();
        assert!(unchanged.document_file_name.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_remove_document_clears_fields(pool: PgPool) {
        let (store, service) = service(pool);
        let curriculum = service.create(create_dto("k13")).await.unwrap();
        service
            .upload_document(curriculum.id, document("silabus.pdf", "application/pdf"))
            .await
            .unwrap();

        let cleared = service.remove_document(curriculum.id).await.unwrap();

        assert!(cleared.document_file_name.is_none());
        assert!(cleared.document_url.is_none());
        assert!(store.keys().await.is_empty());
        assert!(matches!(
            service.remove_document(curriculum.id).await,
            Err(AppError::NotFound(msg)) if msg.contains("has no document")
        ));
    }
}
