/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// UPLOADS
// =============================================================================

/// Default upper bound for a single uploaded file (10 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Content type used when a raw buffer is stored without file metadata
pub const RAW_BUFFER_CONTENT_TYPE: &str = "application/pdf";

/// Object-store folder holding curriculum documents
pub const CURRICULUM_DOCUMENT_FOLDER: &str = "curriculums";

/// Extensions accepted for curriculum documents
pub const CURRICULUM_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];
