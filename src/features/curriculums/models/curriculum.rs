use sqlx::FromRow;

use crate::shared::base_entity::{BaseEntity, BASE_COLUMNS};

/// Database model for curriculum
#[derive(Debug, Clone, FromRow)]
pub struct Curriculum {
    #[sqlx(flatten)]
    pub base: BaseEntity,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub document_file_name: Option<String>,
    pub document_url: Option<String>,
}

impl Curriculum {
    /// Column list for `SELECT`/`RETURNING` clauses
    pub fn columns() -> String {
        format!(
            "{}, code, name, description, document_file_name, document_url",
            BASE_COLUMNS
        )
    }
}
