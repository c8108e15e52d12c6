//! Persisted shape shared by every table: identity, audit columns and the
//! soft-delete lifecycle.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// Columns every base record selects, in table order
pub const BASE_COLUMNS: &str = "id, created_by, created_at, updated_at, deleted_at";

/// Filter keeping records that were not soft-deleted
pub const ACTIVE_FILTER: &str = "deleted_at IS NULL";

/// Whether a record is live or soft-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLifecycle {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl RecordLifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => RecordLifecycle::Deleted { at },
            None => RecordLifecycle::Active,
        }
    }

    #[allow(dead_code)]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordLifecycle::Active => None,
            RecordLifecycle::Deleted { at } => Some(*at),
        }
    }

    #[allow(dead_code)]
    pub fn is_active(&self) -> bool {
        matches!(self, RecordLifecycle::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEntity {
    pub id: Uuid,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[allow(dead_code)]
    pub lifecycle: RecordLifecycle,
}

impl<'r> FromRow<'r, PgRow> for BaseEntity {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            lifecycle: RecordLifecycle::from_deleted_at(row.try_get("deleted_at")?),
        })
    }
}
