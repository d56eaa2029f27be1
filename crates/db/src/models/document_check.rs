//! History rows for single-item checks.

use doccheck_core::check::{CheckResult, CheckStatus};
use doccheck_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A persisted check. Document lists are stored as JSON arrays.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentCheck {
    pub id: DbId,
    pub item_id: DbId,
    pub collection_id: Option<DbId>,
    pub check_type: String,
    pub status: String,
    pub missing_documents: Json<Vec<String>>,
    pub found_documents: Json<Vec<String>>,
    pub invalid_documents: Json<Vec<String>>,
    pub check_date: Timestamp,
}

impl DocumentCheck {
    /// Parsed status, `None` if the column holds an unknown value.
    pub fn check_status(&self) -> Option<CheckStatus> {
        CheckStatus::from_str_value(&self.status).ok()
    }
}

/// DTO for inserting a history row.
#[derive(Debug, Clone)]
pub struct CreateDocumentCheck {
    pub item_id: DbId,
    pub collection_id: Option<DbId>,
    pub check_type: &'static str,
    pub status: CheckStatus,
    pub missing_documents: Vec<String>,
    pub found_documents: Vec<String>,
    pub invalid_documents: Vec<String>,
    pub check_date: Timestamp,
}

impl CreateDocumentCheck {
    pub fn from_result(
        result: &CheckResult,
        collection_id: Option<DbId>,
        check_type: &'static str,
    ) -> Self {
        Self {
            item_id: result.item_id,
            collection_id,
            check_type,
            status: result.status,
            missing_documents: result.missing_documents.clone(),
            found_documents: result.found_documents.clone(),
            invalid_documents: result.invalid_documents.clone(),
            check_date: result.check_date,
        }
    }
}
