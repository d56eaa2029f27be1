//! Public document status of an item.

use axum::extract::{Path, State};
use axum::Json;
use doccheck_core::error::CoreError;
use doccheck_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::render;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub item_id: DbId,
    pub status: String,
    pub found_documents: Vec<String>,
    pub missing_documents: Vec<String>,
    pub invalid_documents: Vec<String>,
    pub check_date: Timestamp,
    pub html: String,
}

/// GET /api/v1/status/{item_id}
///
/// Latest recorded check for an item. Never triggers a new check.
pub async fn item_status(
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
) -> AppResult<Json<ApiResponse<StatusResponse>>> {
    let record = state
        .checker
        .latest_check(item_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "document check",
            id: item_id,
        }))?;

    let html = render::doc_status(&record);
    Ok(ok(StatusResponse {
        item_id: record.item_id,
        status: record.status,
        found_documents: record.found_documents.0,
        missing_documents: record.missing_documents.0,
        invalid_documents: record.invalid_documents.0,
        check_date: record.check_date,
        html,
    }))
}
