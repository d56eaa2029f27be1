//! Handlers for single-item checks, collection pages and check history.

use axum::extract::State;
use axum::{Form, Json};
use doccheck_core::check::{BatchSummary, CheckResult, CheckStatus};
use doccheck_core::types::DbId;
use doccheck_db::models::document_check::DocumentCheck;
use doccheck_notify::BatchNotifyStats;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::form::{absint, flag, optional_int};
use crate::middleware::nonce::require_nonce;
use crate::middleware::rbac::RequireAdmin;
use crate::render;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CheckItemForm {
    pub nonce: Option<String>,
    pub item_id: Option<String>,
    pub send_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckCollectionForm {
    pub nonce: Option<String>,
    pub collection_id: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    /// Older admin screens post the singular spelling.
    #[serde(alias = "send_email")]
    pub send_emails: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryForm {
    pub nonce: Option<String>,
    pub item_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Per-list counts of a single check.
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub total_attachments: usize,
    pub found_documents: usize,
    pub missing_documents: usize,
    pub invalid_documents: usize,
}

#[derive(Debug, Serialize)]
pub struct ItemCheckResponse {
    pub status: CheckStatus,
    pub item_id: DbId,
    pub html: String,
    pub summary: ItemSummary,
    pub attachment_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CollectionCheckResponse {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_more: bool,
    pub summary: BatchSummary,
    pub html: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_stats: Option<BatchNotifyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub html: String,
    pub history: Vec<DocumentCheck>,
}

fn item_response(result: CheckResult, email_enabled: bool) -> ItemCheckResponse {
    ItemCheckResponse {
        status: result.status,
        item_id: result.item_id,
        html: render::single_result(&result, email_enabled),
        summary: ItemSummary {
            total_attachments: result.total_attachments,
            found_documents: result.found_documents.len(),
            missing_documents: result.missing_documents.len(),
            invalid_documents: result.invalid_documents.len(),
        },
        attachment_files: result.attachment_files,
        email_sent: None,
        email_message: None,
        debug: result.debug,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/checks/item
///
/// Check one item. A failed attachment fetch is reported as an error
/// envelope carrying the remote message.
pub async fn check_item(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<CheckItemForm>,
) -> AppResult<Json<ApiResponse<ItemCheckResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let item_id = absint(form.item_id.as_deref());
    let send_email = flag(form.send_email.as_deref());
    let settings = state.settings.load().await?;

    let result = state.checker.check_item(item_id, &settings).await?;
    if result.status == CheckStatus::Error {
        return Err(AppError::Remote(
            result
                .message
                .unwrap_or_else(|| "Failed to fetch item attachments.".into()),
        ));
    }

    let notify = send_email && settings.email_enabled && result.status == CheckStatus::Incomplete;
    let outcome = if notify {
        Some(state.notifier.send_single(&result, &settings).await)
    } else {
        None
    };

    let mut response = item_response(result, settings.email_enabled);
    if let Some(outcome) = outcome {
        response.email_sent = Some(outcome.is_sent());
        response.email_message = Some(outcome.message());
    }

    Ok(ok(response))
}

/// POST /api/v1/checks/collection
///
/// Check one page of a collection. With `send_emails` set, the owners of
/// that page's incomplete items get one grouped message each, so paging
/// through the whole collection notifies every item once.
pub async fn check_collection(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<CheckCollectionForm>,
) -> AppResult<Json<ApiResponse<CollectionCheckResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let collection_id = Some(absint(form.collection_id.as_deref())).filter(|&c| c > 0);
    let page = optional_int(form.page.as_deref());
    let per_page = optional_int(form.per_page.as_deref());
    let send_emails = flag(form.send_emails.as_deref());
    let settings = state.settings.load().await?;

    if settings.debug_mode {
        tracing::info!(
            ?collection_id,
            ?page,
            ?per_page,
            send_emails,
            "Batch check request"
        );
    }

    let result = state
        .checker
        .check_collection(collection_id, page, per_page, &settings)
        .await?;

    let mut response = CollectionCheckResponse {
        page: result.page,
        total_pages: result.total_pages,
        total_items: result.total_items,
        has_more: result.has_more(),
        summary: result.summary,
        html: render::batch_result(&result),
        progress: result.progress(),
        email_stats: None,
        email_message: None,
    };

    if send_emails && settings.email_enabled {
        let stats = state
            .notifier
            .send_batch(&result.items_checked, Some(result.collection_id), &settings)
            .await;
        response.email_message = Some(format!(
            "Email notifications: {} sent, {} failed.",
            stats.emails_sent, stats.emails_failed
        ));
        response.email_stats = Some(stats);
    }

    Ok(ok(response))
}

/// POST /api/v1/checks/history
pub async fn history(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<HistoryForm>,
) -> AppResult<Json<ApiResponse<HistoryResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let item_id = absint(form.item_id.as_deref());
    let history = state.checker.item_history(item_id, None).await?;

    Ok(ok(HistoryResponse {
        count: history.len(),
        html: render::history(&history),
        history,
    }))
}
