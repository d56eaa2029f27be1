//! Handlers for owner notifications and the email log.

use axum::extract::{Query, State};
use axum::{Form, Json};
use doccheck_core::error::CoreError;
use doccheck_db::models::email_log::{EmailLog, EmailLogQuery, EmailStats, DEFAULT_LOG_LIMIT};
use doccheck_notify::notifier::DEFAULT_STATS_DAYS;
use doccheck_notify::BatchNotifyStats;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::form::{absint, id_list, optional_int};
use crate::middleware::nonce::require_nonce;
use crate::middleware::rbac::RequireAdmin;
use crate::render;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

/// Page size used when walking a whole collection for notifications.
const NOTIFY_PAGE_SIZE: i64 = 100;

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendForm {
    pub nonce: Option<String>,
    pub collection_id: Option<String>,
    /// Comma separated item ids.
    pub item_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailForm {
    pub nonce: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogsForm {
    pub nonce: Option<String>,
    pub user_id: Option<String>,
    pub item_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub stats: BatchNotifyStats,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub html: String,
    pub logs: Vec<EmailLog>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/send
///
/// With a collection every page is checked and owners get one grouped
/// message each. With item ids each item is checked and notified on its own.
pub async fn send(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<SendForm>,
) -> AppResult<Json<ApiResponse<SendResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let settings = state.settings.load().await?;
    if !settings.email_enabled {
        return Err(AppError::BadRequest(
            "Email notifications are not enabled.".into(),
        ));
    }

    let collection_id = absint(form.collection_id.as_deref());
    let item_ids = id_list(form.item_ids.as_deref());
    if collection_id == 0 && item_ids.is_empty() {
        return Err(AppError::BadRequest(
            "Please specify either a collection ID or item IDs.".into(),
        ));
    }

    let stats = if collection_id > 0 {
        let pages = state
            .checker
            .check_whole_collection(Some(collection_id), Some(NOTIFY_PAGE_SIZE), &settings)
            .await?;
        let items: Vec<_> = pages.into_iter().flat_map(|p| p.items_checked).collect();
        state
            .notifier
            .send_batch(&items, Some(collection_id), &settings)
            .await
    } else {
        let mut results = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            results.push(state.checker.check_item(item_id, &settings).await?);
        }
        state.notifier.send_each(&results, &settings).await
    };

    let message = format!(
        "Email notifications sent: {} successful, {} failed. {} users notified.",
        stats.emails_sent,
        stats.emails_failed,
        stats.users_notified.len()
    );
    tracing::info!(
        sent = stats.emails_sent,
        failed = stats.emails_failed,
        users = stats.users_notified.len(),
        "Notification run finished"
    );

    Ok(ok(SendResponse { stats, message }))
}

/// POST /api/v1/notifications/test
pub async fn test_email(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<TestEmailForm>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let settings = state.settings.load().await?;
    let to = form.email.unwrap_or_default();
    state.notifier.send_test(&to, &settings).await?;

    Ok(ok(MessageResponse {
        message: "Test email sent successfully.".into(),
    }))
}

/// POST /api/v1/notifications/logs
pub async fn logs(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<LogsForm>,
) -> AppResult<Json<ApiResponse<LogsResponse>>> {
    require_nonce(&state, &user, form.nonce.as_deref())?;

    let positive = |v: Option<String>| Some(absint(v.as_deref())).filter(|&id| id > 0);
    let query = EmailLogQuery {
        user_id: positive(form.user_id),
        item_id: positive(form.item_id),
        status: form
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        limit: Some(
            optional_int(form.limit.as_deref())
                .map(i64::abs)
                .unwrap_or(DEFAULT_LOG_LIMIT),
        ),
        offset: optional_int(form.offset.as_deref()).map(i64::abs),
    };

    let logs = state.notifier.email_logs(&query).await?;
    Ok(ok(LogsResponse {
        html: render::email_logs(&logs),
        logs,
    }))
}

/// GET /api/v1/notifications/stats?days=30
pub async fn stats(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> AppResult<Json<ApiResponse<EmailStats>>> {
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    if days < 1 {
        return Err(AppError::Core(CoreError::Validation(
            "days must be at least 1".into(),
        )));
    }
    Ok(ok(state.notifier.email_stats(days).await?))
}
