//! Anti-forgery checks for mutating admin actions.

use chrono::Utc;
use doccheck_core::error::CoreError;
use doccheck_core::nonce::{create_nonce, verify_nonce, NONCE_ACTION};

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Issue a nonce for the operator.
pub fn issue_nonce(state: &AppState, user: &AuthUser) -> String {
    create_nonce(
        state.config.nonce_secret.as_bytes(),
        &user.username,
        NONCE_ACTION,
        Utc::now(),
        state.config.nonce_lifetime_secs,
    )
}

/// Reject the request unless `nonce` is valid for this operator.
///
/// Called before any other work is done by the handler.
pub fn require_nonce(state: &AppState, user: &AuthUser, nonce: Option<&str>) -> AppResult<()> {
    let valid = nonce.is_some_and(|n| {
        verify_nonce(
            state.config.nonce_secret.as_bytes(),
            n.trim(),
            &user.username,
            NONCE_ACTION,
            Utc::now(),
            state.config.nonce_lifetime_secs,
        )
    });
    if !valid {
        tracing::warn!(user = %user.username, "Rejected request with invalid nonce");
        return Err(AppError::Core(CoreError::Forbidden(
            "Security check failed.".into(),
        )));
    }
    Ok(())
}
