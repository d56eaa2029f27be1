//! Handlers for the `/auth` resource (login, nonce).

use axum::extract::State;
use axum::Json;
use doccheck_core::error::CoreError;
use doccheck_core::nonce::NONCE_ACTION;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::nonce::issue_nonce;
use crate::middleware::rbac::{RequireAdmin, ROLE_ADMIN};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
    pub action: &'static str,
    /// Seconds a nonce stays valid for at least.
    pub lifetime: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate the operator account. Returns an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let admin = &state.config.admin;
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    if input.username != admin.username {
        tracing::warn!(username = %input.username, "Login attempt for unknown user");
        return Err(invalid());
    }

    let password_valid = verify_password(&input.password, &admin.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::warn!(username = %input.username, "Login attempt with wrong password");
        return Err(invalid());
    }

    let access_token = generate_access_token(&admin.username, ROLE_ADMIN, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(username = %admin.username, "Operator logged in");

    Ok(ok(AuthResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            username: admin.username.clone(),
            role: ROLE_ADMIN.to_string(),
        },
    }))
}

/// GET /api/v1/auth/nonce
///
/// Issue an anti-forgery token for the caller's mutating requests.
pub async fn nonce(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
) -> Json<ApiResponse<NonceResponse>> {
    ok(NonceResponse {
        nonce: issue_nonce(&state, &user),
        action: NONCE_ACTION,
        lifetime: state.config.nonce_lifetime_secs,
    })
}
