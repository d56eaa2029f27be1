//! Success envelope shared by every API handler.
//!
//! Successful responses are `{ "success": true, "data": ... }`; failures are
//! produced by [`AppError`](crate::error::AppError) with `success: false`.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
