// handlers/auth.rs - token acquisition and introspection

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{LoginRequest, LoginResponse};

/// POST /auth/login - Exchange employee credentials for a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "a@acme.com", "password": "password123" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "message": "Login successful", "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// Wrong password and unknown email both answer 401 "invalid email or password".
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state.bounded(state.auth.login(&request)).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
    }))
}

/// GET /api/auth/whoami - Identity carried by the caller's token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": user.employee_id,
        "tenant_id": user.tenant_id,
        "email": user.email,
        "role": user.role,
        "expires_at": user.expires_at,
    })))
}
