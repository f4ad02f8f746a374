use axum::extract::{Json, Path, State};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiResponse, ApiResult};
use crate::services::{NewUser, UserUpdate};
use crate::sheets::User;
use crate::state::AppState;

/// GET /api/users
pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.users.list().await?))
}

/// POST /api/users - Create a staff or admin account
///
/// Expected Input:
/// ```json
/// { "username": "sam", "password": "...", "role": "staff", "display_name": "Sam" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Json(body), _): WithRejection<Json<NewUser>, ApiError>,
) -> ApiResult<User> {
    let user = state.users.create(body).await?;
    tracing::info!("'{}' created user '{}' ({})", admin.username, user.username, user.role);
    Ok(ApiResponse::created(user))
}

/// GET /api/users/:username
pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.get(&username).await?))
}

/// PUT /api/users/:username - Change role, display name or reset the password
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(body), _): WithRejection<Json<UserUpdate>, ApiError>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.update(&username, body).await?))
}

/// DELETE /api/users/:username - The last admin cannot be deleted
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Value> {
    state.users.delete(&username).await?;
    Ok(ApiResponse::success(json!({ "deleted": username })))
}
