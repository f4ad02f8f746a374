use axum::extract::{Json, State};
use axum_extra::extract::{cookie::PrivateCookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::ServiceError;
use crate::sheets::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    pub expires_at: i64,
}

/// GET /api/auth/whoami - Current user, read fresh from the Users tab
///
/// A session whose user has since been deleted answers 401.
pub async fn whoami(State(state): State<AppState>, session: SessionUser) -> ApiResult<WhoAmI> {
    let user = match state.users.get(&session.username).await {
        Ok(user) => user,
        Err(ServiceError::NotFound(_)) => return Err(ApiError::unauthorized("Login required")),
        Err(e) => return Err(e.into()),
    };

    Ok(ApiResponse::success(WhoAmI {
        user,
        expires_at: session.expires_at,
    }))
}

/// POST /api/auth/logout - Expire the session cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    session: SessionUser,
) -> (PrivateCookieJar, ApiResponse<Value>) {
    tracing::info!("'{}' logged out", session.username);
    (state.sessions.revoke(jar), ApiResponse::success(json!({ "logged_out": true })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// PUT /api/auth/password - Change own password
///
/// Expected Input:
/// ```json
/// { "old_password": "...", "new_password": "..." }
/// ```
pub async fn change_password(
    State(state): State<AppState>,
    session: SessionUser,
    WithRejection(Json(body), _): WithRejection<Json<PasswordChange>, ApiError>,
) -> ApiResult<Value> {
    state
        .users
        .change_password(&session.username, &body.old_password, &body.new_password)
        .await?;

    Ok(ApiResponse::success(json!({ "updated": true })))
}
