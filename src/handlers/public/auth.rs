use axum::extract::{Json, State};
use axum_extra::extract::{cookie::PrivateCookieJar, WithRejection};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::sheets::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub expires_at: i64,
}

/// POST /auth/login - Check credentials and start a cookie session
///
/// Expected Input:
/// ```json
/// { "username": "sam", "password": "..." }
/// ```
///
/// On success the response carries a `Set-Cookie` for the session and the
/// user record (without the password hash). Unknown users and wrong
/// passwords both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<(PrivateCookieJar, ApiResponse<LoginResponse>), ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error("Username and password are required"));
    }

    let user = state.users.authenticate(&body.username, &body.password).await?;
    let session = state.sessions.start(&user.username, user.role);

    let jar = state.sessions.issue(jar, &session).map_err(|e| {
        tracing::error!("Failed to encode session: {}", e);
        ApiError::internal_server_error("Failed to start session")
    })?;

    Ok((
        jar,
        ApiResponse::success(LoginResponse {
            user,
            expires_at: session.expires_at,
        }),
    ))
}
