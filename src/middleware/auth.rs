use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Serialize;

use crate::error::ApiError;
use crate::services::ServiceError;
use crate::state::AppState;
use crate::types::Role;

/// Caller identity: a valid session cookie whose user still exists, with the
/// role currently stored for that user
#[derive(Clone, Debug, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
    pub expires_at: i64,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let session = state
            .sessions
            .read(&jar)
            .ok_or_else(|| ApiError::unauthorized("Login required"))?;

        // The cookie only proves who logged in; the Users tab decides the role
        let user = match state.users.get(&session.username).await {
            Ok(user) => user,
            Err(ServiceError::NotFound(_)) => {
                tracing::warn!("Session for removed user '{}' rejected", session.username);
                return Err(ApiError::unauthorized("Login required"));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            username: user.username,
            role: user.role,
            expires_at: session.expires_at,
        })
    }
}

/// A `SessionUser` holding the admin role
#[derive(Clone, Debug)]
pub struct AdminUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = SessionUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!("'{}' denied access to {}", user.username, parts.uri.path());
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(Self(user))
    }
}
