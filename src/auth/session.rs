use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use crate::config::{SessionConfig, MAX_SESSION_TTL_HOURS};
use crate::types::Role;

/// Session payload, stored as JSON inside the encrypted cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Session {
    /// `ttl_hours` is capped at `MAX_SESSION_TTL_HOURS`.
    pub fn new(username: impl Into<String>, role: Role, ttl_hours: u64) -> Self {
        let now = Utc::now();
        let hours = i64::try_from(ttl_hours.min(MAX_SESSION_TTL_HOURS)).unwrap_or(0);
        let exp = Duration::try_hours(hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now);

        Self {
            username: username.into(),
            role,
            issued_at: now.timestamp(),
            expires_at: exp.timestamp(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Derives the 64-byte cookie key from the configured secret. Without a
/// secret a random key is used, which logs everyone out on restart.
pub fn cookie_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => Key::from(Sha512::digest(secret.as_bytes()).as_slice()),
        None => {
            warn!("SESSION_SECRET not set; generated a random session key");
            Key::generate()
        }
    }
}

/// Cookie settings for issuing and reading sessions
#[derive(Debug, Clone)]
pub struct SessionCookies {
    pub cookie_name: String,
    pub ttl_hours: u64,
    pub secure: bool,
}

impl SessionCookies {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            ttl_hours: config.ttl_hours,
            secure: config.secure_cookie,
        }
    }

    pub fn start(&self, username: &str, role: Role) -> Session {
        Session::new(username, role, self.ttl_hours)
    }

    pub fn issue(&self, jar: PrivateCookieJar, session: &Session) -> Result<PrivateCookieJar, serde_json::Error> {
        let value = serde_json::to_string(session)?;
        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(session.expires_at - session.issued_at));

        Ok(jar.add(cookie))
    }

    /// Decrypted, well-formed and unexpired session, if any. A cookie that
    /// fails decryption is indistinguishable from no cookie.
    pub fn read(&self, jar: &PrivateCookieJar) -> Option<Session> {
        let cookie = jar.get(&self.cookie_name)?;
        let session: Session = match serde_json::from_str(cookie.value()) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding malformed session cookie: {}", e);
                return None;
            }
        };

        if session.is_expired(Utc::now().timestamp()) {
            debug!("Session for '{}' expired", session.username);
            return None;
        }
        Some(session)
    }

    pub fn revoke(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;

    fn cookies() -> SessionCookies {
        SessionCookies {
            cookie_name: "stand_session".to_string(),
            ttl_hours: 8,
            secure: false,
        }
    }

    /// Replays the Set-Cookie output of a jar as the Cookie header of a new
    /// request, decrypted with `key`.
    fn replay(jar: PrivateCookieJar, key: &Key) -> PrivateCookieJar {
        let response = jar.into_response();
        let mut headers = HeaderMap::new();
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
            headers.append(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        }
        PrivateCookieJar::from_headers(&headers, key.clone())
    }

    #[test]
    fn issued_session_reads_back() {
        let key = cookie_key(Some("a long and unguessable session secret"));
        let cookies = cookies();
        let session = cookies.start("sam", Role::Staff);

        let jar = cookies.issue(PrivateCookieJar::new(key.clone()), &session).unwrap();
        let replayed = replay(jar, &key);
        assert_eq!(cookies.read(&replayed), Some(session));
    }

    #[test]
    fn other_key_cannot_read_session() {
        let key = cookie_key(Some("first secret"));
        let cookies = cookies();
        let session = cookies.start("sam", Role::Admin);

        let jar = cookies.issue(PrivateCookieJar::new(key), &session).unwrap();
        let replayed = replay(jar, &cookie_key(Some("second secret")));
        assert_eq!(cookies.read(&replayed), None);
    }

    #[test]
    fn expired_session_is_ignored() {
        let key = cookie_key(Some("secret"));
        let cookies = cookies();
        let mut session = cookies.start("sam", Role::Staff);
        session.expires_at = Utc::now().timestamp() - 1;

        let jar = cookies.issue(PrivateCookieJar::new(key.clone()), &session).unwrap();
        assert_eq!(cookies.read(&replay(jar, &key)), None);
    }

    #[test]
    fn expiry_is_inclusive() {
        let session = Session {
            username: "sam".to_string(),
            role: Role::Staff,
            issued_at: 0,
            expires_at: 100,
        };
        assert!(!session.is_expired(99));
        assert!(session.is_expired(100));
    }

    #[test]
    fn oversized_ttl_is_capped() {
        for hours in [1 << 50, u64::MAX] {
            let session = Session::new("sam", Role::Staff, hours);
            assert!(!session.is_expired(Utc::now().timestamp()));
            assert_eq!(
                session.expires_at - session.issued_at,
                i64::try_from(MAX_SESSION_TTL_HOURS * 3600).unwrap()
            );
        }
    }

    #[test]
    fn derived_keys_are_stable() {
        let a = cookie_key(Some("correct horse battery staple"));
        let b = cookie_key(Some("correct horse battery staple"));
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), cookie_key(Some("other")).master());
    }
}
