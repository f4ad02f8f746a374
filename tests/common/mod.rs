#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Method, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;

use coffee_stand::config::AppConfig;
use coffee_stand::server;
use coffee_stand::sheets::MemoryStore;
use coffee_stand::state::AppState;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "initial-admin-password";

/// A server running in-process over its own in-memory spreadsheet
pub struct TestServer {
    pub base_url: String,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let mut config = AppConfig::development();
        config.session.secret = Some("integration-test-session-secret".to_string());
        config.security.admin_username = ADMIN.to_string();
        config.security.admin_password = Some(ADMIN_PASSWORD.to_string());

        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), &config);
        state.prepare(&config.security).await.context("failed to prepare sheets")?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let app = server::app(state.clone(), &config.security);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            state,
        })
    }

    pub fn client(&self) -> TestClient {
        TestClient {
            http: reqwest::Client::new(),
            base_url: self.base_url.clone(),
            cookie: None,
        }
    }

    /// Logs in and returns a client carrying the session cookie
    pub async fn login(&self, username: &str, password: &str) -> Result<TestClient> {
        let mut client = self.client();
        let (status, body) = client
            .send(Method::POST, "/auth/login", Some(serde_json::json!({
                "username": username,
                "password": password
            })))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login for {} failed: {} {}", username, status, body);
        anyhow::ensure!(client.cookie.is_some(), "login did not set a session cookie");
        Ok(client)
    }

    pub async fn admin(&self) -> Result<TestClient> {
        self.login(ADMIN, ADMIN_PASSWORD).await
    }

    /// Creates a staff user through the API and logs them in
    pub async fn staff(&self, username: &str) -> Result<TestClient> {
        let admin = self.admin().await?;
        let (status, body) = admin
            .post(
                "/api/users",
                serde_json::json!({ "username": username, "password": "staff-password", "role": "staff" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "creating {} failed: {} {}", username, status, body);
        self.login(username, "staff-password").await
    }
}

/// reqwest client that replays the session cookie by hand
pub struct TestClient {
    http: reqwest::Client,
    base_url: String,
    pub cookie: Option<String>,
}

impl TestClient {
    pub async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str()?.split(';').next().unwrap_or_default().to_string();
            // A removal cookie comes back with an empty value
            let removed = pair.split_once('=').map(|(_, value)| value.is_empty()).unwrap_or(true);
            self.cookie = if removed { None } else { Some(pair) };
        }

        let status = response.status();
        let text = response.text().await?;
        let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.clone_for_read().send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.clone_for_read().send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.clone_for_read().send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.clone_for_read().send(Method::DELETE, path, None).await
    }

    // Requests that should not change which session this client holds
    fn clone_for_read(&self) -> TestClient {
        TestClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            cookie: self.cookie.clone(),
        }
    }
}
