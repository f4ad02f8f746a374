use std::time::Duration;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{elevated, protected, public};
use crate::state::AppState;

pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(public::login))
        // Session required
        .merge(auth_routes())
        .merge(product_routes())
        .merge(sales_routes())
        // Admin required
        .merge(user_routes())
        // Global middleware
        .layer(cors(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/password", put(auth::change_password))
}

fn product_routes() -> Router<AppState> {
    use elevated::products as admin;
    use protected::products;

    Router::new()
        .route("/api/products", get(products::list).post(admin::create))
        .route(
            "/api/products/:id",
            get(products::get).put(admin::update).delete(admin::delete),
        )
        .route("/api/products/:id/stock", post(admin::adjust_stock))
}

fn sales_routes() -> Router<AppState> {
    use protected::{orders, sales};

    Router::new()
        .route("/api/orders", post(orders::place))
        .route("/api/sales", get(sales::history))
        .route("/api/sales/summary", get(sales::summary))
}

fn user_routes() -> Router<AppState> {
    use elevated::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:username",
            get(users::get).put(users::update).delete(users::delete),
        )
}

fn cors(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    // Credentials are needed for the session cookie, which rules out `*`
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Coffee Stand",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "login": "/auth/login (public)",
                "auth": "/api/auth/whoami, /api/auth/logout, /api/auth/password (session)",
                "products": "/api/products[/:id] (session; writes admin)",
                "orders": "/api/orders (session)",
                "sales": "/api/sales, /api/sales/summary (session)",
                "users": "/api/users[/:username] (admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.workbook.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "spreadsheet": "ok"
                }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "spreadsheet unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, config: &AppConfig) -> std::io::Result<()> {
    let address = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Coffee stand listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state, &config.security))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::sheets::MemoryStore;
    use crate::types::Role;

    async fn stand() -> (Router, AppState) {
        let config = AppConfig::development();
        let state = AppState::new(Arc::new(MemoryStore::new()), &config);
        state.workbook.ensure_headers().await.unwrap();
        (app(state.clone(), &config.security), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "username": username, "password": password }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn api_requires_a_session() {
        let (app, _) = stand().await;
        let response = app
            .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn staff_cannot_manage_products() {
        let (app, state) = stand().await;
        state
            .users
            .create(crate::services::NewUser {
                username: "sam".to_string(),
                password: "long-enough".to_string(),
                role: Role::Staff,
                display_name: None,
            })
            .await
            .unwrap();
        let cookie = login(&app, "sam", "long-enough").await;

        let request = Request::post("/api/products")
            .header(header::COOKIE, &cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "Latte", "price": "4.25" }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::get("/api/products").header(header::COOKIE, &cookie).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], json!([]));
    }

    #[tokio::test]
    async fn malformed_json_uses_the_error_envelope() {
        let (app, _) = stand().await;
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_JSON");
    }
}
