use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::auth::{cookie_key, SessionCookies};
use crate::config::{AppConfig, SecurityConfig};
use crate::services::{ProductService, SalesService, ServiceError, UserService};
use crate::sheets::{SheetStore, Workbook};

/// Shared handler state. Everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub workbook: Workbook,
    pub users: UserService,
    pub products: ProductService,
    pub sales: SalesService,
    pub sessions: SessionCookies,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(store: Arc<dyn SheetStore>, config: &AppConfig) -> Self {
        let workbook = Workbook::new(store, &config.sheets);

        Self {
            users: UserService::new(workbook.users.clone()),
            products: ProductService::new(workbook.products.clone(), workbook.sales.clone()),
            sales: SalesService::new(workbook.products.clone(), workbook.sales.clone()),
            sessions: SessionCookies::from_config(&config.session),
            cookie_key: cookie_key(config.session.secret.as_deref()),
            workbook,
        }
    }

    /// Writes missing header rows, then creates the configured admin if the
    /// Users tab has none.
    pub async fn prepare(&self, security: &SecurityConfig) -> Result<(), ServiceError> {
        self.workbook.ensure_headers().await?;

        if let Some(password) = &security.admin_password {
            if self.users.bootstrap_admin(&security.admin_username, password).await? {
                tracing::info!("Created initial admin '{}'", security.admin_username);
            }
        }
        Ok(())
    }
}

// PrivateCookieJar pulls its key out of the state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
