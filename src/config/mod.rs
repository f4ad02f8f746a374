use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetsBackend {
    Google,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub backend: SheetsBackend,
    pub spreadsheet_id: String,
    pub api_base: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub products_tab: String,
    pub users_tab: String,
    pub sales_tab: String,
}

/// Longest session a cookie may carry (one year)
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub cookie_name: String,
    pub ttl_hours: u64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// Admin created at startup when the Users tab holds no admin
    pub admin_username: String,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("STAND_BIND") {
            self.server.bind = v;
        }
        if let Some(port) = env::var("STAND_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Sheets overrides
        if let Ok(v) = env::var("SHEETS_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.sheets.backend = SheetsBackend::Memory,
                "google" | "sheets" => self.sheets.backend = SheetsBackend::Google,
                other => tracing::warn!("Unknown SHEETS_BACKEND '{}', keeping {:?}", other, self.sheets.backend),
            }
        }
        if let Ok(v) = env::var("SHEETS_SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = v;
        }
        if let Ok(v) = env::var("SHEETS_API_BASE") {
            self.sheets.api_base = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SHEETS_API_KEY") {
            self.sheets.api_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SHEETS_TIMEOUT_SECS") {
            self.sheets.timeout_secs = v.parse().unwrap_or(self.sheets.timeout_secs);
        }
        if let Ok(v) = env::var("SHEETS_PRODUCTS_TAB") {
            self.sheets.products_tab = v;
        }
        if let Ok(v) = env::var("SHEETS_USERS_TAB") {
            self.sheets.users_tab = v;
        }
        if let Ok(v) = env::var("SHEETS_SALES_TAB") {
            self.sheets.sales_tab = v;
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v.parse().unwrap_or(self.session.ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("STAND_ADMIN_USERNAME") {
            self.security.admin_username = v;
        }
        if let Ok(v) = env::var("STAND_ADMIN_PASSWORD") {
            self.security.admin_password = Some(v).filter(|s| !s.is_empty());
        }

        self
    }

    /// Checks the combinations that must not reach production.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheets.backend == SheetsBackend::Google && self.sheets.spreadsheet_id.is_empty() {
            return Err(ConfigError::Missing("SHEETS_SPREADSHEET_ID"));
        }
        if self.session.ttl_hours == 0 || self.session.ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if self.environment == Environment::Production {
            if self.sheets.backend == SheetsBackend::Memory {
                return Err(ConfigError::Invalid(
                    "the memory sheets backend cannot be used in production".to_string(),
                ));
            }
            if self.session.secret.is_none() {
                return Err(ConfigError::Missing("SESSION_SECRET"));
            }
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind: "127.0.0.1".to_string(),
                port: 3000,
            },
            sheets: SheetsConfig {
                backend: SheetsBackend::Memory,
                ..SheetsConfig::default()
            },
            session: SessionConfig {
                secret: None,
                cookie_name: "stand_session".to_string(),
                ttl_hours: 24,
                secure_cookie: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 3000,
            },
            sheets: SheetsConfig::default(),
            session: SessionConfig {
                secret: None,
                cookie_name: "stand_session".to_string(),
                ttl_hours: 12,
                secure_cookie: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 3000,
            },
            sheets: SheetsConfig {
                timeout_secs: 10,
                ..SheetsConfig::default()
            },
            session: SessionConfig {
                secret: None,
                cookie_name: "stand_session".to_string(),
                ttl_hours: 10, // one shift
                secure_cookie: true,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                admin_username: "admin".to_string(),
                admin_password: None,
            },
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            backend: SheetsBackend::Google,
            spreadsheet_id: String::new(),
            api_base: "https://sheets.googleapis.com/v4".to_string(),
            access_token: None,
            api_key: None,
            timeout_secs: 15,
            products_tab: "Products".to_string(),
            users_tab: "Users".to_string(),
            sales_tab: "Sales".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
