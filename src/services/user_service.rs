use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::ServiceError;
use crate::auth::{hash_password, verify_password};
use crate::sheets::{Located, Table, User};
use crate::types::Role;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Table<User>,
}

impl UserService {
    pub fn new(users: Table<User>) -> Self {
        Self { users }
    }

    async fn locate(&self, username: &str) -> Result<Located<User>, ServiceError> {
        self.users
            .find(|user| user.matches(username))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User '{}'", username.trim())))
    }

    /// Checks a login. Unknown users and wrong passwords fail identically.
    /// Credentials stored in a legacy format are upgraded to Argon2 on success.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let Some(Located { row, mut record }) = self.users.find(|user| user.matches(username)).await? else {
            warn!("Login rejected: unknown user '{}'", username.trim());
            return Err(ServiceError::InvalidCredentials);
        };

        let verification = match verify_password(password, &record.password_hash) {
            Ok(v) => v,
            Err(e) => {
                error!("Cannot verify password for '{}': {}", record.username, e);
                return Err(ServiceError::InvalidCredentials);
            }
        };
        if !verification.matched {
            warn!("Login rejected: wrong password for '{}'", record.username);
            return Err(ServiceError::InvalidCredentials);
        }

        if verification.needs_rehash {
            match hash_password(password) {
                Ok(hash) => {
                    record.password_hash = hash;
                    match self.users.update(row, &record).await {
                        Ok(()) => info!("Upgraded stored password hash for '{}'", record.username),
                        Err(e) => warn!("Could not upgrade password hash for '{}': {}", record.username, e),
                    }
                }
                Err(e) => warn!("Could not rehash password for '{}': {}", record.username, e),
            }
        }

        info!("Login accepted for '{}' ({})", record.username, record.role);
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.all().await?.into_iter().map(|l| l.record).collect())
    }

    pub async fn get(&self, username: &str) -> Result<User, ServiceError> {
        Ok(self.locate(username).await?.record)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, ServiceError> {
        let username = new_user.username.trim().to_string();
        validate_username(&username)?;
        validate_password(&new_user.password)?;

        if self.users.find(|user| user.matches(&username)).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!("User '{}'", username)));
        }

        let user = User {
            display_name: new_user
                .display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| username.clone()),
            username,
            password_hash: hash_password(&new_user.password)?,
            role: new_user.role,
            created_at: Utc::now(),
        };
        self.users.insert(&user).await?;

        info!("Created user '{}' ({})", user.username, user.role);
        Ok(user)
    }

    pub async fn update(&self, username: &str, update: UserUpdate) -> Result<User, ServiceError> {
        let Located { row, mut record } = self.locate(username).await?;

        if let Some(role) = update.role {
            if record.role.is_admin() && !role.is_admin() {
                self.ensure_other_admin(&record.username).await?;
            }
            record.role = role;
        }
        if let Some(display_name) = update.display_name {
            let display_name = display_name.trim();
            if display_name.is_empty() {
                return Err(ServiceError::Validation("Display name cannot be empty".to_string()));
            }
            record.display_name = display_name.to_string();
        }
        if let Some(password) = update.password {
            validate_password(&password)?;
            record.password_hash = hash_password(&password)?;
        }

        self.users.update(row, &record).await?;
        Ok(record)
    }

    pub async fn delete(&self, username: &str) -> Result<(), ServiceError> {
        let Located { row, record } = self.locate(username).await?;
        if record.role.is_admin() {
            self.ensure_other_admin(&record.username).await?;
        }
        self.users.delete(row).await?;

        info!("Deleted user '{}'", record.username);
        Ok(())
    }

    pub async fn change_password(&self, username: &str, old_password: &str, new_password: &str) -> Result<(), ServiceError> {
        let Located { row, mut record } = self.locate(username).await?;

        let verification = verify_password(old_password, &record.password_hash)?;
        if !verification.matched {
            return Err(ServiceError::InvalidCredentials);
        }
        validate_password(new_password)?;

        record.password_hash = hash_password(new_password)?;
        self.users.update(row, &record).await?;
        Ok(())
    }

    /// Creates `username` as an admin when the Users tab has no admin at all.
    /// An existing non-admin user of that name is left alone. Returns whether a
    /// user was created.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, ServiceError> {
        let users = self.list().await?;
        if users.iter().any(|user| user.role.is_admin()) {
            return Ok(false);
        }
        if users.iter().any(|user| user.matches(username)) {
            warn!(
                "No admin exists but '{}' is already a non-admin user; promote an admin by hand",
                username.trim()
            );
            return Ok(false);
        }

        self.create(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            display_name: None,
        })
        .await?;
        Ok(true)
    }

    async fn ensure_other_admin(&self, username: &str) -> Result<(), ServiceError> {
        let others = self
            .list()
            .await?
            .into_iter()
            .filter(|user| user.role.is_admin() && !user.matches(username))
            .count();
        if others == 0 {
            return Err(ServiceError::Validation("At least one admin must remain".to_string()));
        }
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.len() < 3 {
        return Err(ServiceError::Validation("Username must be at least 3 characters".to_string()));
    }
    if username.len() > 32 {
        return Err(ServiceError::Validation("Username must be at most 32 characters".to_string()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ServiceError::Validation(
            "Username can only contain letters, numbers, dot, underscore, and hyphen".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
