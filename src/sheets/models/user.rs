use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{cell, format_timestamp, parse_timestamp, required};
use crate::sheets::table::SheetRow;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Usernames compare case-insensitively, ignoring surrounding whitespace
    pub fn matches(&self, username: &str) -> bool {
        self.username.trim().eq_ignore_ascii_case(username.trim())
    }
}

impl SheetRow for User {
    const COLUMNS: &'static [&'static str] = &["username", "password_hash", "role", "display_name", "created_at"];

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        let username = required(cells, 0, "username")?.to_string();
        let display_name = match cell(cells, 3) {
            "" => username.clone(),
            name => name.to_string(),
        };
        let created_at = match cell(cells, 4) {
            "" => DateTime::<Utc>::UNIX_EPOCH,
            value => parse_timestamp(value, "created_at")?,
        };

        Ok(Self {
            username,
            // Not trimmed: legacy plaintext passwords may carry spaces
            password_hash: cells.get(1).cloned().unwrap_or_default(),
            role: required(cells, 2, "role")?.parse()?,
            display_name,
            created_at,
        })
    }

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.password_hash.clone(),
            self.role.to_string(),
            self.display_name.clone(),
            format_timestamp(&self.created_at),
        ]
    }
}
