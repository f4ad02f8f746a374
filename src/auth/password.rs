use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Stored password hash is malformed: {0}")]
    Malformed(String),
}

/// How a stored credential is encoded. The Users tab has accumulated all of
/// these over time; anything that is not Argon2 gets upgraded on next login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    Argon2,
    /// `sha256$<salt>$<hex digest of salt + password>`
    SaltedSha256,
    /// 64 hex characters, digest of the bare password
    Sha256,
    Plaintext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub matched: bool,
    pub needs_rehash: bool,
}

impl Verification {
    const REJECTED: Verification = Verification {
        matched: false,
        needs_rehash: false,
    };
}

pub fn detect_format(stored: &str) -> HashFormat {
    if stored.starts_with("$argon2") {
        HashFormat::Argon2
    } else if stored.starts_with("sha256$") {
        HashFormat::SaltedSha256
    } else if stored.len() == 64 && stored.chars().all(|c| c.is_ascii_hexdigit()) {
        HashFormat::Sha256
    } else {
        HashFormat::Plaintext
    }
}

/// Argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, stored: &str) -> Result<Verification, PasswordError> {
    if stored.is_empty() {
        return Ok(Verification::REJECTED);
    }

    let format = detect_format(stored);
    let matched = match format {
        HashFormat::Argon2 => {
            let parsed = PasswordHash::new(stored).map_err(|e| PasswordError::Malformed(e.to_string()))?;
            Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
        }
        HashFormat::SaltedSha256 => {
            let mut parts = stored.splitn(3, '$').skip(1);
            let (salt, digest) = match (parts.next(), parts.next()) {
                (Some(salt), Some(digest)) => (salt, digest),
                _ => return Err(PasswordError::Malformed("expected sha256$<salt>$<hex>".to_string())),
            };
            let computed = sha256_hex(&format!("{}{}", salt, password));
            constant_time_eq(computed.as_bytes(), digest.to_ascii_lowercase().as_bytes())
        }
        HashFormat::Sha256 => {
            let computed = sha256_hex(password);
            constant_time_eq(computed.as_bytes(), stored.to_ascii_lowercase().as_bytes())
        }
        HashFormat::Plaintext => constant_time_eq(password.as_bytes(), stored.as_bytes()),
    };

    Ok(Verification {
        matched,
        needs_rehash: matched && format != HashFormat::Argon2,
    })
}

fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
