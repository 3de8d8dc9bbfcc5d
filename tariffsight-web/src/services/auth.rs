//! Credential hashing and input validation
//!
//! Pure functions only; session persistence lives in `db::sessions`.

use rand::RngCore;
use sha2::{Digest, Sha256};

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt
///
/// Stored form is `salt$hash`, both hex; SHA-256 over salt bytes
/// followed by the password bytes.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex: String = salt.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}${}", salt_hex, digest(&salt_hex, password))
}

/// Verify a password against a stored `salt$hash` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt_hex, password) == expected
}

fn digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Minimal shape check for an email address
pub fn is_valid_email(email: &str) -> bool {
    let trimmed = email.trim();
    if trimmed.len() < 3 || trimmed.contains(char::is_whitespace) {
        return false;
    }
    match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Password policy: length only
pub fn is_valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}
