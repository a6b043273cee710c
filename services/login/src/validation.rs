//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
///
/// The username becomes part of a secret name (`{username}pass`), so it is
/// limited to characters every secret backend accepts: letters, digits and
/// dashes.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 64 {
        return Err("Username must be at most 64 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return Err(
            "Username can only contain letters, numbers and dashes".to_string(),
        );
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    Ok(())
}
