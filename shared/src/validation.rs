//! Input validation functions
//!
//! Field-level validation for registration and account updates. Handlers
//! map a returned message to a 400 response.

use validator::ValidateEmail;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate username: 3-32 chars, letters/digits/underscores, compared
/// case-insensitively by the backend.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters".to_string());
    }
    if username.len() > 32 {
        return Err("Username too long".to_string());
    }
    let username_regex = regex_lite::Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    if !username_regex.is_match(username) {
        return Err("Username may only contain letters, digits and underscores".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate display name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    if full_name.trim().is_empty() {
        return Err("Full name cannot be empty".to_string());
    }
    if full_name.len() > 128 {
        return Err("Full name too long".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("alice@x.com").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("secret12").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_full_name_rules() {
        assert!(validate_full_name("Alice Example").is_ok());
        assert!(validate_full_name("   ").is_err());
    }
}
