//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate email shape
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate that a student registration email belongs to the campus
///
/// Students and lecturers register with their institutional addresses;
/// every other domain is rejected.
pub fn validate_campus_email(email: &str) -> Result<(), String> {
    static STUDENT_EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let student_regex = STUDENT_EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9._%+-]+@student\.babcock\.edu\.ng$")
            .expect("Failed to compile student email regex")
    });

    static LECTURER_EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let lecturer_regex = LECTURER_EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9._%+-]+@lecturer\.babcock\.edu\.ng$")
            .expect("Failed to compile lecturer email regex")
    });

    if !student_regex.is_match(email) && !lecturer_regex.is_match(email) {
        return Err("Email must be a valid campus student or lecturer email".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate a required free-text field such as a name or location
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@student.babcock.edu.ng").is_ok());
        assert!(validate_email("vendor@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_validate_campus_email() {
        assert!(validate_campus_email("ada@student.babcock.edu.ng").is_ok());
        assert!(validate_campus_email("obi@LECTURER.babcock.edu.ng").is_ok());
        assert!(validate_campus_email("someone@gmail.com").is_err());
        assert!(validate_campus_email("ada@student.babcock.edu.ng.evil.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Name", "Mama Bose Canteen").is_ok());
        assert!(validate_required("Location", "   ").is_err());
    }
}
