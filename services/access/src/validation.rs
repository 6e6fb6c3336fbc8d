//! Input validation for staff records

use regex::Regex;
use std::sync::OnceLock;

/// Validate a staff member's display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() > 100 {
        return Err("Name must be at most 100 characters long".to_string());
    }

    Ok(())
}

/// Validate email
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

/// Validate department
pub fn validate_department(department: &str) -> Result<(), String> {
    if department.trim().is_empty() {
        return Err("Department is required".to_string());
    }

    if department.len() > 64 {
        return Err("Department must be at most 64 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.edu").is_ok());
        assert!(validate_email("").is_err());
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );
    }

    #[test]
    fn test_validate_name_and_department() {
        assert!(validate_name("Asha Rao").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
        assert!(validate_department("Library").is_ok());
        assert!(validate_department("").is_err());
    }
}
