//! API handlers and shared utilities.
//!
//! This module organizes the service's route handlers and provides common
//! validation helpers used across them.

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod health;
pub mod projects;
pub mod report;
pub mod root;
pub mod trips;

use regex::Regex;

/// Lightweight email sanity check used by auth handlers before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::valid_email;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("mario.rossi@company.com"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }
}
