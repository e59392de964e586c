//! # Notaspese
//!
//! `notaspese` is an expense-report and business-trip management service.
//! Employees record expenses ("spese") against business trips ("trasferte")
//! tied to projects ("progetti"), with role-based visibility and simple
//! approval-status tracking.
//!
//! ## Authentication & sessions
//!
//! Credentials live in a single `users` table keyed by username (the local
//! part of the company email). Failed logins decrement a bounded attempt
//! counter with a single conditional statement; when it reaches zero the
//! account deactivates until an operator resets it. Successful logins issue a
//! signed, time-limited token carrying the resolved identity and role; no
//! server-side session store exists, so a token stays valid for its full
//! lifetime even if the account is later deactivated.
//!
//! ## Visibility
//!
//! Administrators see every non-deleted expense. Everyone else sees the
//! expenses they submitted plus those on trips they are responsible for, and
//! additionally gets a per-approval-state breakdown in the report.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
