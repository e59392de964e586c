//! Session and login-policy arguments.

use anyhow::Result;
use clap::{Arg, Command};

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_MAX_LOGIN_ATTEMPTS: &str = "max-login-attempts";
pub const ARG_FRONTEND_URL: &str = "frontend-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret used to sign session tokens")
                .long_help(
                    "Secret used to sign session tokens. When omitted an ephemeral random \
                     secret is generated at startup and existing sessions will not survive \
                     a restart.",
                )
                .env("NOTASPESE_SESSION_SECRET"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token validity in seconds")
                .default_value("86400")
                .env("NOTASPESE_SESSION_TTL")
                .value_parser(clap::value_parser!(i64).range(60..)),
        )
        .arg(
            Arg::new(ARG_MAX_LOGIN_ATTEMPTS)
                .long(ARG_MAX_LOGIN_ATTEMPTS)
                .help("Failed logins allowed before an account is deactivated")
                .default_value("5")
                .env("NOTASPESE_MAX_LOGIN_ATTEMPTS")
                .value_parser(clap::value_parser!(i32).range(1..=10)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_URL)
                .long(ARG_FRONTEND_URL)
                .help("Frontend base URL, used for CORS and cookie attributes")
                .default_value("http://localhost:3000")
                .env("NOTASPESE_FRONTEND_URL"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_secret: Option<String>,
    pub session_ttl_seconds: i64,
    pub max_login_attempts: i32,
    pub frontend_base_url: String,
}

impl Options {
    /// Extract session/login options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        use anyhow::Context;

        Ok(Self {
            session_secret: matches.get_one::<String>(ARG_SESSION_SECRET).cloned(),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL)
                .copied()
                .context("missing required argument: --session-ttl")?,
            max_login_attempts: matches
                .get_one::<i32>(ARG_MAX_LOGIN_ATTEMPTS)
                .copied()
                .context("missing required argument: --max-login-attempts")?,
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_URL)
                .cloned()
                .context("missing required argument: --frontend-url")?,
        })
    }
}
