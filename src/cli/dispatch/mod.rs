//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret: auth_opts.session_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        max_login_attempts: auth_opts.max_login_attempts,
        frontend_base_url: auth_opts.frontend_base_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn maps_matches_to_server_action() {
        temp_env::with_vars(
            [
                ("NOTASPESE_SESSION_SECRET", None::<&str>),
                ("NOTASPESE_SESSION_TTL", None),
                ("NOTASPESE_FRONTEND_URL", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "notaspese",
                    "--port",
                    "9090",
                    "--dsn",
                    "postgres://user@localhost:5432/notaspese",
                    "--session-ttl",
                    "7200",
                ]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 9090);
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/notaspese");
                    assert_eq!(args.session_secret, None);
                    assert_eq!(args.session_ttl_seconds, 7200);
                    assert_eq!(args.max_login_attempts, 5);
                    assert_eq!(args.frontend_base_url, "http://localhost:3000");
                }
            },
        );
    }
}
