use crate::api::{self, handlers::auth::AuthConfig};
use anyhow::Result;
use rand::{distributions::Alphanumeric, Rng};
use secrecy::SecretString;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_secret: Option<String>,
    pub session_ttl_seconds: i64,
    pub max_login_attempts: i32,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let session_secret = match args.session_secret {
        Some(secret) => SecretString::from(secret),
        None => {
            // Sessions signed with an ephemeral secret die with the process.
            warn!("No session secret configured, generating an ephemeral one");
            SecretString::from(generate_secret())
        }
    };

    let auth_config = AuthConfig::new(session_secret, args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_max_login_attempts(args.max_login_attempts);

    api::new(args.port, args.dsn, auth_config).await
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
