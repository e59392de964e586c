//! Auth configuration and shared state.

use secrecy::SecretString;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_MAX_LOGIN_ATTEMPTS: i32 = 5;

#[derive(Debug)]
pub struct AuthConfig {
    session_secret: SecretString,
    frontend_base_url: String,
    session_ttl_seconds: i64,
    max_login_attempts: i32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(session_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            session_secret,
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_login_attempts(mut self, attempts: i32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    pub(crate) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn max_login_attempts(&self) -> i32 {
        self.max_login_attempts
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
