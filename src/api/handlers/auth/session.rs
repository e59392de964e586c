//! Session cookie handling, the request gate, and session endpoints.

use axum::{
    extract::{Extension, Request},
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::{
    state::{AuthConfig, AuthState},
    token::verify_token,
};

pub(crate) const SESSION_COOKIE_NAME: &str = "userData";

/// Routes reachable without a session: login, registration, logout, and the
/// service surface that must work before authentication.
fn is_public_route(path: &str) -> bool {
    path == "/"
        || path == "/health"
        || path.starts_with("/auth/")
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// Reject unauthenticated requests before any handler runs.
///
/// A valid token becomes a typed [`super::principal::Identity`] in the request
/// extensions; everything else gets a uniform 401.
pub async fn session_guard(
    auth_state: Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_route(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = extract_session_token(request.headers()) else {
        return (StatusCode::UNAUTHORIZED, "Non autorizzato").into_response();
    };

    match verify_token(&token, auth_state.config().session_secret()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            debug!("Session token rejected: {err:#}");
            (StatusCode::UNAUTHORIZED, "Non autorizzato").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is active", body = super::principal::Identity),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(token) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match verify_token(&token, auth_state.config().session_secret()) {
        Ok(identity) => (StatusCode::OK, Json(identity)).into_response(),
        Err(err) => {
            debug!("Session check rejected token: {err:#}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> Response {
    // Sessions are stateless; logout only clears the client cookie.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Build the session cookie for a freshly issued token.
///
/// Deliberately not `HttpOnly`: the frontend reads the identity out of this
/// cookie. `SameSite=Strict` limits it to same-site requests.
pub(super) fn session_cookie(
    auth_config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_config.session_ttl_seconds();
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}={token}; Path=/; SameSite=Strict; Max-Age={ttl_seconds}");
    if auth_config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(auth_config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; SameSite=Strict; Max-Age=0");
    if auth_config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(frontend: &str) -> AuthConfig {
        AuthConfig::new(SecretString::from("secret".to_string()), frontend.to_string())
    }

    #[test]
    fn public_routes_skip_the_gate() {
        assert!(is_public_route("/"));
        assert!(is_public_route("/health"));
        assert!(is_public_route("/auth/login"));
        assert!(is_public_route("/auth/register"));
        assert!(is_public_route("/auth/logout"));
        assert!(is_public_route("/docs"));
    }

    #[test]
    fn protected_routes_hit_the_gate() {
        assert!(!is_public_route("/report"));
        assert!(!is_public_route("/spese"));
        assert!(!is_public_route("/trasferte"));
        assert!(!is_public_route("/authors"));
    }

    #[test]
    fn session_cookie_is_not_http_only() -> Result<(), InvalidHeaderValue> {
        let cookie = session_cookie(&config("http://localhost:3000"), "tok")?;
        let value = cookie.to_str().unwrap_or_default().to_string();
        assert!(value.starts_with("userData=tok;"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=86400"));
        assert!(!value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));
        Ok(())
    }

    #[test]
    fn session_cookie_secure_with_https_frontend() -> Result<(), InvalidHeaderValue> {
        let cookie = session_cookie(&config("https://spese.example.com"), "tok")?;
        let value = cookie.to_str().unwrap_or_default().to_string();
        assert!(value.contains("; Secure"));
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> Result<(), InvalidHeaderValue> {
        let cookie = clear_session_cookie(&config("http://localhost:3000"))?;
        let value = cookie.to_str().unwrap_or_default().to_string();
        assert!(value.starts_with("userData=;"));
        assert!(value.contains("Max-Age=0"));
        Ok(())
    }

    #[test]
    fn extract_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; userData=abc.def.ghi; lang=it"),
        );
        assert_eq!(
            extract_session_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn extract_token_prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-auth"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("userData=from-cookie"),
        );
        assert_eq!(extract_session_token(&headers), Some("from-auth".to_string()));
    }

    #[test]
    fn extract_token_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
    }
}
