//! Login endpoint: credential lookup, bounded-retry lockout, token issuance.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    password::verify_password,
    session::session_cookie,
    state::AuthState,
    storage::{lookup_credential, register_failed_attempt, reset_credential, resolve_identity},
    token::issue_token,
    types::{LoginRequest, LoginResponse},
};

const MSG_MISSING_CREDENTIALS: &str = "Username o Password mancanti";
const MSG_NOT_FOUND: &str = "Utente non trovato";
const MSG_LOCKED: &str = "Account bloccato, troppi tentativi errati.";
const MSG_SERVER_ERROR: &str = "Errore del server";
const MSG_SUCCESS: &str = "Login effettuato con successo";

/// Reduce an email to its local part; bare usernames pass through unchanged.
/// Email and username are treated as equivalent via this transform.
pub(crate) fn normalize_identifier(identifier: &str) -> &str {
    match identifier.find('@') {
        Some(position) => &identifier[..position],
        None => identifier,
    }
}

fn rejected_message(remaining: i32) -> String {
    format!("Password errata. Tentativi rimanenti: {remaining}")
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success, session cookie set", body = LoginResponse),
        (status = 400, description = "Missing identifier or password", body = String),
        (status = 401, description = "Unknown user or wrong password", body = String),
        (status = 423, description = "Account locked after too many failures", body = String),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, MSG_MISSING_CREDENTIALS).into_response();
    };

    let identifier = request.identifier.trim();
    let password = request.password.as_str();
    if identifier.is_empty() || password.is_empty() {
        return (StatusCode::BAD_REQUEST, MSG_MISSING_CREDENTIALS).into_response();
    }

    let username = normalize_identifier(identifier);

    let record = match lookup_credential(&pool, username).await {
        Ok(Some(record)) => record,
        Ok(None) => return (StatusCode::UNAUTHORIZED, MSG_NOT_FOUND).into_response(),
        Err(err) => {
            error!("Credential lookup failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
    };

    // Locked accounts are rejected before any password check.
    if !record.is_active {
        return (StatusCode::LOCKED, MSG_LOCKED).into_response();
    }

    let password_valid = match verify_password(password, &record.password_hash) {
        Ok(valid) => valid,
        Err(err) => {
            error!("Password verification failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
    };

    if !password_valid {
        let attempt = match register_failed_attempt(&pool, record.id_user).await {
            Ok(attempt) => attempt,
            Err(err) => {
                error!("Failed to record login attempt: {err:#}");
                return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
            }
        };

        // Remaining attempts are disclosed on purpose.
        return if attempt.active {
            (StatusCode::UNAUTHORIZED, rejected_message(attempt.remaining)).into_response()
        } else {
            (StatusCode::LOCKED, MSG_LOCKED).into_response()
        };
    }

    let max_attempts = auth_state.config().max_login_attempts();
    if let Err(err) = reset_credential(&pool, record.id_user, max_attempts).await {
        error!("Failed to reset credential after login: {err:#}");
        return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
    }

    let identity = match resolve_identity(&pool, record.id_dipendente).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            error!(
                id_dipendente = record.id_dipendente,
                "Credential has no matching employee record"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
        Err(err) => {
            error!("Identity resolution failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
    };

    let token = match issue_token(
        &identity,
        auth_state.config().session_secret(),
        auth_state.config().session_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Token issuance failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR).into_response();
        }
    }

    let response = LoginResponse {
        message: MSG_SUCCESS.to_string(),
        utente: identity,
    };
    (StatusCode::OK, headers, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::{normalize_identifier, rejected_message};

    #[test]
    fn email_identifier_reduces_to_local_part() {
        assert_eq!(
            normalize_identifier("mario.rossi@company.com"),
            "mario.rossi"
        );
    }

    #[test]
    fn bare_username_passes_through() {
        assert_eq!(normalize_identifier("mario.rossi"), "mario.rossi");
    }

    #[test]
    fn only_first_at_sign_matters() {
        assert_eq!(normalize_identifier("a@b@c"), "a");
    }

    #[test]
    fn rejected_message_discloses_remaining_attempts() {
        assert_eq!(
            rejected_message(3),
            "Password errata. Tentativi rimanenti: 3"
        );
    }
}
