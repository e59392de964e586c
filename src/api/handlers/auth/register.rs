//! Registration endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    login::normalize_identifier,
    password::hash_password,
    state::AuthState,
    storage::{insert_user, RegisterOutcome},
    types::{RegisterRequest, RegisterResponse},
};
use crate::api::handlers::valid_email;

const MIN_PASSWORD_LENGTH: usize = 8;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Email, username or employee already registered", body = String),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            "E-mail e password sono obbligatorie",
        )
            .into_response();
    };

    let email = request.email.trim().to_lowercase();
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "E-mail non valida").into_response();
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            "La password deve avere almeno 8 caratteri",
        )
            .into_response();
    }
    if request.id_dipendente <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            "Devi essere associato a un dipendente. Usa la mail aziendale.",
        )
            .into_response();
    }

    // Username defaults to the email local part, the same key login uses.
    let username = request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| normalize_identifier(&email))
        .to_string();

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Password hashing failed: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Errore del server").into_response();
        }
    };

    match insert_user(
        &pool,
        &email,
        &username,
        &password_hash,
        request.id_dipendente,
        auth_state.config().max_login_attempts(),
    )
    .await
    {
        Ok(RegisterOutcome::Created) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "Utente creato con successo".to_string(),
            }),
        )
            .into_response(),
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::CONFLICT,
            "Un utente con questa email, username o dipendente esiste già",
        )
            .into_response(),
        Err(err) => {
            error!("Registration failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Errore del server").into_response()
        }
    }
}
