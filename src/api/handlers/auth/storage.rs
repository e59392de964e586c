//! Database helpers for the credential store.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::principal::Identity;

/// Credential row used by the login flow.
pub(super) struct CredentialRecord {
    pub(super) id_user: i32,
    pub(super) id_dipendente: i32,
    pub(super) password_hash: String,
    pub(super) tentativi_rimasti: i32,
    pub(super) is_active: bool,
}

/// State of the attempt counter after a failed password check.
pub(super) struct FailedAttempt {
    pub(super) remaining: i32,
    pub(super) active: bool,
}

/// Outcome when attempting to create a new credential.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created,
    Conflict,
}

/// Look up a credential by its normalized username.
pub(super) async fn lookup_credential(
    pool: &PgPool,
    username: &str,
) -> Result<Option<CredentialRecord>> {
    let query = r"
        SELECT id_user, id_dipendente, password_hash, tentativi_rimasti, is_active
        FROM users
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credential")?;

    Ok(row.map(|row| CredentialRecord {
        id_user: row.get("id_user"),
        id_dipendente: row.get("id_dipendente"),
        password_hash: row.get("password_hash"),
        tentativi_rimasti: row.get("tentativi_rimasti"),
        is_active: row.get("is_active"),
    }))
}

/// Decrement the attempt counter and deactivate the account when it hits zero.
///
/// A single conditional statement, so concurrent failures cannot drive the
/// counter below zero or skip the deactivation; the right-hand expressions all
/// read the pre-update row.
pub(super) async fn register_failed_attempt(pool: &PgPool, id_user: i32) -> Result<FailedAttempt> {
    let query = r"
        UPDATE users
        SET tentativi_rimasti = tentativi_rimasti - 1,
            is_active = tentativi_rimasti > 1,
            updated_at = NOW()
        WHERE id_user = $1
          AND tentativi_rimasti > 0
        RETURNING tentativi_rimasti, is_active
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id_user)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update login attempts")?;

    // No row means another request already drained the counter.
    Ok(row.map_or(
        FailedAttempt {
            remaining: 0,
            active: false,
        },
        |row| FailedAttempt {
            remaining: row.get("tentativi_rimasti"),
            active: row.get("is_active"),
        },
    ))
}

/// Reset the counter and record the successful login in one statement.
pub(super) async fn reset_credential(pool: &PgPool, id_user: i32, max_attempts: i32) -> Result<()> {
    let query = r"
        UPDATE users
        SET tentativi_rimasti = $2,
            is_active = TRUE,
            ultimo_accesso = NOW(),
            updated_at = NOW()
        WHERE id_user = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id_user)
        .bind(max_attempts)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reset credential")?;
    Ok(())
}

/// Resolve the identity embedded into the session token.
pub(super) async fn resolve_identity(
    pool: &PgPool,
    id_dipendente: i32,
) -> Result<Option<Identity>> {
    let query = r"
        SELECT d.id_dipendente,
               d.nome || ' ' || d.cognome AS nome,
               d.email,
               d.ruolo,
               u.is_admin
        FROM dipendenti d
        JOIN users u ON u.id_dipendente = d.id_dipendente
        WHERE d.id_dipendente = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id_dipendente)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to resolve identity")?;

    Ok(row.map(|row| Identity {
        id_dipendente: row.get("id_dipendente"),
        nome: row.get("nome"),
        email: row.get("email"),
        ruolo: row.get("ruolo"),
        is_admin: row.get("is_admin"),
    }))
}

/// Insert a new credential, mapping unique violations to a conflict outcome.
pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    password_hash: &str,
    id_dipendente: i32,
    max_attempts: i32,
) -> Result<RegisterOutcome> {
    let query = r"
        INSERT INTO users
            (email, username, password_hash, id_dipendente, tentativi_rimasti)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(id_dipendente)
        .bind(max_attempts)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(RegisterOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{FailedAttempt, RegisterOutcome, is_unique_violation};

    #[test]
    fn register_outcome_debug_names() {
        assert_eq!(format!("{:?}", RegisterOutcome::Created), "Created");
        assert_eq!(format!("{:?}", RegisterOutcome::Conflict), "Conflict");
    }

    #[test]
    fn failed_attempt_holds_values() {
        let attempt = FailedAttempt {
            remaining: 2,
            active: true,
        };
        assert_eq!(attempt.remaining, 2);
        assert!(attempt.active);
    }

    #[test]
    fn is_unique_violation_ignores_non_database_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
