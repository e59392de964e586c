//! Expense listing and submission.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, Instrument};
use utoipa::ToSchema;

use super::auth::Identity;
use super::report::storage::parse_amount;

#[derive(Debug, Serialize, ToSchema)]
pub struct SpesaResponse {
    pub uuid_spesa: String,
    pub trasferta: String,
    pub categoria: Option<String>,
    pub nome_dipendente: String,
    pub data_spesa: String,
    pub descrizione: String,
    pub importo: Option<f64>,
    pub stato_approvazione: String,
    pub scontrino_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewSpesaRequest {
    pub id_trasferta: i32,
    pub id_categoria: i32,
    /// ISO date, `YYYY-MM-DD`.
    pub data_spesa: String,
    pub descrizione: String,
    pub importo: f64,
    pub scontrino_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewSpesaResponse {
    pub uuid_spesa: String,
    pub message: String,
}

pub(crate) fn valid_iso_date(value: &str) -> bool {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").is_ok_and(|re| re.is_match(value))
}

fn map_row(row: &PgRow) -> Result<SpesaResponse> {
    let uuid: uuid::Uuid = row
        .try_get("uuid_spesa")
        .context("missing uuid_spesa column")?;
    let importo: Option<String> = row.try_get("importo").context("missing importo column")?;
    Ok(SpesaResponse {
        uuid_spesa: uuid.to_string(),
        trasferta: row.try_get("trasferta").context("missing trasferta column")?,
        categoria: row.try_get("categoria").context("missing categoria column")?,
        nome_dipendente: row
            .try_get("nome_dipendente")
            .context("missing nome_dipendente column")?,
        data_spesa: row
            .try_get("data_spesa")
            .context("missing data_spesa column")?,
        descrizione: row
            .try_get("descrizione")
            .context("missing descrizione column")?,
        importo: parse_amount(importo.as_deref()),
        stato_approvazione: row
            .try_get("stato_approvazione")
            .context("missing stato_approvazione column")?,
        scontrino_url: row
            .try_get("scontrino_url")
            .context("missing scontrino_url column")?,
    })
}

async fn fetch_expenses(pool: &PgPool, identity: &Identity) -> Result<Vec<SpesaResponse>> {
    // Same visibility rule as the report: admins see everything, everyone else
    // sees what they submitted or are responsible for.
    let rows = if identity.is_admin {
        let query = r"
            SELECT s.uuid_spesa,
                   t.luogo AS trasferta,
                   c.nome AS categoria,
                   d.nome || ' ' || d.cognome AS nome_dipendente,
                   s.data_spesa::text AS data_spesa,
                   s.descrizione,
                   s.importo::text AS importo,
                   s.stato_approvazione,
                   s.scontrino_url
            FROM spese s
            JOIN trasferte t ON t.id_trasferta = s.id_trasferta
            JOIN dipendenti d ON d.id_dipendente = s.id_dipendente
            LEFT JOIN categorie_spese c ON c.id_categoria = s.id_categoria
            WHERE s.is_deleted = FALSE
            ORDER BY s.data_spesa DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .fetch_all(pool)
            .instrument(span)
            .await
            .context("failed to fetch expenses")?
    } else {
        let query = r"
            SELECT s.uuid_spesa,
                   t.luogo AS trasferta,
                   c.nome AS categoria,
                   d.nome || ' ' || d.cognome AS nome_dipendente,
                   s.data_spesa::text AS data_spesa,
                   s.descrizione,
                   s.importo::text AS importo,
                   s.stato_approvazione,
                   s.scontrino_url
            FROM spese s
            JOIN trasferte t ON t.id_trasferta = s.id_trasferta
            JOIN dipendenti d ON d.id_dipendente = s.id_dipendente
            LEFT JOIN categorie_spese c ON c.id_categoria = s.id_categoria
            WHERE s.is_deleted = FALSE
              AND (t.id_responsabile = $1 OR s.id_dipendente = $1)
            ORDER BY s.data_spesa DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(identity.id_dipendente)
            .fetch_all(pool)
            .instrument(span)
            .await
            .context("failed to fetch expenses")?
    };

    rows.iter().map(map_row).collect()
}

#[utoipa::path(
    get,
    path = "/spese",
    responses(
        (status = 200, description = "Expenses visible to the caller", body = [SpesaResponse]),
        (status = 401, description = "Missing or invalid session"),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "spese"
)]
pub async fn list_expenses(pool: Extension<PgPool>, identity: Extension<Identity>) -> Response {
    match fetch_expenses(&pool, &identity).await {
        Ok(expenses) => (StatusCode::OK, Json(expenses)).into_response(),
        Err(err) => {
            error!("Failed to fetch expenses: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore durante il recupero delle spese.",
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/spese",
    request_body = NewSpesaRequest,
    responses(
        (status = 201, description = "Expense recorded", body = NewSpesaResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Missing or invalid session"),
        (status = 404, description = "Trip or category does not exist", body = String),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "spese"
)]
pub async fn create_expense(
    pool: Extension<PgPool>,
    identity: Extension<Identity>,
    payload: Option<Json<NewSpesaRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Payload mancante").into_response();
    };

    if !request.importo.is_finite() || request.importo < 0.0 {
        return (StatusCode::BAD_REQUEST, "Importo non valido").into_response();
    }
    if !valid_iso_date(&request.data_spesa) {
        return (StatusCode::BAD_REQUEST, "Data non valida, usare AAAA-MM-GG").into_response();
    }
    if request.descrizione.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Descrizione obbligatoria").into_response();
    }

    match insert_expense(&pool, &identity, &request).await {
        Ok(Some(uuid_spesa)) => (
            StatusCode::CREATED,
            Json(NewSpesaResponse {
                uuid_spesa,
                message: "Spesa registrata".to_string(),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            "Trasferta o categoria inesistente",
        )
            .into_response(),
        Err(err) => {
            error!("Failed to insert expense: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Errore del server").into_response()
        }
    }
}

/// Insert an expense submitted by the caller.
///
/// Returns `Ok(None)` when the referenced trip or category does not exist.
async fn insert_expense(
    pool: &PgPool,
    identity: &Identity,
    request: &NewSpesaRequest,
) -> Result<Option<String>> {
    let query = r"
        INSERT INTO spese
            (uuid_spesa, id_trasferta, id_categoria, id_dipendente,
             data_spesa, descrizione, importo, scontrino_url, stato_approvazione)
        VALUES ($1, $2, $3, $4, $5::date, $6, $7::numeric, $8, 'presentata')
        RETURNING uuid_spesa
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(uuid::Uuid::new_v4())
        .bind(request.id_trasferta)
        .bind(request.id_categoria)
        .bind(identity.id_dipendente)
        .bind(&request.data_spesa)
        .bind(request.descrizione.trim())
        .bind(format!("{:.2}", request.importo))
        .bind(request.scontrino_url.as_deref())
        .fetch_one(pool)
        .instrument(span)
        .await;

    match result {
        Ok(row) => {
            let uuid: uuid::Uuid = row.try_get("uuid_spesa").context("missing uuid_spesa")?;
            Ok(Some(uuid.to_string()))
        }
        Err(err) if is_foreign_key_violation(&err) => Ok(None),
        Err(err) => Err(err).context("failed to insert expense"),
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}
