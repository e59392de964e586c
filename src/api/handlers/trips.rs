//! Business-trip listing.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, Instrument};
use utoipa::ToSchema;

use super::report::storage::parse_amount;

#[derive(Debug, Serialize, ToSchema)]
pub struct TrasfertaResponse {
    pub id_trasferta: i32,
    pub uuid_trasferta: String,
    pub luogo: String,
    pub data_inizio: String,
    pub data_fine: Option<String>,
    pub budget: Option<f64>,
    pub motivo_viaggio: Option<String>,
    pub note: Option<String>,
    pub nome_progetto: String,
    pub nome_responsabile: String,
}

fn map_row(row: &PgRow) -> Result<TrasfertaResponse> {
    let uuid: uuid::Uuid = row
        .try_get("uuid_trasferta")
        .context("missing uuid_trasferta column")?;
    let budget: Option<String> = row.try_get("budget").context("missing budget column")?;
    Ok(TrasfertaResponse {
        id_trasferta: row
            .try_get("id_trasferta")
            .context("missing id_trasferta column")?,
        uuid_trasferta: uuid.to_string(),
        luogo: row.try_get("luogo").context("missing luogo column")?,
        data_inizio: row
            .try_get("data_inizio")
            .context("missing data_inizio column")?,
        data_fine: row.try_get("data_fine").context("missing data_fine column")?,
        budget: parse_amount(budget.as_deref()),
        motivo_viaggio: row
            .try_get("motivo_viaggio")
            .context("missing motivo_viaggio column")?,
        note: row.try_get("note").context("missing note column")?,
        nome_progetto: row
            .try_get("nome_progetto")
            .context("missing nome_progetto column")?,
        nome_responsabile: row
            .try_get("nome_responsabile")
            .context("missing nome_responsabile column")?,
    })
}

async fn fetch_trips(pool: &PgPool) -> Result<Vec<TrasfertaResponse>> {
    let query = r"
        SELECT t.id_trasferta,
               t.uuid_trasferta,
               t.luogo,
               t.data_inizio::text AS data_inizio,
               t.data_fine::text AS data_fine,
               t.budget::text AS budget,
               t.motivo_viaggio,
               t.note,
               p.nome AS nome_progetto,
               d.nome || ' ' || d.cognome AS nome_responsabile
        FROM trasferte t
        JOIN progetti p ON t.id_progetto = p.id_progetto
        JOIN dipendenti d ON t.id_responsabile = d.id_dipendente
        ORDER BY t.data_inizio DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch trips")?;

    rows.iter().map(map_row).collect()
}

#[utoipa::path(
    get,
    path = "/trasferte",
    responses(
        (status = 200, description = "All business trips, newest first", body = [TrasfertaResponse]),
        (status = 401, description = "Missing or invalid session"),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "trasferte"
)]
pub async fn list_trips(pool: Extension<PgPool>) -> Response {
    match fetch_trips(&pool).await {
        Ok(trips) => (StatusCode::OK, Json(trips)).into_response(),
        Err(err) => {
            error!("Failed to fetch trips: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore durante il recupero delle trasferte.",
            )
                .into_response()
        }
    }
}
