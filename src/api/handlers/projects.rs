//! Project lookup list.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::{error, Instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgettoResponse {
    pub id_progetto: i32,
    pub nome: String,
    pub data_inizio: String,
    pub data_fine: Option<String>,
}

async fn fetch_projects(pool: &PgPool) -> Result<Vec<ProgettoResponse>> {
    let query = r"
        SELECT id_progetto,
               nome,
               data_inizio::text AS data_inizio,
               data_fine::text AS data_fine
        FROM progetti
        ORDER BY data_inizio DESC
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
        .context("failed to fetch projects")?;

    rows.iter()
        .map(|row| {
            Ok(ProgettoResponse {
                id_progetto: row
                    .try_get("id_progetto")
                    .context("missing id_progetto column")?,
                nome: row.try_get("nome").context("missing nome column")?,
                data_inizio: row
                    .try_get("data_inizio")
                    .context("missing data_inizio column")?,
                data_fine: row.try_get("data_fine").context("missing data_fine column")?,
            })
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/progetti",
    responses(
        (status = 200, description = "All projects", body = [ProgettoResponse]),
        (status = 401, description = "Missing or invalid session"),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "progetti"
)]
pub async fn list_projects(pool: Extension<PgPool>) -> Response {
    match fetch_projects(&pool).await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(err) => {
            error!("Failed to fetch projects: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore durante il recupero dei progetti.",
            )
                .into_response()
        }
    }
}
