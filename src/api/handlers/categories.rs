//! Expense-category lookup list.

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
pub struct CategoriaResponse {
    pub id_categoria: i32,
    pub nome: String,
}

async fn fetch_categories(pool: &PgPool) -> Result<Vec<CategoriaResponse>> {
    let query = "SELECT id_categoria, nome FROM categorie_spese ORDER BY nome";
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
        .context("failed to fetch categories")?;

    rows.iter()
        .map(|row| {
            Ok(CategoriaResponse {
                id_categoria: row
                    .try_get("id_categoria")
                    .context("missing id_categoria column")?,
                nome: row.try_get("nome").context("missing nome column")?,
            })
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/categorie",
    responses(
        (status = 200, description = "All expense categories", body = [CategoriaResponse]),
        (status = 401, description = "Missing or invalid session"),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "categorie"
)]
pub async fn list_categories(pool: Extension<PgPool>) -> Response {
    match fetch_categories(&pool).await {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(err) => {
            error!("Failed to fetch categories: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore durante il recupero delle categorie.",
            )
                .into_response()
        }
    }
}
