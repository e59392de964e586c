//! Scoped expense row fetching for the report.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;

use crate::api::handlers::auth::Identity;

/// One expense row joined to its trip, project, and category labels.
///
/// Amounts arrive as text from the database and are parsed here; a value that
/// does not parse becomes `None` so a single bad record cannot sink the report.
#[derive(Debug)]
pub(crate) struct ExpenseRow {
    pub(crate) trip_id: Option<i32>,
    pub(crate) trip_name: Option<String>,
    pub(crate) project_name: Option<String>,
    pub(crate) category_name: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) amount: Option<f64>,
    pub(crate) budget: Option<f64>,
}

pub(crate) fn parse_amount(text: Option<&str>) -> Option<f64> {
    text.and_then(|value| value.trim().parse::<f64>().ok())
}

fn map_row(row: &PgRow) -> Result<ExpenseRow> {
    let amount: Option<String> = row.try_get("importo").context("missing importo column")?;
    let budget: Option<String> = row.try_get("budget").context("missing budget column")?;
    Ok(ExpenseRow {
        trip_id: row
            .try_get("id_trasferta")
            .context("missing id_trasferta column")?,
        trip_name: row.try_get("trasferta").context("missing trasferta column")?,
        project_name: row.try_get("progetto").context("missing progetto column")?,
        category_name: row.try_get("categoria").context("missing categoria column")?,
        status: row.try_get("stato").context("missing stato column")?,
        amount: parse_amount(amount.as_deref()),
        budget: parse_amount(budget.as_deref()),
    })
}

/// Fetch the expense rows the caller may see.
///
/// Administrators see every non-deleted expense; everyone else sees expenses
/// they submitted or expenses on trips they are responsible for.
pub(crate) async fn fetch_expense_rows(
    pool: &PgPool,
    identity: &Identity,
) -> Result<Vec<ExpenseRow>> {
    let rows = if identity.is_admin {
        let query = r"
            SELECT t.id_trasferta,
                   t.luogo AS trasferta,
                   p.nome AS progetto,
                   c.nome AS categoria,
                   s.stato_approvazione AS stato,
                   s.importo::text AS importo,
                   t.budget::text AS budget
            FROM spese s
            JOIN trasferte t ON t.id_trasferta = s.id_trasferta
            LEFT JOIN progetti p ON p.id_progetto = t.id_progetto
            LEFT JOIN categorie_spese c ON c.id_categoria = s.id_categoria
            WHERE s.is_deleted = FALSE
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
            .context("failed to fetch expense rows")?
    } else {
        let query = r"
            SELECT t.id_trasferta,
                   t.luogo AS trasferta,
                   p.nome AS progetto,
                   c.nome AS categoria,
                   s.stato_approvazione AS stato,
                   s.importo::text AS importo,
                   t.budget::text AS budget
            FROM spese s
            JOIN trasferte t ON t.id_trasferta = s.id_trasferta
            LEFT JOIN progetti p ON p.id_progetto = t.id_progetto
            LEFT JOIN categorie_spese c ON c.id_categoria = s.id_categoria
            WHERE s.is_deleted = FALSE
              AND (t.id_responsabile = $1 OR s.id_dipendente = $1)
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
            .context("failed to fetch expense rows")?
    };

    rows.iter().map(map_row).collect()
}
