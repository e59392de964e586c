//! Report endpoint: role-scoped expense aggregation.

pub mod stats;
pub(crate) mod storage;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;

use self::stats::Stats;
use crate::api::handlers::auth::Identity;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub stats: Stats,
    pub is_admin: bool,
}

#[utoipa::path(
    get,
    path = "/report",
    responses(
        (status = 200, description = "Aggregated expense report for the caller", body = ReportResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 500, description = "Unexpected fault", body = String)
    ),
    tag = "report"
)]
pub async fn report(pool: Extension<PgPool>, identity: Extension<Identity>) -> Response {
    let rows = match storage::fetch_expense_rows(&pool, &identity).await {
        Ok(rows) => rows,
        Err(err) => {
            error!("Failed to fetch report rows: {err:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Errore del server").into_response();
        }
    };

    let stats = stats::compute(&rows, identity.is_admin);
    let response = ReportResponse {
        stats,
        is_admin: identity.is_admin,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::storage::ExpenseRow;

    #[test]
    fn report_payload_wraps_stats_with_is_admin() -> anyhow::Result<()> {
        let rows = vec![ExpenseRow {
            trip_id: Some(1),
            trip_name: Some("Milano".to_string()),
            project_name: Some("Apollo".to_string()),
            category_name: Some("Viaggio".to_string()),
            status: Some("approvata".to_string()),
            amount: Some(120.0),
            budget: Some(1000.0),
        }];
        let response = ReportResponse {
            stats: stats::compute(&rows, false),
            is_admin: false,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["isAdmin"], false);
        assert_eq!(value["stats"]["totalSpese"], 120.0);
        assert_eq!(value["stats"]["totalBudget"], 1000.0);
        Ok(())
    }
}
