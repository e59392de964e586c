//! Expense aggregation: a single order-independent pass over scoped rows.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

use super::storage::ExpenseRow;

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct CategoryGroup {
    pub categoria: String,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct TripGroup {
    pub trasferta: String,
    pub progetto: Option<String>,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct StatusGroup {
    pub stato: String,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct ProjectGroup {
    pub progetto: String,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_spese: f64,
    pub total_budget: f64,
    pub spese_by_categoria: Vec<CategoryGroup>,
    pub spese_by_trasferta: Vec<TripGroup>,
    /// Approval-state breakdown, computed for non-admin callers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spese_by_stato: Option<Vec<StatusGroup>>,
    pub spese_by_progetto: Vec<ProjectGroup>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BudgetHealth {
    Healthy,
    OverBudget,
}

impl Stats {
    /// Informational only; nothing stops spending past the budget.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.total_budget - self.total_spese
    }

    #[must_use]
    pub fn budget_health(&self) -> BudgetHealth {
        if self.remaining() > 0.0 {
            BudgetHealth::Healthy
        } else {
            BudgetHealth::OverBudget
        }
    }
}

/// Running totals per group key, preserving first-occurrence order.
#[derive(Default)]
struct Accumulator {
    order: Vec<String>,
    totals: HashMap<String, (f64, u64)>,
}

impl Accumulator {
    fn add(&mut self, key: &str, amount: f64) {
        if let Some((total, count)) = self.totals.get_mut(key) {
            *total += amount;
            *count += 1;
        } else {
            self.order.push(key.to_string());
            self.totals.insert(key.to_string(), (amount, 1));
        }
    }

    fn into_groups<T>(mut self, build: impl Fn(String, f64, u64) -> T) -> Vec<T> {
        self.order
            .drain(..)
            .filter_map(|key| {
                let (total, count) = self.totals.remove(&key)?;
                Some(build(key, total, count))
            })
            .collect()
    }
}

/// Reduce scoped expense rows into the report shape.
///
/// Amounts that failed to parse count as zero rather than failing the whole
/// report. Each trip's budget is counted once no matter how many rows the trip
/// contributes. Rows with a null key for a dimension are excluded from that
/// dimension's groups but still count toward the total.
#[must_use]
pub(crate) fn compute(rows: &[ExpenseRow], is_admin: bool) -> Stats {
    let mut total_spese = 0.0;
    let mut total_budget = 0.0;
    let mut counted_trips: HashSet<i32> = HashSet::new();

    let mut by_categoria = Accumulator::default();
    let mut by_trasferta = Accumulator::default();
    let mut by_stato = Accumulator::default();
    let mut by_progetto = Accumulator::default();
    let mut trip_projects: HashMap<String, Option<String>> = HashMap::new();

    for row in rows {
        let amount = row.amount.unwrap_or(0.0);
        total_spese += amount;

        if let (Some(trip_id), Some(budget)) = (row.trip_id, row.budget) {
            if counted_trips.insert(trip_id) {
                total_budget += budget;
            }
        }

        if let Some(categoria) = row.category_name.as_deref() {
            by_categoria.add(categoria, amount);
        }
        if let Some(trasferta) = row.trip_name.as_deref() {
            by_trasferta.add(trasferta, amount);
            trip_projects
                .entry(trasferta.to_string())
                .or_insert_with(|| row.project_name.clone());
        }
        if !is_admin {
            if let Some(stato) = row.status.as_deref() {
                by_stato.add(stato, amount);
            }
        }
        if let Some(progetto) = row.project_name.as_deref() {
            by_progetto.add(progetto, amount);
        }
    }

    let spese_by_trasferta = by_trasferta.into_groups(|trasferta, total, count| {
        let progetto = trip_projects.get(&trasferta).cloned().flatten();
        TripGroup {
            trasferta,
            progetto,
            total,
            count,
        }
    });

    Stats {
        total_spese,
        total_budget,
        spese_by_categoria: by_categoria.into_groups(|categoria, total, count| CategoryGroup {
            categoria,
            total,
            count,
        }),
        spese_by_trasferta,
        spese_by_stato: if is_admin {
            None
        } else {
            Some(by_stato.into_groups(|stato, total, count| StatusGroup { stato, total, count }))
        },
        spese_by_progetto: by_progetto.into_groups(|progetto, total, count| ProjectGroup {
            progetto,
            total,
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        trip_id: i32,
        trip: &str,
        project: &str,
        category: &str,
        status: &str,
        amount: f64,
        budget: f64,
    ) -> ExpenseRow {
        ExpenseRow {
            trip_id: Some(trip_id),
            trip_name: Some(trip.to_string()),
            project_name: Some(project.to_string()),
            category_name: Some(category.to_string()),
            status: Some(status.to_string()),
            amount: Some(amount),
            budget: Some(budget),
        }
    }

    /// Order-insensitive view of a group list.
    fn as_set<'a, I>(groups: I) -> HashSet<(String, String, u64)>
    where
        I: IntoIterator<Item = (&'a str, f64, u64)>,
    {
        groups
            .into_iter()
            .map(|(key, total, count)| (key.to_string(), format!("{total:.2}"), count))
            .collect()
    }

    #[test]
    fn worked_example_totals_and_groups() {
        let rows = vec![
            row(1, "A", "P1", "Travel", "approvata", 100.0, 500.0),
            row(1, "A", "P1", "Meals", "presentata", 50.0, 500.0),
        ];
        let stats = compute(&rows, true);

        assert!((stats.total_spese - 150.0).abs() < f64::EPSILON);
        assert!((stats.total_budget - 500.0).abs() < f64::EPSILON);

        let categories = as_set(
            stats
                .spese_by_categoria
                .iter()
                .map(|g| (g.categoria.as_str(), g.total, g.count)),
        );
        assert_eq!(
            categories,
            as_set([("Travel", 100.0, 1), ("Meals", 50.0, 1)])
        );

        let trips = as_set(
            stats
                .spese_by_trasferta
                .iter()
                .map(|g| (g.trasferta.as_str(), g.total, g.count)),
        );
        assert_eq!(trips, as_set([("A", 150.0, 2)]));
        assert_eq!(
            stats.spese_by_trasferta[0].progetto.as_deref(),
            Some("P1")
        );
    }

    #[test]
    fn budget_counted_once_per_trip() {
        let rows = vec![
            row(1, "A", "P1", "Travel", "approvata", 10.0, 500.0),
            row(1, "A", "P1", "Travel", "approvata", 10.0, 500.0),
            row(2, "B", "P1", "Travel", "approvata", 10.0, 300.0),
        ];
        let stats = compute(&rows, true);
        assert!((stats.total_budget - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn status_breakdown_only_for_non_admins() {
        let rows = vec![
            row(1, "A", "P1", "Travel", "approvata", 100.0, 500.0),
            row(1, "A", "P1", "Meals", "presentata", 50.0, 500.0),
        ];

        let admin = compute(&rows, true);
        assert_eq!(admin.spese_by_stato, None);

        let employee = compute(&rows, false);
        let by_stato = employee.spese_by_stato.unwrap_or_default();
        let states = as_set(
            by_stato
                .iter()
                .map(|g| (g.stato.as_str(), g.total, g.count)),
        );
        assert_eq!(
            states,
            as_set([("approvata", 100.0, 1), ("presentata", 50.0, 1)])
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![
            row(1, "A", "P1", "Travel", "approvata", 12.34, 100.0),
            row(2, "B", "P2", "Meals", "respinta", 56.78, 200.0),
        ];
        let first = compute(&rows, false);
        let second = compute(&rows, false);
        assert_eq!(first, second);
    }

    #[test]
    fn unparseable_amount_counts_as_zero() {
        let mut bad = row(1, "A", "P1", "Travel", "approvata", 0.0, 500.0);
        bad.amount = None;
        let rows = vec![bad, row(1, "A", "P1", "Meals", "approvata", 40.0, 500.0)];
        let stats = compute(&rows, true);
        assert!((stats.total_spese - 40.0).abs() < f64::EPSILON);
        assert_eq!(stats.spese_by_categoria.len(), 2);
    }

    #[test]
    fn null_keys_excluded_per_dimension_but_kept_in_total() {
        let mut uncategorized = row(1, "A", "P1", "Travel", "approvata", 25.0, 500.0);
        uncategorized.category_name = None;
        let stats = compute(&[uncategorized], true);
        assert!((stats.total_spese - 25.0).abs() < f64::EPSILON);
        assert!(stats.spese_by_categoria.is_empty());
        assert_eq!(stats.spese_by_trasferta.len(), 1);
    }

    #[test]
    fn groups_keep_first_occurrence_order() {
        let rows = vec![
            row(1, "A", "P1", "Meals", "approvata", 1.0, 10.0),
            row(2, "B", "P2", "Travel", "approvata", 2.0, 10.0),
            row(1, "A", "P1", "Meals", "approvata", 3.0, 10.0),
        ];
        let stats = compute(&rows, true);
        let keys: Vec<&str> = stats
            .spese_by_categoria
            .iter()
            .map(|g| g.categoria.as_str())
            .collect();
        assert_eq!(keys, vec!["Meals", "Travel"]);
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let stats = compute(&[], false);
        assert!(stats.total_spese.abs() < f64::EPSILON);
        assert!(stats.total_budget.abs() < f64::EPSILON);
        assert!(stats.spese_by_categoria.is_empty());
        assert_eq!(stats.spese_by_stato, Some(Vec::new()));
    }

    #[test]
    fn remaining_budget_classification() {
        let healthy = compute(&[row(1, "A", "P1", "Travel", "approvata", 100.0, 500.0)], true);
        assert!((healthy.remaining() - 400.0).abs() < f64::EPSILON);
        assert_eq!(healthy.budget_health(), BudgetHealth::Healthy);

        let over = compute(&[row(1, "A", "P1", "Travel", "approvata", 600.0, 500.0)], true);
        assert!((over.remaining() + 100.0).abs() < f64::EPSILON);
        assert_eq!(over.budget_health(), BudgetHealth::OverBudget);
    }

    #[test]
    fn wire_names_match_the_report_payload() -> anyhow::Result<()> {
        let stats = compute(
            &[row(1, "A", "P1", "Travel", "approvata", 100.0, 500.0)],
            false,
        );
        let value = serde_json::to_value(&stats)?;
        assert!(value.get("totalSpese").is_some());
        assert!(value.get("totalBudget").is_some());
        assert!(value.get("speseByCategoria").is_some());
        assert!(value.get("speseByTrasferta").is_some());
        assert!(value.get("speseByStato").is_some());
        assert!(value.get("speseByProgetto").is_some());
        Ok(())
    }

    #[test]
    fn admin_payload_omits_status_breakdown() -> anyhow::Result<()> {
        let stats = compute(
            &[row(1, "A", "P1", "Travel", "approvata", 100.0, 500.0)],
            true,
        );
        let value = serde_json::to_value(&stats)?;
        assert!(value.get("speseByStato").is_none());
        Ok(())
    }
}
