use chrono::NaiveDate;

use super::aggregate::{
    category_counts, key_metrics, opened_per_day, priority_distribution, state_counts,
    AggregateView, KeyMetrics, TOP_CATEGORIES,
};
use super::filter::{filter_table, FilterSpec};
use super::model::{IncidentRecord, IncidentTable};

/// Knobs for building a [`DashboardView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Rows shown in the preview grid.
    pub preview_rows: usize,
    /// Categories kept in the category chart.
    pub top_categories: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            preview_rows: 100,
            top_categories: TOP_CATEGORIES,
        }
    }
}

/// Everything the dashboard draws for one filter state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub filtered: IncidentTable,
    pub metrics: KeyMetrics,
    pub state_counts: AggregateView<String>,
    pub category_counts: AggregateView<String>,
    pub priority: AggregateView<String>,
    pub opened_per_day: AggregateView<NaiveDate>,
    pub preview_rows: usize,
}

impl DashboardView {
    /// The first rows of the filtered table.
    pub fn preview(&self) -> &[IncidentRecord] {
        let n = self.preview_rows.min(self.filtered.len());
        &self.filtered.records[..n]
    }
}

/// Run filter and aggregation for one input state. Holds no state between
/// calls; the host re-invokes it whenever an input changes.
pub fn render(table: &IncidentTable, spec: &FilterSpec, options: &ViewOptions) -> DashboardView {
    let filtered = filter_table(table, spec);
    DashboardView {
        metrics: key_metrics(&filtered),
        state_counts: state_counts(&filtered),
        category_counts: category_counts(&filtered, options.top_categories),
        priority: priority_distribution(&filtered),
        opened_per_day: opened_per_day(&filtered),
        preview_rows: options.preview_rows,
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{row, table_from};
    use crate::data::model::CategoricalColumn;
    use anyhow::Result;
    use std::collections::BTreeSet;

    #[test]
    fn render_aggregates_the_filtered_rows() -> Result<()> {
        let table = table_from(&[
            row("INC001", "New", "2 - High"),
            row("INC001", "Resolved", "2 - High"),
            row("INC002", "Closed", "1 - Critical"),
            row("INC003", "New", "4 - Low"),
        ])?;
        let mut spec = FilterSpec::for_table(&table);
        spec.selections.insert(
            CategoricalColumn::Priority,
            BTreeSet::from(["2 - High".to_string(), "1 - Critical".to_string()]),
        );

        let view = render(&table, &spec, &ViewOptions::default());
        assert_eq!(view.filtered.len(), 3);
        assert_eq!(view.state_counts.total(), 3);
        assert_eq!(view.metrics.total_incidents, 2);
        assert_eq!(view.metrics.closed_incidents, 1);
        let priorities: Vec<&str> = view.priority.keys().map(String::as_str).collect();
        assert_eq!(priorities, vec!["1 - Critical", "2 - High"]);
        Ok(())
    }

    #[test]
    fn preview_is_capped() -> Result<()> {
        let table = table_from(&[
            row("INC001", "New", "2 - High"),
            row("INC002", "New", "2 - High"),
            row("INC003", "New", "2 - High"),
        ])?;
        let options = ViewOptions {
            preview_rows: 2,
            ..ViewOptions::default()
        };

        let view = render(&table, &FilterSpec::for_table(&table), &options);
        assert_eq!(view.preview().len(), 2);
        assert_eq!(view.preview()[1].number, "INC002");
        Ok(())
    }

    #[test]
    fn empty_result_is_not_an_error() -> Result<()> {
        let table = table_from(&[row("INC001", "New", "2 - High")])?;
        let mut spec = FilterSpec::for_table(&table);
        spec.selections.insert(CategoricalColumn::IncidentState, BTreeSet::new());

        let view = render(&table, &spec, &ViewOptions::default());
        assert!(view.filtered.is_empty());
        assert!(view.preview().is_empty());
        assert_eq!(view.metrics, KeyMetrics::default());
        Ok(())
    }
}
