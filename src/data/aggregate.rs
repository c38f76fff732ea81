use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use super::model::{CategoricalColumn, IncidentRecord, IncidentTable};

/// Canonical display order for priorities.
pub const PRIORITY_ORDER: [&str; 4] = ["1 - Critical", "2 - High", "3 - Moderate", "4 - Low"];

/// How many categories the category chart keeps.
pub const TOP_CATEGORIES: usize = 10;

// ---------------------------------------------------------------------------
// AggregateView – ordered key → count pairs
// ---------------------------------------------------------------------------

/// Keyed counts in presentation order: count-descending for states and
/// categories, [`PRIORITY_ORDER`] for priorities, ascending for days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateView<K> {
    pub entries: Vec<(K, usize)>,
}

impl<K> AggregateView<K> {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(_, n)| n)
    }

    /// Largest single count, 0 when empty.
    pub fn max_count(&self) -> usize {
        self.counts().max().unwrap_or(0)
    }
}

/// Group non-empty values of `column` and sort by descending count. The sort
/// is stable over first appearance so equal counts come out deterministically.
fn value_counts(table: &IncidentTable, column: CategoricalColumn) -> Vec<(String, usize)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for rec in &table.records {
        let value = column.value(rec);
        if value.is_empty() {
            continue;
        }
        match slots.get(value) {
            Some(&slot) => entries[slot].1 += 1,
            None => {
                slots.insert(value, entries.len());
                entries.push((value.to_string(), 1));
            }
        }
    }

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Rows per incident state, most frequent first.
pub fn state_counts(table: &IncidentTable) -> AggregateView<String> {
    AggregateView {
        entries: value_counts(table, CategoricalColumn::IncidentState),
    }
}

/// The `top_n` most frequent categories.
pub fn category_counts(table: &IncidentTable, top_n: usize) -> AggregateView<String> {
    let mut entries = value_counts(table, CategoricalColumn::Category);
    entries.truncate(top_n);
    AggregateView { entries }
}

/// Rows per priority in [`PRIORITY_ORDER`]. Priorities outside the canonical
/// list are kept and placed after it, most frequent first, so the counts
/// still add up to every row with a priority.
pub fn priority_distribution(table: &IncidentTable) -> AggregateView<String> {
    let mut entries = value_counts(table, CategoricalColumn::Priority);
    entries.sort_by_key(|(priority, _)| priority_rank(priority));
    AggregateView { entries }
}

fn priority_rank(priority: &str) -> usize {
    PRIORITY_ORDER
        .iter()
        .position(|&p| p == priority)
        .unwrap_or(PRIORITY_ORDER.len())
}

/// Rows per calendar day of `opened_at`, oldest first. Rows without a parsed
/// `opened_at` are not counted.
pub fn opened_per_day(table: &IncidentTable) -> AggregateView<NaiveDate> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in table.records.iter().filter_map(IncidentRecord::opened_date) {
        *per_day.entry(date).or_default() += 1;
    }
    AggregateView {
        entries: per_day.into_iter().collect(),
    }
}

// ---------------------------------------------------------------------------
// Scalar metrics
// ---------------------------------------------------------------------------

/// Headline numbers, all counted in unique incident numbers rather than rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMetrics {
    pub total_incidents: usize,
    pub active_incidents: usize,
    pub resolved_incidents: usize,
    pub closed_incidents: usize,
}

pub fn key_metrics(table: &IncidentTable) -> KeyMetrics {
    let rows = || table.records.iter();
    KeyMetrics {
        total_incidents: unique_numbers(rows()),
        active_incidents: unique_numbers(rows().filter(|r| r.active)),
        resolved_incidents: unique_numbers(rows().filter(|r| r.incident_state == "Resolved")),
        closed_incidents: unique_numbers(rows().filter(|r| r.incident_state == "Closed")),
    }
}

fn unique_numbers<'a>(rows: impl Iterator<Item = &'a IncidentRecord>) -> usize {
    rows.map(|r| r.number.as_str()).collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{row, table_from};
    use anyhow::Result;

    fn keys<K: Clone>(view: &AggregateView<K>) -> Vec<K> {
        view.keys().cloned().collect()
    }

    #[test]
    fn state_counts_sum_to_row_count() -> Result<()> {
        let table = table_from(&[
            row("INC001", "New", "2 - High"),
            row("INC001", "Active", "2 - High"),
            row("INC002", "New", "3 - Moderate"),
            row("INC003", "Closed", "4 - Low"),
            row("INC004", "New", "4 - Low"),
        ])?;

        let view = state_counts(&table);
        assert_eq!(view.total(), table.len());
        assert_eq!(view.entries[0], ("New".to_string(), 3));
        // Active and Closed tie; Active appeared first.
        assert_eq!(keys(&view), vec!["New", "Active", "Closed"]);
        Ok(())
    }

    #[test]
    fn blank_states_are_left_out_of_state_counts() -> Result<()> {
        let table = table_from(&[
            row("INC001", "New", "2 - High"),
            row("INC002", "", "2 - High"),
            row("INC003", "Closed", "4 - Low"),
        ])?;

        let view = state_counts(&table);
        assert_eq!(keys(&view), vec!["New", "Closed"]);
        let blank_rows = table.records.iter().filter(|r| r.incident_state.is_empty()).count();
        assert_eq!(view.total(), table.len() - blank_rows);
        assert_eq!(view.total(), 2);
        Ok(())
    }

    #[test]
    fn category_counts_keep_top_groups() -> Result<()> {
        let mut rows = Vec::new();
        let names: Vec<String> = (0..12).map(|i| format!("Category {i}")).collect();
        let numbers: Vec<String> = (0..200).map(|i| format!("INC{i:04}")).collect();
        let mut n = 0;
        for (i, name) in names.iter().enumerate() {
            // Category i appears i + 1 times.
            for _ in 0..=i {
                rows.push((
                    numbers[n].as_str(),
                    "01/01/2024 09:00",
                    name.as_str(),
                    "3 - Moderate",
                    "New",
                    "Ops",
                    "true",
                ));
                n += 1;
            }
        }
        let table = table_from(&rows)?;

        let view = category_counts(&table, TOP_CATEGORIES);
        assert_eq!(view.len(), 10);
        assert_eq!(view.entries[0], ("Category 11".to_string(), 12));
        let smallest_kept = view.counts().min().unwrap_or(0);
        assert!(smallest_kept >= 3, "excluded groups have counts 1 and 2");
        assert!(!view.keys().any(|k| k == "Category 0" || k == "Category 1"));
        Ok(())
    }

    #[test]
    fn priorities_follow_canonical_order() -> Result<()> {
        let mut rows = Vec::new();
        rows.extend((0..5).map(|_| row("INC001", "New", "2 - High")));
        rows.extend((0..3).map(|_| row("INC002", "New", "1 - Critical")));
        rows.push(row("INC003", "New", "4 - Low"));
        let table = table_from(&rows)?;

        let view = priority_distribution(&table);
        assert_eq!(keys(&view), vec!["1 - Critical", "2 - High", "4 - Low"]);
        assert_eq!(view.counts().collect::<Vec<_>>(), vec![3, 5, 1]);
        Ok(())
    }

    #[test]
    fn unknown_priorities_are_appended_not_dropped() -> Result<()> {
        let table = table_from(&[
            row("INC001", "New", "Urgent"),
            row("INC002", "New", "3 - Moderate"),
            row("INC003", "New", "Someday"),
            row("INC004", "New", "Someday"),
            row("INC005", "New", ""),
        ])?;

        let view = priority_distribution(&table);
        assert_eq!(keys(&view), vec!["3 - Moderate", "Someday", "Urgent"]);
        assert_eq!(view.total(), 4, "blank priority is not counted");
        Ok(())
    }

    #[test]
    fn opened_per_day_is_chronological() -> Result<()> {
        let table = table_from(&[
            ("INC001", "03/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC002", "01/01/2024 10:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC003", "03/01/2024 23:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC004", "?", "Network", "2 - High", "New", "Ops", "true"),
        ])?;

        let view = opened_per_day(&table);
        let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).expect("date");
        assert_eq!(view.entries, vec![(jan(1), 1), (jan(3), 2)]);
        Ok(())
    }

    #[test]
    fn metrics_count_unique_incidents() -> Result<()> {
        let table = table_from(&[
            ("INC001", "01/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC001", "01/01/2024 09:00", "Network", "2 - High", "Resolved", "Ops", "false"),
        ])?;

        let metrics = key_metrics(&table);
        assert_eq!(metrics.total_incidents, 1);
        assert_eq!(metrics.resolved_incidents, 1);
        assert_eq!(metrics.active_incidents, 1);
        assert_eq!(metrics.closed_incidents, 0);
        Ok(())
    }

    #[test]
    fn empty_table_gives_empty_views() -> Result<()> {
        let table = table_from(&[])?;
        assert!(state_counts(&table).is_empty());
        assert!(category_counts(&table, TOP_CATEGORIES).is_empty());
        assert!(priority_distribution(&table).is_empty());
        assert!(opened_per_day(&table).is_empty());
        assert_eq!(key_metrics(&table), KeyMetrics::default());
        Ok(())
    }
}
