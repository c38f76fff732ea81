use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{CategoricalColumn, IncidentRecord, IncidentTable};

// ---------------------------------------------------------------------------
// DateRange – inclusive interval over `opened_at`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Inclusive range; reversed bounds are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange { start, end }
        } else {
            DateRange {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – what the user has chosen
// ---------------------------------------------------------------------------

/// User constraints over the table, combined with logical AND.
///
/// * `opened`: `None` means no date constraint; otherwise rows whose
///   `opened_at` is missing can never match.
/// * `selections`: column → allowed values. A column absent from the map is
///   unconstrained; an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub opened: Option<DateRange>,
    pub selections: BTreeMap<CategoricalColumn, BTreeSet<String>>,
}

impl FilterSpec {
    /// The "show everything" spec for a table: the full span of opened dates
    /// and every distinct value selected in each column.
    pub fn for_table(table: &IncidentTable) -> Self {
        let opened = table
            .opened_bounds()
            .map(|(start, end)| DateRange::new(start, end));
        let selections = CategoricalColumn::ALL
            .iter()
            .map(|&col| (col, table.distinct_values(col).clone()))
            .collect();
        FilterSpec { opened, selections }
    }

    /// Allowed values for `column`, if it is constrained.
    pub fn selection(&self, column: CategoricalColumn) -> Option<&BTreeSet<String>> {
        self.selections.get(&column)
    }

    /// Whether a single row satisfies every constraint.
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        if let Some(range) = &self.opened {
            match record.opened_date() {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }
        self.selections
            .iter()
            .all(|(col, allowed)| allowed.contains(col.value(record)))
    }
}

// ---------------------------------------------------------------------------
// Applying a FilterSpec
// ---------------------------------------------------------------------------

/// Indices of rows passing `spec`, in table order.
pub fn filtered_indices(table: &IncidentTable, spec: &FilterSpec) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| spec.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// The maximal subsequence of `table` satisfying `spec`, same schema.
pub fn filter_table(table: &IncidentTable, spec: &FilterSpec) -> IncidentTable {
    let indices = filtered_indices(table, spec);
    log::debug!("Filter matched {} of {} rows", indices.len(), table.len());
    table.subset(&indices)
}
