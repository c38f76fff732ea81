use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::loader::{deserialize_flag, deserialize_timestamp};

/// Columns every incident log must provide.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "number",
    "opened_at",
    "sys_created_at",
    "sys_updated_at",
    "resolved_at",
    "closed_at",
    "category",
    "priority",
    "incident_state",
    "assignment_group",
    "active",
];

/// Columns coerced to timestamps at load time.
pub const TIMESTAMP_COLUMNS: [&str; 5] = [
    "opened_at",
    "sys_created_at",
    "sys_updated_at",
    "resolved_at",
    "closed_at",
];

// ---------------------------------------------------------------------------
// CategoricalColumn – the columns users can filter and group by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalColumn {
    IncidentState,
    Category,
    Priority,
    AssignmentGroup,
}

impl CategoricalColumn {
    /// Sidebar order.
    pub const ALL: [CategoricalColumn; 4] = [
        CategoricalColumn::IncidentState,
        CategoricalColumn::Category,
        CategoricalColumn::Priority,
        CategoricalColumn::AssignmentGroup,
    ];

    /// Header name in the source file.
    pub fn name(self) -> &'static str {
        match self {
            CategoricalColumn::IncidentState => "incident_state",
            CategoricalColumn::Category => "category",
            CategoricalColumn::Priority => "priority",
            CategoricalColumn::AssignmentGroup => "assignment_group",
        }
    }

    /// Human-readable label for widgets and chart axes.
    pub fn label(self) -> &'static str {
        match self {
            CategoricalColumn::IncidentState => "Incident State",
            CategoricalColumn::Category => "Category",
            CategoricalColumn::Priority => "Priority",
            CategoricalColumn::AssignmentGroup => "Assignment Group",
        }
    }

    /// The raw cell text of this column for `record`.
    pub fn value(self, record: &IncidentRecord) -> &str {
        match self {
            CategoricalColumn::IncidentState => &record.incident_state,
            CategoricalColumn::Category => &record.category,
            CategoricalColumn::Priority => &record.priority,
            CategoricalColumn::AssignmentGroup => &record.assignment_group,
        }
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label used wherever an empty categorical cell has to be shown.
pub const MISSING_LABEL: &str = "(blank)";

/// Display text for a categorical value, substituting [`MISSING_LABEL`] for
/// empty cells.
pub fn display_value(value: &str) -> &str {
    if value.is_empty() {
        MISSING_LABEL
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// IncidentRecord – one row of the event log
// ---------------------------------------------------------------------------

/// A single event-log row. An incident usually spans several rows, one per
/// state change, all sharing the same `number`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncidentRecord {
    pub number: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub opened_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub sys_created_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub sys_updated_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub resolved_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub closed_at: Option<NaiveDateTime>,
    pub category: String,
    pub priority: String,
    pub incident_state: String,
    pub assignment_group: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub active: bool,
    /// Every cell of the row as read, in header order (for the preview grid).
    #[serde(skip)]
    pub cells: Vec<String>,
}

impl IncidentRecord {
    /// Calendar date the incident was opened, if the timestamp parsed.
    pub fn opened_date(&self) -> Option<NaiveDate> {
        self.opened_at.map(|ts| ts.date())
    }

    /// Parsed value of one of the [`TIMESTAMP_COLUMNS`]; `None` for any
    /// other column or an unparsed cell.
    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        match column {
            "opened_at" => self.opened_at,
            "sys_created_at" => self.sys_created_at,
            "sys_updated_at" => self.sys_updated_at,
            "resolved_at" => self.resolved_at,
            "closed_at" => self.closed_at,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// IncidentTable – the loaded log
// ---------------------------------------------------------------------------

/// An ordered set of rows with the schema fixed at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentTable {
    /// Header row of the source file, in file order.
    pub columns: Vec<String>,
    /// All rows, in file order.
    pub records: Vec<IncidentRecord>,
    /// For each categorical column the sorted set of distinct values.
    pub distinct: BTreeMap<CategoricalColumn, BTreeSet<String>>,
}

impl IncidentTable {
    /// Build the distinct-value index from the loaded rows.
    pub fn from_records(columns: Vec<String>, records: Vec<IncidentRecord>) -> Self {
        let mut distinct: BTreeMap<CategoricalColumn, BTreeSet<String>> = CategoricalColumn::ALL
            .iter()
            .map(|&col| (col, BTreeSet::new()))
            .collect();

        for rec in &records {
            for col in CategoricalColumn::ALL {
                distinct
                    .entry(col)
                    .or_default()
                    .insert(col.value(rec).to_string());
            }
        }

        IncidentTable {
            columns,
            records,
            distinct,
        }
    }

    /// A new table holding the rows at `indices`, same schema.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        IncidentTable::from_records(self.columns.clone(), records)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values seen in `column`.
    pub fn distinct_values(&self, column: CategoricalColumn) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.distinct.get(&column).unwrap_or(&EMPTY)
    }

    /// Earliest and latest `opened_at` calendar dates, ignoring missing ones.
    pub fn opened_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(IncidentRecord::opened_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Per-column non-null count, inferred kind and, for numeric columns,
    /// summary statistics; in header order.
    pub fn column_profiles(&self) -> Vec<ColumnProfile> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| self.profile_column(idx, name))
            .collect()
    }

    fn profile_column(&self, idx: usize, name: &str) -> ColumnProfile {
        let total = self.records.len();

        if TIMESTAMP_COLUMNS.contains(&name) {
            // Cells that did not parse count as missing.
            let non_null = self
                .records
                .iter()
                .filter(|rec| rec.timestamp(name).is_some())
                .count();
            return ColumnProfile {
                name: name.to_string(),
                kind: ColumnKind::Timestamp,
                non_null,
                missing: total - non_null,
                numeric: None,
            };
        }

        let present: Vec<&str> = self
            .records
            .iter()
            .filter_map(|rec| rec.cells.get(idx))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let values: Option<Vec<f64>> = present.iter().map(|c| c.parse::<f64>().ok()).collect();
        let numeric = values.and_then(NumericSummary::from_values);

        ColumnProfile {
            name: name.to_string(),
            kind: if numeric.is_some() {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            },
            non_null: present.len(),
            missing: total - present.len(),
            numeric,
        }
    }
}

// ---------------------------------------------------------------------------
// Column profiles – the dataset overview
// ---------------------------------------------------------------------------

/// Type inferred for a column from its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Timestamp,
    Text,
}

impl ColumnKind {
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub missing: usize,
    /// Present only for numeric columns.
    pub numeric: Option<NumericSummary>,
}

/// Descriptive statistics of a numeric column. `std` is the sample standard
/// deviation (`None` below two values); quartiles interpolate linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// `None` for an empty slice or non-finite values.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Some(NumericSummary {
            count,
            mean,
            std,
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[count - 1],
        })
    }
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(values: &[f64], p: f64) -> f64 {
    let pos = (values.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    values[lo] + (pos - lo as f64) * (values[hi] - values[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::table_from;
    use crate::data::loader::load_reader;

    #[test]
    fn distinct_values_cover_every_categorical_column() -> anyhow::Result<()> {
        let table = table_from(&[
            ("INC001", "01/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC002", "02/01/2024 10:30", "Database", "1 - Critical", "Closed", "", "false"),
        ])?;

        assert_eq!(table.len(), 2);
        let groups: Vec<&str> = table
            .distinct_values(CategoricalColumn::AssignmentGroup)
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(groups, vec!["", "Ops"]);
        assert_eq!(table.distinct_values(CategoricalColumn::Category).len(), 2);
        Ok(())
    }

    #[test]
    fn opened_bounds_skip_missing_timestamps() -> anyhow::Result<()> {
        let table = table_from(&[
            ("INC001", "05/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC002", "?", "Network", "2 - High", "New", "Ops", "true"),
            ("INC003", "02/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
        ])?;

        let (lo, hi) = table.opened_bounds().expect("bounds");
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"));
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 1, 5).expect("date"));
        Ok(())
    }

    #[test]
    fn profiles_count_missing_cells() -> anyhow::Result<()> {
        let table = table_from(&[
            ("INC001", "not a date", "", "2 - High", "New", "Ops", "true"),
            ("INC002", "02/01/2024 09:00", "Network", "", "New", "Ops", "true"),
        ])?;

        let profiles: BTreeMap<String, ColumnProfile> = table
            .column_profiles()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        assert_eq!(profiles.len(), table.columns.len());

        let opened = &profiles["opened_at"];
        assert_eq!(opened.kind, ColumnKind::Timestamp);
        assert_eq!((opened.non_null, opened.missing), (1, 1));
        assert_eq!(profiles["category"].missing, 1);
        assert_eq!(profiles["priority"].missing, 1);
        assert_eq!(profiles["number"].missing, 0);
        assert_eq!(profiles["number"].kind, ColumnKind::Text);
        assert_eq!(profiles["closed_at"].non_null, 0);
        Ok(())
    }

    #[test]
    fn numeric_columns_get_summary_statistics() -> anyhow::Result<()> {
        let csv = "number,opened_at,sys_created_at,sys_updated_at,resolved_at,closed_at,category,priority,incident_state,assignment_group,active,reassignment_count\n\
                   INC001,01/01/2024 09:00,,,,,Network,2 - High,New,Ops,true,0\n\
                   INC001,01/01/2024 09:00,,,,,Network,2 - High,Active,Ops,true,1\n\
                   INC002,02/01/2024 09:00,,,,,Email,3 - Moderate,New,Ops,true,\n\
                   INC003,03/01/2024 09:00,,,,,Email,3 - Moderate,Closed,Ops,false,5\n";
        let table = load_reader(csv.as_bytes())?;
        let profiles = table.column_profiles();
        let reassignments = profiles
            .iter()
            .find(|p| p.name == "reassignment_count")
            .expect("profile");

        assert_eq!(reassignments.kind, ColumnKind::Numeric);
        assert_eq!((reassignments.non_null, reassignments.missing), (3, 1));
        let stats = reassignments.numeric.as_ref().expect("numeric summary");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.median, 1.0);
        assert_eq!(stats.q1, 0.5);
        assert_eq!(stats.q3, 3.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.std, Some(7.0_f64.sqrt()));

        let groups = profiles.iter().find(|p| p.name == "assignment_group").expect("profile");
        assert_eq!(groups.kind, ColumnKind::Text);
        assert!(groups.numeric.is_none());
        Ok(())
    }

    #[test]
    fn single_value_has_no_spread() {
        let stats = NumericSummary::from_values(vec![4.0]).expect("summary");
        assert_eq!(stats.std, None);
        assert_eq!((stats.min, stats.median, stats.max), (4.0, 4.0, 4.0));
        assert!(NumericSummary::from_values(Vec::new()).is_none());
    }

    #[test]
    fn subset_keeps_schema_and_order() -> anyhow::Result<()> {
        let table = table_from(&[
            ("INC001", "01/01/2024 09:00", "Network", "2 - High", "New", "Ops", "true"),
            ("INC002", "02/01/2024 09:00", "Database", "3 - Moderate", "Closed", "DBA", "false"),
            ("INC003", "03/01/2024 09:00", "Email", "4 - Low", "Resolved", "Ops", "false"),
        ])?;

        let sub = table.subset(&[2, 0]);
        assert_eq!(sub.columns, table.columns);
        let numbers: Vec<&str> = sub.records.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["INC003", "INC001"]);
        assert!(!sub.distinct_values(CategoricalColumn::Category).contains("Database"));
        Ok(())
    }
}
