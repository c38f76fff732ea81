use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use super::model::{IncidentRecord, IncidentTable, REQUIRED_COLUMNS};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an incident event log from a CSV file with a header row.
///
/// A path that does not exist yields [`LoadError::MissingSourceFile`] and no
/// table. Timestamp cells that cannot be parsed day-first become `None`; they
/// never abort the load.
pub fn load_table(path: &Path) -> Result<IncidentTable, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::MissingSourceFile(path.to_path_buf()),
        _ => LoadError::Io(e),
    })?;
    let table = load_reader(file)?;
    log::info!(
        "Loaded {} incident rows ({} columns) from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Load an incident event log from any CSV byte stream.
pub fn load_reader<R: Read>(source: R) -> Result<IncidentTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = fit_to_header(result?, headers.len());
        let mut record: IncidentRecord = row.deserialize(Some(&headers))?;
        record.cells = row.iter().map(str::to_string).collect();
        records.push(record);
    }

    let columns = headers.iter().map(str::to_string).collect();
    Ok(IncidentTable::from_records(columns, records))
}

/// Pad a short row with empty cells, or drop cells beyond the header.
fn fit_to_header(row: csv::StringRecord, width: usize) -> csv::StringRecord {
    if row.len() == width {
        return row;
    }
    let mut fitted: csv::StringRecord = row.iter().take(width).collect();
    while fitted.len() < width {
        fitted.push_field("");
    }
    fitted
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Day-first formats with a time component, tried in order.
const DATETIME_FORMATS: [&str; 9] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats; the time is taken as midnight.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

const MIN_YEAR: i32 = 1000;

/// Parse a timestamp using the day-first convention. Returns `None` for empty
/// or unrecognised text.
pub fn parse_day_first(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        // `%Y` also accepts two-digit years.
        .filter(|ts| ts.year() >= MIN_YEAR)
}

/// Interpret a boolean-ish cell. Anything that is not clearly true is false.
pub fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "t"
    )
}

pub(crate) fn deserialize_timestamp<'de, D>(de: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(de)?;
    Ok(parse_day_first(&raw))
}

pub(crate) fn deserialize_flag<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(de)?;
    Ok(parse_flag(&raw))
}
