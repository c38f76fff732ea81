use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::Settings;
use crate::data::cache::{modified_time_hook, TableCache};
use crate::data::filter::{DateRange, FilterSpec};
use crate::data::model::{CategoricalColumn, ColumnProfile, IncidentTable};
use crate::data::view::{render, DashboardView, ViewOptions};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Path of the incident log currently shown.
    pub source: PathBuf,

    /// Loaded tables, keyed by path.
    pub cache: TableCache,

    /// Loaded table (None until a load succeeds).
    pub table: Option<Arc<IncidentTable>>,

    /// Current user constraints.
    pub filters: FilterSpec,

    /// Charts and metrics for `filters` (recomputed on every change).
    pub view: Option<DashboardView>,

    /// Earliest and latest opened dates of the loaded table.
    pub opened_bounds: Option<(NaiveDate, NaiveDate)>,

    /// Column information and summary statistics of the loaded table.
    pub column_profiles: Vec<ColumnProfile>,

    /// Header names shown in the preview grid.
    pub preview_columns: BTreeSet<String>,

    /// Error message shown instead of the dashboard.
    pub status_message: Option<String>,

    /// Transient note shown in the top bar (e.g. after an export).
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let cache = if settings.reload_on_change {
            TableCache::with_invalidation(modified_time_hook())
        } else {
            TableCache::new()
        };
        Self {
            source: settings.data_path.clone(),
            settings,
            cache,
            table: None,
            filters: FilterSpec::default(),
            view: None,
            opened_bounds: None,
            column_profiles: Vec::new(),
            preview_columns: BTreeSet::new(),
            status_message: None,
            notice: None,
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        self.settings.view_options()
    }

    /// Load `path` through the cache. On failure the dashboard is cleared and
    /// the error becomes the status message.
    pub fn open_source(&mut self, path: &Path) {
        self.source = path.to_path_buf();
        match self.cache.get_or_load(path) {
            Ok(table) => {
                log::debug!("{} source(s) in cache", self.cache.len());
                self.set_table(table);
            }
            Err(e) => {
                match &e {
                    crate::error::LoadError::MissingSourceFile(_) => log::warn!("{e}"),
                    _ => log::error!("Failed to load {}: {e}", path.display()),
                }
                self.table = None;
                self.view = None;
                self.opened_bounds = None;
                self.column_profiles.clear();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Drop the cached copy of the current source and read it again.
    pub fn reload(&mut self) {
        let source = self.source.clone();
        self.cache.invalidate(&source);
        self.open_source(&source);
    }

    /// Ingest a newly loaded table and reset filters to "show everything".
    pub fn set_table(&mut self, table: Arc<IncidentTable>) {
        self.filters = FilterSpec::for_table(&table);
        self.opened_bounds = table.opened_bounds();
        self.column_profiles = table.column_profiles();
        self.preview_columns = table.columns.iter().cloned().collect();
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the dashboard after a filter change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.view = Some(render(table, &self.filters, &self.view_options()));
        }
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_filter_value(&mut self, column: CategoricalColumn, value: &str) {
        let selected = self.filters.selections.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every value of a column.
    pub fn select_all(&mut self, column: CategoricalColumn) {
        if let Some(table) = &self.table {
            let all = table.distinct_values(column).clone();
            self.filters.selections.insert(column, all);
            self.refilter();
        }
    }

    /// Deselect every value of a column.
    pub fn select_none(&mut self, column: CategoricalColumn) {
        self.filters.selections.insert(column, BTreeSet::new());
        self.refilter();
    }

    /// Restrict `opened_at` to `[start, end]`.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.filters.opened = Some(DateRange::new(start, end));
        self.refilter();
    }

    /// Remove the date constraint.
    pub fn clear_date_range(&mut self) {
        self.filters.opened = None;
        self.refilter();
    }

    /// Back to the full span of the table.
    pub fn reset_date_range(&mut self) {
        if let Some((start, end)) = self.opened_bounds {
            self.set_date_range(start, end);
        }
    }

    pub fn toggle_preview_column(&mut self, column: &str) {
        if !self.preview_columns.remove(column) {
            self.preview_columns.insert(column.to_string());
        }
    }

    /// Write the category chart of the unfiltered table to `path`.
    pub fn export_category_chart(&mut self, path: &Path) {
        let Some(table) = &self.table else {
            return;
        };
        match crate::export::write_category_chart(table, path, self.settings.top_categories) {
            Ok(()) => self.notice = Some(format!("Chart saved to {}", path.display())),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.notice = Some(format!("Export failed: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "number,opened_at,sys_created_at,sys_updated_at,resolved_at,closed_at,category,priority,incident_state,assignment_group,active"
        )?;
        writeln!(file, "INC001,01/01/2024 09:00,,,,,Network,2 - High,New,Ops,true")?;
        writeln!(file, "INC002,03/01/2024 09:00,,,,,Database,1 - Critical,Closed,DBA,false")?;
        writeln!(file, "INC003,05/01/2024 09:00,,,,,Network,4 - Low,Resolved,Ops,false")?;
        file.flush()?;
        Ok(file)
    }

    fn filtered_len(state: &AppState) -> usize {
        state.view.as_ref().map_or(0, |v| v.filtered.len())
    }

    #[test]
    fn missing_source_halts_with_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = AppState::new(Settings::default());
        state.open_source(&dir.path().join("incident_event_log.csv"));

        assert!(state.table.is_none());
        assert!(state.view.is_none());
        let msg = state.status_message.unwrap_or_default();
        assert!(msg.contains("not found"), "{msg}");
    }

    #[test]
    fn selection_changes_recompute_the_view() -> Result<()> {
        let file = log_file()?;
        let mut state = AppState::new(Settings::default());
        state.open_source(file.path());
        assert_eq!(filtered_len(&state), 3);
        assert_eq!(state.preview_columns.len(), 11);

        state.toggle_filter_value(CategoricalColumn::Category, "Network");
        assert_eq!(filtered_len(&state), 1);

        state.select_none(CategoricalColumn::Priority);
        assert_eq!(filtered_len(&state), 0);

        state.select_all(CategoricalColumn::Priority);
        state.select_all(CategoricalColumn::Category);
        assert_eq!(filtered_len(&state), 3);
        Ok(())
    }

    #[test]
    fn reload_picks_up_new_rows() -> Result<()> {
        let mut file = log_file()?;
        let mut state = AppState::new(Settings::default());
        state.open_source(file.path());
        assert_eq!(filtered_len(&state), 3);

        writeln!(file, "INC004,04/01/2024 09:00,,,,,Email,3 - Moderate,New,Ops,true")?;
        file.flush()?;
        state.open_source(file.path());
        assert_eq!(filtered_len(&state), 3, "cached copy is reused");

        state.reload();
        assert_eq!(filtered_len(&state), 4);
        Ok(())
    }

    #[test]
    fn date_range_changes_recompute_the_view() -> Result<()> {
        let file = log_file()?;
        let mut state = AppState::new(Settings::default());
        state.open_source(file.path());

        let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).expect("date");
        state.set_date_range(jan(5), jan(2));
        assert_eq!(filtered_len(&state), 2);

        state.reset_date_range();
        assert_eq!(filtered_len(&state), 3);
        Ok(())
    }
}
