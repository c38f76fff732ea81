use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::TOP_CATEGORIES;
use crate::data::view::ViewOptions;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "incident-insight.json";

/// Runtime settings; every key is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Incident log loaded at startup.
    pub data_path: PathBuf,
    /// Rows shown in the filtered-data preview.
    pub preview_rows: usize,
    /// Categories kept in the category charts.
    pub top_categories: usize,
    /// Where the static category chart is written.
    pub export_path: PathBuf,
    /// Reload a re-opened file when its modification time has changed.
    pub reload_on_change: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("incident_event_log.csv"),
            preview_rows: 100,
            top_categories: TOP_CATEGORIES,
            export_path: PathBuf::from("incident_categories_plot.html"),
            reload_on_change: false,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// An explicit path must exist; otherwise fall back to
    /// [`DEFAULT_CONFIG_FILE`] if present, else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            preview_rows: self.preview_rows,
            top_categories: self.top_categories,
        }
    }
}
