use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading an incident log into memory.
///
/// Unparseable timestamp cells are not errors: they become missing values
/// during loading and never surface here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("'{}' not found. Please make sure the file exists.", .0.display())]
    MissingSourceFile(PathBuf),

    #[error("required column '{0}' is missing from the header row")]
    MissingColumn(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
