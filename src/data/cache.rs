use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::load_table;
use super::model::IncidentTable;
use crate::error::LoadError;

/// Decides whether a cached table for the given path must be reloaded.
pub type InvalidationHook = Box<dyn Fn(&Path) -> bool>;

/// A hook reporting a path as stale once its modification time differs from
/// the one seen on the previous lookup.
pub fn modified_time_hook() -> InvalidationHook {
    let seen: RefCell<HashMap<PathBuf, Option<SystemTime>>> = RefCell::default();
    Box::new(move |path| {
        let current = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let previous = seen.borrow_mut().insert(path.to_path_buf(), current);
        matches!(previous, Some(prev) if prev != current)
    })
}

/// Memoised table loading keyed by source path.
///
/// Source files are treated as immutable for the session, so by default an
/// entry lives until [`TableCache::invalidate`]. An optional hook is
/// consulted on every lookup and can force a reload. Failed loads are never
/// cached.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, Arc<IncidentTable>>,
    hook: Option<InvalidationHook>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invalidation(hook: InvalidationHook) -> Self {
        TableCache {
            entries: HashMap::new(),
            hook: Some(hook),
        }
    }

    /// Return the cached table for `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<IncidentTable>, LoadError> {
        let stale = self.hook.as_ref().is_some_and(|hook| hook(path));
        if stale {
            // A failed reload must not leave the previous table behind.
            self.entries.remove(path);
        } else if let Some(table) = self.entries.get(path) {
            log::debug!("Using cached table for {}", path.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_table(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&table));
        log::debug!("{} table(s) cached", self.entries.len());
        Ok(table)
    }

    /// Drop the entry for `path`. Returns whether one was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
