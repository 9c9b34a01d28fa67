//! Store registry - one live store per resolved database path
//!
//! Owned by the request layer. Opening is lazy (on first lookup) and
//! teardown is explicit through [`StoreRegistry::close_all`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use crate::Result;
use super::sqlite::{KnowledgeGraphStore, StoreOptions};

#[derive(Default)]
pub struct StoreRegistry {
    options: StoreOptions,
    stores: Mutex<HashMap<PathBuf, Arc<KnowledgeGraphStore>>>,
}

impl StoreRegistry {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Return the live store for `path`, opening it on first use.
    ///
    /// Paths naming the same file (relative vs absolute, `..` segments,
    /// symlinked directories) share one instance.
    pub fn get_or_open(&self, path: &Path) -> Result<Arc<KnowledgeGraphStore>> {
        let resolved = resolve_path(path)?;
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(store) = stores.get(&resolved) {
            if !store.is_closed() {
                return Ok(Arc::clone(store));
            }
        }

        tracing::info!("Opening knowledge graph at {}", resolved.display());
        let store = Arc::new(KnowledgeGraphStore::open(&resolved, &self.options)?);
        stores.insert(resolved, Arc::clone(&store));
        Ok(store)
    }

    /// Close every store and empty the registry. Close failures are logged
    /// and do not stop the remaining stores from closing.
    pub fn close_all(&self) {
        let drained: Vec<_> = self
            .stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (path, store) in drained {
            if let Err(e) = store.close() {
                tracing::warn!("Failed to close {}: {}", path.display(), e);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Absolute path with the parent directory created and canonicalized
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let file_name = match absolute.file_name() {
        Some(name) => name.to_os_string(),
        None => return Ok(absolute),
    };

    match absolute.parent() {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            Ok(parent.canonicalize()?.join(file_name))
        }
        None => Ok(absolute),
    }
}
