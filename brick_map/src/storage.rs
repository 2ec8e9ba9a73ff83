// Map persistence.
//
// The library itself never owns a global store. Callers construct a store
// handle and pass it to whatever needs persistence; the generator and the
// occupancy model never see it.
//
// `MapStore` is the whole contract: save, load, delete, list. Maps are saved
// and replaced whole; there is no partial update. Implementations take `&self`
// and serialize writers internally, so one handle can be shared across
// threads (`Send + Sync`).
//
// Backends:
// - `MemoryStore`  : a mutex-guarded `BTreeMap`. Tests and embedding.
// - `JsonFileStore`: a single JSON document mapping id → wire-format map.
//   Loaded once on open; every mutation rewrites the file via a temp file and
//   rename so a crash never leaves a half-written store behind. A failed
//   write rolls the in-memory state back. JSON problems with the store file
//   itself surface as `BrickError::Store`, an internal fault, not as the
//   client-side `BrickError::Json` used for request payloads.

use crate::error::{BrickError, Result};
use crate::map::BrickMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Storage collaborator for brick maps.
pub trait MapStore: Send + Sync {
    /// Insert or overwrite the map stored under `id`.
    fn save(&self, id: &str, map: &BrickMap) -> Result<()>;
    /// `Ok(None)` if nothing is stored under `id`.
    fn load(&self, id: &str) -> Result<Option<BrickMap>>;
    /// Fails with `MapNotFound` for an unknown id.
    fn delete(&self, id: &str) -> Result<()>;
    /// All stored ids, ascending.
    fn list(&self) -> Result<Vec<String>>;

    /// `load`, with an unknown id turned into `MapNotFound`.
    fn load_existing(&self, id: &str) -> Result<BrickMap> {
        self.load(id)?
            .ok_or_else(|| BrickError::MapNotFound(id.to_owned()))
    }
}

fn store_error(path: &Path, source: serde_json::Error) -> BrickError {
    BrickError::Store {
        path: path.display().to_string(),
        source,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    maps: Mutex<BTreeMap<String, BrickMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapStore for MemoryStore {
    fn save(&self, id: &str, map: &BrickMap) -> Result<()> {
        lock(&self.maps).insert(id.to_owned(), map.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<BrickMap>> {
        Ok(lock(&self.maps).get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<()> {
        lock(&self.maps)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BrickError::MapNotFound(id.to_owned()))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(lock(&self.maps).keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    maps: Mutex<BTreeMap<String, BrickMap>>,
}

impl JsonFileStore {
    /// Open a store at `path`, reading it if it exists. The file is created on
    /// the first mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let maps = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let maps: BTreeMap<String, BrickMap> =
                serde_json::from_str(&text).map_err(|e| store_error(&path, e))?;
            info!(path = %path.display(), maps = maps.len(), "opened map store");
            maps
        } else {
            info!(path = %path.display(), "starting empty map store");
            BTreeMap::new()
        };
        Ok(Self {
            path,
            maps: Mutex::new(maps),
        })
    }

    fn persist(&self, maps: &BTreeMap<String, BrickMap>) -> Result<()> {
        let json = serde_json::to_string_pretty(maps).map_err(|e| store_error(&self.path, e))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), maps = maps.len(), "persisted map store");
        Ok(())
    }
}

impl MapStore for JsonFileStore {
    fn save(&self, id: &str, map: &BrickMap) -> Result<()> {
        let mut maps = lock(&self.maps);
        let previous = maps.insert(id.to_owned(), map.clone());
        if let Err(err) = self.persist(&maps) {
            match previous {
                Some(old) => maps.insert(id.to_owned(), old),
                None => maps.remove(id),
            };
            return Err(err);
        }
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<BrickMap>> {
        Ok(lock(&self.maps).get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut maps = lock(&self.maps);
        let removed = maps
            .remove(id)
            .ok_or_else(|| BrickError::MapNotFound(id.to_owned()))?;
        if let Err(err) = self.persist(&maps) {
            maps.insert(id.to_owned(), removed);
            return Err(err);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(lock(&self.maps).keys().cloned().collect())
    }
}
