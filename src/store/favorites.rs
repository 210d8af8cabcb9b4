use std::collections::HashSet;

use tracing::{debug, warn};

use super::kv::KeyValueStore;
use super::FAVORITES_KEY;
use crate::error::Result;

/// Set of favorited item names, written through to a `KeyValueStore`.
///
/// The in-memory set is authoritative. A failed write is logged and the
/// in-memory change is kept.
pub struct FavoritesStore<S: KeyValueStore> {
    names: HashSet<String>,
    backend: S,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Loads the persisted set; missing or malformed data yields an empty set.
    pub fn load(backend: S) -> Self {
        let names = match backend.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed favorites");
                    HashSet::new()
                }
            },
            Ok(None) => HashSet::new(),
            Err(e) => {
                warn!(error = %e, "Failed to load favorites");
                HashSet::new()
            }
        };

        debug!(count = names.len(), "Loaded favorites");
        Self { names, backend }
    }

    /// Flips membership of `name` and persists the whole set.
    /// Returns true if the item is now a favorite.
    pub fn toggle(&mut self, name: &str) -> bool {
        let now_favorite = if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        };
        self.persist_logged();
        now_favorite
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.persist_logged();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Writes the current set. Names are sorted so the stored value is stable.
    pub fn persist(&self) -> Result<()> {
        let mut list: Vec<&str> = self.names().collect();
        list.sort_unstable();
        let encoded = serde_json::to_string(&list)?;
        self.backend.set(FAVORITES_KEY, &encoded)
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "Failed to save favorites");
        }
    }
}
