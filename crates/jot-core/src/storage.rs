use std::collections::BTreeMap;

use anyhow::Context;
use tracing::{debug, warn};

use crate::item::Item;

/// Key under which the collection is stored unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "todos";

/// A string key-value slot store, the shape of a browser's `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.slots.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the collection stored under `key`.
///
/// A missing slot, an unreadable slot, and malformed JSON all come back as an
/// empty collection. A JSON `null` counts as missing.
#[tracing::instrument(skip(store))]
pub fn load_collection<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Vec<Item> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no stored collection");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed reading stored collection; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Option<Vec<Item>>>(&raw) {
        Ok(items) => {
            let items = items.unwrap_or_default();
            debug!(count = items.len(), "loaded collection");
            items
        }
        Err(err) => {
            warn!(error = %err, "stored collection is malformed; starting empty");
            Vec::new()
        }
    }
}

/// Rewrites the whole collection under `key`.
#[tracing::instrument(skip(store, items), fields(count = items.len()))]
pub fn save_collection<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    items: &[Item],
) -> anyhow::Result<()> {
    let payload = serde_json::to_string(items).context("failed to serialize collection")?;
    store
        .set_item(key, &payload)
        .with_context(|| format!("failed to write collection under key {key:?}"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{KeyValueStore, MemoryStore, load_collection, save_collection};
    use crate::item::Item;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("storage disabled"))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    #[test]
    fn missing_null_and_corrupt_slots_load_empty() {
        assert!(load_collection(&MemoryStore::new(), "todos").is_empty());
        assert!(load_collection(&MemoryStore::with_item("todos", "null"), "todos").is_empty());
        assert!(load_collection(&MemoryStore::with_item("todos", "{not json"), "todos").is_empty());
        assert!(load_collection(&BrokenStore, "todos").is_empty());
    }

    #[test]
    fn save_then_load_preserves_items() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut done = Item::new(2, "Walk dog".to_string(), now);
        done.completed = true;
        let items = vec![done, Item::new(1, "Buy milk".to_string(), now)];

        let mut store = MemoryStore::new();
        save_collection(&mut store, "todos", &items).unwrap();

        assert_eq!(load_collection(&store, "todos"), items);
    }

    #[test]
    fn write_failures_surface_with_context() {
        let err = save_collection(&mut BrokenStore, "todos", &[]).unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.contains("todos"));
        assert!(rendered.contains("quota exceeded"));
    }
}
