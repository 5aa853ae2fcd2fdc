use crate::error::AdvisorError;
use crate::selection::{SelectionEntry, SelectionStore};
use crate::storage::KeyValueStore;

pub const SELECTION_KEY: &str = "selectedProducts";

/// Absent or unreadable state means "nothing selected yet".
pub fn load(storage: &dyn KeyValueStore) -> SelectionStore {
    let raw = match storage.get(SELECTION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return SelectionStore::new(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read saved selection");
            return SelectionStore::new();
        }
    };

    match serde_json::from_str::<Vec<(String, SelectionEntry)>>(&raw) {
        Ok(pairs) => {
            let store = SelectionStore::from_entries(pairs.into_iter().map(|(_, entry)| entry));
            tracing::debug!(entries = store.len(), "restored saved selection");
            store
        }
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed saved selection");
            SelectionStore::new()
        }
    }
}

/// Overwrites the slot with `[name, entry]` pairs in display order.
pub fn save(storage: &dyn KeyValueStore, store: &SelectionStore) -> Result<(), AdvisorError> {
    let pairs: Vec<(&str, &SelectionEntry)> = store
        .entries()
        .iter()
        .map(|entry| (entry.name.as_str(), entry))
        .collect();
    let serialized = serde_json::to_string(&pairs)
        .map_err(|err| AdvisorError::Storage(format!("failed to serialize selection: {err}")))?;
    storage.set(SELECTION_KEY, &serialized)
}

pub fn erase(storage: &dyn KeyValueStore) -> Result<(), AdvisorError> {
    storage.remove(SELECTION_KEY)
}
