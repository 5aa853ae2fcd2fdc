use crate::catalog::Product;
use serde::{Deserialize, Serialize};

pub mod store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl From<&Product> for SelectionEntry {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            brand: product.brand.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The name is neither selected nor among the displayed products.
    Unknown,
}

/// Products the user picked, keyed by name, in the order they were picked.
///
/// The store never persists itself; callers save after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    entries: Vec<SelectionEntry>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = SelectionEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// Replaces an existing entry in place so display order is unchanged.
    pub fn insert(&mut self, entry: SelectionEntry) {
        match self.position(&entry.name) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn add(&mut self, product: &Product) {
        self.insert(SelectionEntry::from(product));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn to_snapshot_list(&self) -> Vec<SelectionEntry> {
        self.entries.clone()
    }

    /// Card-click semantics: deselect if present, otherwise snapshot the
    /// matching product from the list currently on screen.
    pub fn toggle(&mut self, name: &str, displayed: &[Product]) -> Toggle {
        if self.remove(name) {
            return Toggle::Removed;
        }

        match displayed.iter().find(|product| product.name == name) {
            Some(product) => {
                self.add(product);
                Toggle::Added
            }
            None => Toggle::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_product;
    use std::collections::BTreeSet;

    fn names(store: &SelectionStore) -> Vec<String> {
        store
            .to_snapshot_list()
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    #[test]
    fn add_then_remove_returns_to_empty() {
        let serum = sample_product("Serum A", "skincare");
        let mut store = SelectionStore::new();

        store.add(&serum);
        assert_eq!(store.to_snapshot_list(), vec![SelectionEntry::from(&serum)]);

        store.remove("Serum A");
        assert!(store.to_snapshot_list().is_empty());
    }

    #[test]
    fn duplicate_adds_and_absent_removes_follow_set_semantics() {
        let products: Vec<Product> = ["A", "B", "C", "D"]
            .iter()
            .map(|name| sample_product(name, "skincare"))
            .collect();
        let ops: &[(bool, usize)] = &[
            (true, 0),
            (true, 1),
            (true, 0),
            (false, 3),
            (true, 2),
            (false, 1),
            (false, 1),
            (true, 3),
            (true, 2),
        ];

        let mut store = SelectionStore::new();
        let mut expected = BTreeSet::new();
        for &(is_add, index) in ops {
            let product = &products[index];
            if is_add {
                store.add(product);
                expected.insert(product.name.clone());
            } else {
                store.remove(&product.name);
                expected.remove(&product.name);
            }
        }

        let actual: BTreeSet<String> = names(&store).into_iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(names(&store), vec!["A", "C", "D"]);
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let mut store = SelectionStore::new();
        store.add(&sample_product("A", "skincare"));
        store.add(&sample_product("B", "skincare"));

        let mut updated = sample_product("A", "haircare");
        updated.description = "new formula".to_string();
        store.add(&updated);

        assert_eq!(names(&store), vec!["A", "B"]);
        assert_eq!(store.entries()[0].category, "haircare");
        assert_eq!(store.entries()[0].description, "new formula");
    }

    #[test]
    fn toggle_is_involutive() {
        let displayed = vec![
            sample_product("Serum A", "skincare"),
            sample_product("Cleanser C", "skincare"),
        ];
        let mut store = SelectionStore::new();
        store.add(&displayed[1]);
        let before = store.clone();

        assert_eq!(store.toggle("Serum A", &displayed), Toggle::Added);
        assert_eq!(store.toggle("Serum A", &displayed), Toggle::Removed);
        assert_eq!(store, before);

        assert_eq!(store.toggle("Cleanser C", &displayed), Toggle::Removed);
        assert_eq!(store.toggle("Cleanser C", &displayed), Toggle::Added);
        assert_eq!(store, before);
    }

    #[test]
    fn toggle_copies_category_and_description_from_displayed_product() {
        let displayed = vec![sample_product("Serum A", "skincare")];
        let mut store = SelectionStore::new();

        store.toggle("Serum A", &displayed);
        let entry = &store.entries()[0];
        assert_eq!(entry.category, "skincare");
        assert_eq!(entry.description, "Serum A description");
        assert_eq!(entry.image, displayed[0].image);
    }

    #[test]
    fn toggle_of_unknown_product_changes_nothing() {
        let mut store = SelectionStore::new();
        assert_eq!(store.toggle("Ghost", &[]), Toggle::Unknown);
        assert!(store.is_empty());
    }

    #[test]
    fn selected_product_can_be_deselected_after_the_category_changes() {
        let mut store = SelectionStore::new();
        store.add(&sample_product("Mascara B", "makeup"));

        let skincare = vec![sample_product("Serum A", "skincare")];
        assert_eq!(store.toggle("Mascara B", &skincare), Toggle::Removed);
        assert!(store.is_empty());
    }
}
