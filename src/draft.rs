use crate::error::Result;
use crate::rubric::{RubricField, RubricId, RubricItem, RubricVariant};
use crate::validator::WeightSummary;
use indexmap::IndexMap;
use log::warn;

/// Editable working copy of a rubric list.
///
/// Rows are kept in an insertion-ordered map keyed by their identity, so edits and
/// removals addressed by id stay correct while rows are added or deleted around them.
/// The draft owns its rows: nothing done here is visible on the list it was built from
/// until the draft is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricDraft<V> {
    items: IndexMap<RubricId, RubricItem<V>>,
}

impl<V: RubricVariant> Default for RubricDraft<V> {
    fn default() -> Self {
        RubricDraft {
            items: IndexMap::new(),
        }
    }
}

impl<V: RubricVariant> RubricDraft<V> {
    /// Deep-copies `source` into a new draft.
    ///
    /// Every source row survives: a row whose id was already seen gets a temporary id,
    /// so the backend stores it as a new row instead of losing it on the next sync.
    pub fn initialize(source: &[RubricItem<V>]) -> Self {
        let mut items = IndexMap::with_capacity(source.len());
        for item in source {
            let mut row = item.clone();
            if items.contains_key(&row.id) {
                warn!("Rubric id {} is repeated, the later row gets a new id", row.id);
                row.id = RubricId::temporary();
            }
            items.insert(row.id.clone(), row);
        }
        RubricDraft { items }
    }

    /// Weight given to a new row: the weight of the last row, or zero when empty.
    pub fn next_default_weight(&self) -> f64 {
        self.items
            .last()
            .map(|(_, item)| item.weight)
            .unwrap_or(0.0)
    }

    /// Appends an empty row with `default_weight` and returns its temporary id.
    ///
    /// Empty names and zero weights are accepted here; validation happens on the total.
    pub fn add_blank(&mut self, subject_key: &str, default_weight: f64) -> RubricId {
        let item = RubricItem::blank(subject_key, default_weight);
        let id = item.id.clone();
        self.items.insert(id.clone(), item);
        id
    }

    /// Applies an edit to the row identified by `id`.
    ///
    /// Returns `Ok(false)` when no row has that id (it may have been removed meanwhile).
    pub fn update_field(&mut self, id: &RubricId, field: RubricField) -> Result<bool> {
        match self.items.get_mut(id) {
            Some(item) => item.apply(&field).map(|_| true),
            None => Ok(false),
        }
    }

    /// Applies an edit to the row displayed at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn update_field_at(&mut self, index: usize, field: RubricField) -> Result<()> {
        let len = self.items.len();
        let Some((_, item)) = self.items.get_index_mut(index) else {
            panic!("rubric index {} out of range (len {})", index, len);
        };
        item.apply(&field)
    }

    /// Removes the row identified by `id`, keeping the order of the others.
    pub fn remove(&mut self, id: &RubricId) -> Option<RubricItem<V>> {
        self.items.shift_remove(id)
    }

    /// Removes the row displayed at `index`, shifting later rows up.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> RubricItem<V> {
        let len = self.items.len();
        match self.items.shift_remove_index(index) {
            Some((_, item)) => item,
            None => panic!("rubric index {} out of range (len {})", index, len),
        }
    }

    pub fn get(&self, id: &RubricId) -> Option<&RubricItem<V>> {
        self.items.get(id)
    }

    pub fn get_index(&self, index: usize) -> Option<&RubricItem<V>> {
        self.items.get_index(index).map(|(_, item)| item)
    }

    /// Rows in display order.
    pub fn items(&self) -> impl Iterator<Item = &RubricItem<V>> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Owned copy of every row, in display order, ready to be sent to the backend.
    pub fn to_vec(&self) -> Vec<RubricItem<V>> {
        self.items.values().cloned().collect()
    }

    /// Total weight and validity of the current rows. Never cached.
    pub fn summary(&self) -> WeightSummary {
        WeightSummary::of(self.items.values())
    }
}
