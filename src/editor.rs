use crate::draft::RubricDraft;
use crate::error::{Result, RubricError};
use crate::rubric::{DailyWork, RubricField, RubricId, RubricItem, RubricVariant, Standard};
use crate::sync::{DailyWorkTarget, RubricClient};
use crate::validator::{SumPolicy, WeightSummary};
use log::{debug, warn};

/// One rubric-editing session for a subject.
///
/// While open, the editor owns a [`RubricDraft`] built from the last list fetched from
/// the backend. Cancelling drops the draft; a successful save closes the editor and the
/// caller is expected to fetch the authoritative list again. A failed save keeps the draft
/// so the user can retry.
///
/// `save` takes `&mut self`, so only one submission can be in flight per editor.
#[derive(Debug, Clone)]
pub struct RubricEditor<V> {
    subject_key: String,
    draft: Option<RubricDraft<V>>,
}

pub type StandardRubricEditor = RubricEditor<Standard>;
pub type DailyWorkRubricEditor = RubricEditor<DailyWork>;

impl<V: RubricVariant> RubricEditor<V> {
    /// A closed editor for `subject_key`.
    pub fn new(subject_key: &str) -> Self {
        RubricEditor {
            subject_key: subject_key.to_string(),
            draft: None,
        }
    }

    pub fn subject_key(&self) -> &str {
        &self.subject_key
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Opens the editor on a fresh copy of `source`, dropping any previous draft.
    pub fn open(&mut self, source: &[RubricItem<V>]) {
        debug!(
            "Opening {} rubric editor for {} with {} rows",
            V::NAME,
            self.subject_key,
            source.len()
        );
        self.draft = Some(RubricDraft::initialize(source));
    }

    /// Rebuilds the draft from a new source list. Does nothing while closed.
    pub fn refresh_source(&mut self, source: &[RubricItem<V>]) {
        if self.is_open() {
            self.draft = Some(RubricDraft::initialize(source));
        }
    }

    /// Closes the editor and discards the draft.
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn draft(&self) -> Option<&RubricDraft<V>> {
        self.draft.as_ref()
    }

    fn draft_mut(&mut self) -> Result<&mut RubricDraft<V>> {
        self.draft.as_mut().ok_or(RubricError::EditorClosed)
    }

    /// Appends a row that reuses the weight of the last row (zero when empty).
    pub fn add_blank(&mut self) -> Result<RubricId> {
        let subject_key = self.subject_key.clone();
        let draft = self.draft_mut()?;
        let weight = draft.next_default_weight();
        Ok(draft.add_blank(&subject_key, weight))
    }

    /// Appends a row with an explicit starting weight.
    pub fn add_blank_with_weight(&mut self, default_weight: f64) -> Result<RubricId> {
        let subject_key = self.subject_key.clone();
        Ok(self.draft_mut()?.add_blank(&subject_key, default_weight))
    }

    pub fn update_field(&mut self, id: &RubricId, field: RubricField) -> Result<bool> {
        self.draft_mut()?.update_field(id, field)
    }

    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn update_field_at(&mut self, index: usize, field: RubricField) -> Result<()> {
        self.draft_mut()?.update_field_at(index, field)
    }

    pub fn remove(&mut self, id: &RubricId) -> Result<Option<RubricItem<V>>> {
        Ok(self.draft_mut()?.remove(id))
    }

    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Result<RubricItem<V>> {
        Ok(self.draft_mut()?.remove_at(index))
    }

    /// Total of the current draft, or `None` while closed.
    pub fn summary(&self) -> Option<WeightSummary> {
        self.draft.as_ref().map(RubricDraft::summary)
    }

    /// Live percentage indicator, e.g. `"Total: 110% / 100%"`.
    pub fn banner(&self) -> Option<String> {
        self.summary().map(|summary| summary.banner())
    }

    /// Whether the save action is enabled for the current draft.
    pub fn can_save(&self) -> bool {
        self.summary()
            .map(|summary| V::Policy::default().permits_save(&summary))
            .unwrap_or(false)
    }

    /// Gates the draft on the variant's sum policy, then hands it to `submit`.
    ///
    /// On success the editor closes. On failure the draft is kept untouched.
    pub fn save_with<F>(&mut self, submit: F) -> Result<()>
    where
        F: FnOnce(&str, &RubricDraft<V>) -> Result<()>,
    {
        let draft = self.draft.as_ref().ok_or(RubricError::EditorClosed)?;
        let summary = draft.summary();
        if !V::Policy::default().permits_save(&summary) {
            return Err(RubricError::ValidationFailure { sum: summary.sum });
        }
        if let Err(e) = submit(self.subject_key.as_str(), draft) {
            warn!(
                "Saving {} rubrics for {} failed, draft kept: {}",
                V::NAME,
                self.subject_key,
                e
            );
            return Err(e);
        }
        self.draft = None;
        Ok(())
    }
}

impl RubricEditor<Standard> {
    /// Saves through `PUT /rubro/sync`. Blocked unless the weights total 100%.
    pub fn save(&mut self, client: &RubricClient) -> Result<()> {
        self.save_with(|subject_key, draft| client.sync_rubrics(subject_key, draft))
    }
}

impl RubricEditor<DailyWork> {
    /// Saves through `PUT /rubros/tc/sync` for the given group, grading period and year.
    ///
    /// `target` must name the editor's own subject.
    pub fn save_daily_work(
        &mut self,
        client: &RubricClient,
        target: &DailyWorkTarget,
    ) -> Result<()> {
        if target.subject_key != self.subject_key {
            return Err(RubricError::SubjectMismatch {
                editor: self.subject_key.clone(),
                target: target.subject_key.clone(),
            });
        }
        self.save_with(|_, draft| client.sync_daily_work(target, draft))
    }
}
