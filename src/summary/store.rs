//! Persistence for summaries
//!
//! Every mutation is a read-modify-write of the single `summaries` key.
//! Nothing here locks; concurrent callers must be serialized by the caller
//! (see [`crate::services::Ledger`]). A snapshot whose totals overflowed is
//! rejected before anything is written.

use tracing::debug;

use crate::error::{TallyError, TallyResult};
use crate::models::Transaction;
use crate::storage::{get_json, keys, set_json, KeyValueStore};

use super::engine::{MonthlyPruning, SummariesData};

/// Summary adapter over a key-value store
pub struct SummaryStore<'a> {
    store: &'a dyn KeyValueStore,
    pruning: MonthlyPruning,
}

impl<'a> SummaryStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            pruning: MonthlyPruning::default(),
        }
    }

    /// Use a different monthly pruning policy for updates
    pub fn with_pruning(mut self, pruning: MonthlyPruning) -> Self {
        self.pruning = pruning;
        self
    }

    /// Load stored summaries, or empty summaries if none exist
    pub fn load(&self) -> TallyResult<SummariesData> {
        Ok(get_json(self.store, keys::SUMMARIES)?.unwrap_or_default())
    }

    /// Store `summaries`, refusing totals that overflowed
    pub fn save(&self, summaries: &SummariesData) -> TallyResult<()> {
        if !summaries.has_finite_totals() {
            return Err(TallyError::Validation(
                "Summary totals exceed the representable range".to_string(),
            ));
        }
        set_json(self.store, keys::SUMMARIES, summaries)
    }

    pub fn apply_add(&self, txn: &Transaction) -> TallyResult<SummariesData> {
        self.modify(|s| s.apply_add(txn))
    }

    pub fn apply_update(&self, old: &Transaction, new: &Transaction) -> TallyResult<SummariesData> {
        let pruning = self.pruning;
        self.modify(|s| s.apply_update_with(old, new, pruning))
    }

    pub fn apply_remove(&self, txn: &Transaction) -> TallyResult<SummariesData> {
        self.modify(|s| s.apply_remove(txn))
    }

    /// Rebuild from the full log and overwrite whatever was stored
    pub fn recompute_and_save(&self, transactions: &[Transaction]) -> TallyResult<SummariesData> {
        let summaries = SummariesData::recompute_all(transactions);
        self.save(&summaries)?;
        Ok(summaries)
    }

    fn modify(&self, f: impl FnOnce(&mut SummariesData)) -> TallyResult<SummariesData> {
        let mut summaries = self.load()?;
        f(&mut summaries);
        self.save(&summaries)?;
        debug!(
            months = summaries.monthly.len(),
            categories = summaries.categories.len(),
            "saved summaries"
        );
        Ok(summaries)
    }
}
