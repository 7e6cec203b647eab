//! Transaction ledger
//!
//! The ledger owns the transaction log and keeps the stored summaries in
//! step with it. Store writes are not transactional, so every mutation holds
//! the ledger lock across both writes. Summaries are written first: if the
//! summary update is refused, the log is left untouched.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{TallyError, TallyResult};
use crate::models::{parse_timestamp, Transaction, TransactionType};
use crate::storage::{get_json, keys, set_json, Storage};
use crate::summary::{MonthlyPruning, SummariesData, SummaryStore, SUMMARY_EPSILON};

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub account: Option<String>,
    /// Calendar (year, month)
    pub month: Option<(i32, u32)>,
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn month(mut self, year: i32, month: u32) -> Self {
        self.month = Some((year, month));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind.map_or(true, |k| txn.kind == k)
            && self.category.as_deref().map_or(true, |c| txn.category == c)
            && self.account.as_deref().map_or(true, |a| txn.account == a)
            && self.month.map_or(true, |m| txn.year_month() == Some(m))
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    pub account: String,
    pub date: String,
    pub note: Option<String>,
}

/// Fields to change on an existing transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub kind: Option<TransactionType>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub account: Option<String>,
    pub date: Option<String>,
    /// An empty note clears it
    pub note: Option<String>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.account.is_none()
            && self.date.is_none()
            && self.note.is_none()
    }

    fn apply_to(&self, txn: &mut Transaction) {
        if let Some(kind) = self.kind {
            txn.kind = kind;
        }
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
        if let Some(category) = &self.category {
            txn.category = category.trim().to_string();
        }
        if let Some(account) = &self.account {
            txn.account = account.trim().to_string();
        }
        if let Some(date) = &self.date {
            txn.date = date.trim().to_string();
        }
        if let Some(note) = &self.note {
            txn.note = Some(note.trim().to_string()).filter(|n| !n.is_empty());
        }
    }
}

/// Serialized access to the transaction log and its summaries
pub struct Ledger<'a> {
    storage: &'a Storage,
    pruning: MonthlyPruning,
    lock: Mutex<()>,
}

impl<'a> Ledger<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            pruning: MonthlyPruning::default(),
            lock: Mutex::new(()),
        }
    }

    /// Use a different monthly pruning policy for updates
    pub fn with_pruning(mut self, pruning: MonthlyPruning) -> Self {
        self.pruning = pruning;
        self
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock carries no broken state
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn summary_store(&self) -> SummaryStore<'a> {
        SummaryStore::new(self.storage.plain()).with_pruning(self.pruning)
    }

    fn load(&self) -> TallyResult<Vec<Transaction>> {
        Ok(get_json(self.storage.plain(), keys::TRANSACTIONS)?.unwrap_or_default())
    }

    fn save(&self, transactions: &[Transaction]) -> TallyResult<()> {
        set_json(self.storage.plain(), keys::TRANSACTIONS, transactions)
    }

    /// List transactions, newest first
    pub fn list(&self, filter: &TransactionFilter) -> TallyResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .load()?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();

        transactions.sort_by(|a, b| parse_timestamp(&b.date).cmp(&parse_timestamp(&a.date)));

        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }

    pub fn get(&self, id: &str) -> TallyResult<Option<Transaction>> {
        Ok(self.load()?.into_iter().find(|t| t.id == id))
    }

    /// Record a new transaction
    pub fn add(&self, input: NewTransaction) -> TallyResult<Transaction> {
        let mut txn = Transaction::new(
            Uuid::new_v4().to_string(),
            input.kind,
            input.amount,
            input.category.trim(),
            input.account.trim(),
            input.date.trim(),
        );
        txn.note = input
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let _guard = self.guard();
        let mut transactions = self.load()?;
        transactions.push(txn.clone());
        self.summary_store().apply_add(&txn)?;
        self.save(&transactions)?;

        debug!(id = %txn.id, "added transaction");
        Ok(txn)
    }

    /// Change an existing transaction
    pub fn update(&self, id: &str, update: TransactionUpdate) -> TallyResult<Transaction> {
        let _guard = self.guard();
        let mut transactions = self.load()?;
        let slot = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TallyError::transaction_not_found(id))?;

        let old = slot.clone();
        let mut new = old.clone();
        update.apply_to(&mut new);
        new.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;
        *slot = new.clone();

        self.summary_store().apply_update(&old, &new)?;
        self.save(&transactions)?;

        debug!(id = %id, "updated transaction");
        Ok(new)
    }

    /// Delete a transaction, returning it
    pub fn remove(&self, id: &str) -> TallyResult<Transaction> {
        let _guard = self.guard();
        let mut transactions = self.load()?;
        let pos = transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TallyError::transaction_not_found(id))?;

        let removed = transactions.remove(pos);
        self.summary_store().apply_remove(&removed)?;
        self.save(&transactions)?;

        debug!(id = %id, "removed transaction");
        Ok(removed)
    }

    /// Stored summaries
    pub fn summaries(&self) -> TallyResult<SummariesData> {
        self.summary_store().load()
    }

    /// Replace stored summaries with a full recomputation
    pub fn rebuild_summaries(&self) -> TallyResult<SummariesData> {
        let _guard = self.guard();
        let transactions = self.load()?;
        let summaries = self.summary_store().recompute_and_save(&transactions)?;
        info!(transactions = transactions.len(), "rebuilt summaries");
        Ok(summaries)
    }

    /// Whether stored summaries agree with a full recomputation
    pub fn verify_summaries(&self) -> TallyResult<bool> {
        let _guard = self.guard();
        let stored = self.summary_store().load()?;
        let expected = SummariesData::recompute_all(&self.load()?);
        let consistent = stored.is_equivalent_to(&expected, SUMMARY_EPSILON);
        if !consistent {
            warn!("stored summaries differ from the transaction log");
        }
        Ok(consistent)
    }

    pub fn accounts(&self) -> TallyResult<Vec<String>> {
        self.string_list(keys::ACCOUNTS)
    }

    pub fn add_account(&self, name: &str) -> TallyResult<Vec<String>> {
        self.add_to_list(keys::ACCOUNTS, "Account", name)
    }

    pub fn categories(&self, kind: TransactionType) -> TallyResult<Vec<String>> {
        self.string_list(category_key(kind))
    }

    pub fn add_category(&self, kind: TransactionType, name: &str) -> TallyResult<Vec<String>> {
        self.add_to_list(category_key(kind), "Category", name)
    }

    fn string_list(&self, key: &str) -> TallyResult<Vec<String>> {
        Ok(get_json(self.storage.plain(), key)?.unwrap_or_default())
    }

    fn add_to_list(&self, key: &str, what: &str, name: &str) -> TallyResult<Vec<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation(format!("{} name cannot be empty", what)));
        }

        let _guard = self.guard();
        let mut list = self.string_list(key)?;
        if list.iter().any(|existing| existing.eq_ignore_ascii_case(name)) {
            return Err(TallyError::Validation(format!(
                "{} '{}' already exists",
                what, name
            )));
        }
        list.push(name.to_string());
        set_json(self.storage.plain(), key, &list)?;
        Ok(list)
    }
}

fn category_key(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => keys::INCOME_CATEGORIES,
        TransactionType::Expense => keys::EXPENSE_CATEGORIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType::{Expense, Income};

    fn new_txn(kind: TransactionType, amount: f64, category: &str, date: &str) -> NewTransaction {
        NewTransaction {
            kind,
            amount,
            category: category.to_string(),
            account: "Cash".to_string(),
            date: date.to_string(),
            note: None,
        }
    }

    fn assert_consistent(ledger: &Ledger<'_>) {
        assert!(ledger.verify_summaries().unwrap());
    }

    #[test]
    fn test_add_assigns_id_and_updates_summaries() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);

        let a = ledger.add(new_txn(Expense, 50.0, "Food", "2024-01-15")).unwrap();
        let b = ledger.add(new_txn(Income, 1000.0, "Salary", "2024-01-20")).unwrap();
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());

        let summaries = ledger.summaries().unwrap();
        assert_eq!(summaries.month(2024, 1).unwrap().net, 950.0);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);

        for input in [
            new_txn(Expense, 0.0, "Food", "2024-01-15"),
            new_txn(Expense, 5.0, " ", "2024-01-15"),
            new_txn(Expense, 5.0, "Food", "last tuesday"),
        ] {
            assert!(ledger.add(input).unwrap_err().is_validation());
        }
        assert!(ledger.list(&TransactionFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        let txn = ledger.add(new_txn(Expense, 20.0, "Food", "2024-01-15")).unwrap();

        let updated = ledger
            .update(
                &txn.id,
                TransactionUpdate {
                    amount: Some(35.0),
                    date: Some("2024-02-01".to_string()),
                    note: Some("groceries".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.amount, 35.0);
        assert_eq!(updated.note.as_deref(), Some("groceries"));
        assert_eq!(ledger.get(&txn.id).unwrap().unwrap(), updated);
        assert_consistent(&ledger);

        let removed = ledger.remove(&txn.id).unwrap();
        assert_eq!(removed.id, txn.id);
        assert!(ledger.get(&txn.id).unwrap().is_none());
        assert_consistent(&ledger);
    }

    #[test]
    fn test_overflowing_add_is_refused_without_drift() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        ledger.add(new_txn(Expense, 1e308, "Rent", "2024-01-01")).unwrap();

        let err = ledger
            .add(new_txn(Expense, 1e308, "Rent", "2024-01-02"))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.list(&TransactionFilter::new()).unwrap().len(), 1);
        assert_consistent(&ledger);

        ledger.add(new_txn(Income, 10.0, "Salary", "2024-01-03")).unwrap();
        assert_eq!(ledger.list(&TransactionFilter::new()).unwrap().len(), 2);
        assert_consistent(&ledger);
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        let txn = ledger.add(new_txn(Expense, 20.0, "Food", "2024-01-15")).unwrap();

        let err = ledger
            .update(
                &txn.id,
                TransactionUpdate {
                    amount: Some(-3.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.get(&txn.id).unwrap().unwrap().amount, 20.0);
    }

    #[test]
    fn test_missing_transaction() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        assert!(ledger.remove("nope").unwrap_err().is_not_found());
        assert!(ledger
            .update("nope", TransactionUpdate::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list_filters_and_order() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        ledger.add(new_txn(Expense, 1.0, "Food", "2024-01-15")).unwrap();
        ledger.add(new_txn(Expense, 2.0, "Rent", "2024-03-01")).unwrap();
        ledger.add(new_txn(Income, 3.0, "Salary", "2024-02-01")).unwrap();

        let all = ledger.list(&TransactionFilter::new()).unwrap();
        let amounts: Vec<f64> = all.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![2.0, 3.0, 1.0]);

        let expenses = ledger.list(&TransactionFilter::new().kind(Expense)).unwrap();
        assert_eq!(expenses.len(), 2);

        let february = ledger.list(&TransactionFilter::new().month(2024, 2)).unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[0].category, "Salary");

        let limited = ledger.list(&TransactionFilter::new().limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_rebuild_repairs_drift() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);
        ledger.add(new_txn(Expense, 10.0, "Food", "2024-01-15")).unwrap();

        SummaryStore::new(storage.plain())
            .save(&SummariesData::default())
            .unwrap();
        assert!(!ledger.verify_summaries().unwrap());

        ledger.rebuild_summaries().unwrap();
        assert_consistent(&ledger);
    }

    #[test]
    fn test_string_lists() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);

        ledger.add_account("Cash").unwrap();
        ledger.add_account(" Bank ").unwrap();
        assert_eq!(ledger.accounts().unwrap(), vec!["Cash", "Bank"]);
        assert!(ledger.add_account("cash").unwrap_err().is_validation());
        assert!(ledger.add_account("").unwrap_err().is_validation());

        ledger.add_category(Expense, "Food").unwrap();
        ledger.add_category(Income, "Salary").unwrap();
        assert_eq!(ledger.categories(Expense).unwrap(), vec!["Food"]);
        assert_eq!(ledger.categories(Income).unwrap(), vec!["Salary"]);
    }

    #[test]
    fn test_concurrent_mutations_stay_consistent() {
        let storage = Storage::in_memory();
        let ledger = Ledger::new(&storage);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let ledger = &ledger;
                scope.spawn(move || {
                    for i in 0..25 {
                        let kind = if (worker + i) % 3 == 0 { Income } else { Expense };
                        let date = format!("2024-{:02}-10", 1 + (worker + i) % 12);
                        let txn = ledger
                            .add(new_txn(kind, (i + 1) as f64 * 1.25, "Mixed", &date))
                            .unwrap();
                        if i % 2 == 0 {
                            ledger.remove(&txn.id).unwrap();
                        }
                    }
                });
            }
        });

        let log = ledger.list(&TransactionFilter::new()).unwrap();
        assert_eq!(log.len(), 8 * 12);

        let stored = ledger.summaries().unwrap();
        assert!(stored.is_equivalent_to(&SummariesData::recompute_all(&log), SUMMARY_EPSILON));
    }
}
