//! Aggregate summaries over the transaction log
//!
//! `SummariesData` holds per-month and per-(category, type) running totals.
//! Everything here is pure and in-memory: [`SummariesData::recompute_all`]
//! builds the aggregates in one pass, and the `apply_*` methods update an
//! existing snapshot for a single ledger change. Persistence lives in
//! [`super::store`].
//!
//! The contract tying the two paths together: after any sequence of
//! `apply_*` calls starting from an empty snapshot, the result is
//! [`SummariesData::is_equivalent_to`] `recompute_all` over the final log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Transaction, TransactionType};

/// Tolerance used when comparing incrementally maintained sums
pub const SUMMARY_EPSILON: f64 = 1e-9;

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    /// 1-based month
    pub month: u32,
    pub income: f64,
    pub expense: f64,
    /// Always `income - expense`
    pub net: f64,
    pub transaction_count: u32,
}

impl MonthlySummary {
    fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            income: 0.0,
            expense: 0.0,
            net: 0.0,
            transaction_count: 0,
        }
    }

    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    fn add(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionType::Income => self.income += txn.amount,
            TransactionType::Expense => self.expense += txn.amount,
        }
        self.net = self.income - self.expense;
        self.transaction_count += 1;
    }

    fn subtract(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionType::Income => self.income -= txn.amount,
            TransactionType::Expense => self.expense -= txn.amount,
        }
        self.net = self.income - self.expense;
        self.transaction_count = self.transaction_count.saturating_sub(1);
    }
}

/// Totals for one (category, type) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub total: f64,
    pub transaction_count: u32,
    pub last_updated: DateTime<Utc>,
}

impl CategorySummary {
    fn empty(category: &str, kind: TransactionType, now: DateTime<Utc>) -> Self {
        Self {
            category: category.to_string(),
            kind,
            total: 0.0,
            transaction_count: 0,
            last_updated: now,
        }
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind == txn.kind && self.category == txn.category
    }
}

/// How `apply_update` prunes monthly buckets that drop to zero
///
/// Category buckets are always pruned at zero. For months, the long-standing
/// behavior keeps the bucket the old transaction was removed from, even when
/// it ends up empty. Whether that is intended has not been settled, so both
/// behaviors are available and the legacy one stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthlyPruning {
    /// Keep buckets with a nonzero count, plus the old transaction's month
    #[default]
    RetainTouchedMonth,
    /// Drop every bucket whose count reached zero
    PruneEmpty,
}

/// Derived per-month and per-category state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummariesData {
    /// Sorted newest month first
    pub monthly: Vec<MonthlySummary>,
    /// Sorted by total, largest first
    pub categories: Vec<CategorySummary>,
    pub last_updated: DateTime<Utc>,
}

impl Default for SummariesData {
    fn default() -> Self {
        Self {
            monthly: Vec::new(),
            categories: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl SummariesData {
    /// Build summaries from scratch in a single pass over the log
    pub fn recompute_all(transactions: &[Transaction]) -> Self {
        let now = Utc::now();
        let mut monthly: Vec<MonthlySummary> = Vec::new();
        let mut categories: Vec<CategorySummary> = Vec::new();
        let mut month_index: HashMap<(i32, u32), usize> = HashMap::new();
        let mut category_index: HashMap<(TransactionType, &str), usize> = HashMap::new();

        for txn in transactions {
            match txn.year_month() {
                Some((year, month)) => {
                    let idx = *month_index.entry((year, month)).or_insert_with(|| {
                        monthly.push(MonthlySummary::empty(year, month));
                        monthly.len() - 1
                    });
                    monthly[idx].add(txn);
                }
                None => warn!(id = %txn.id, date = %txn.date, "transaction date does not parse; skipped for monthly totals"),
            }

            let idx = *category_index
                .entry((txn.kind, txn.category.as_str()))
                .or_insert_with(|| {
                    categories.push(CategorySummary::empty(&txn.category, txn.kind, now));
                    categories.len() - 1
                });
            let bucket = &mut categories[idx];
            bucket.total += txn.amount;
            bucket.transaction_count += 1;
        }

        sort_monthly(&mut monthly);
        sort_categories(&mut categories);

        debug!(
            transactions = transactions.len(),
            months = monthly.len(),
            categories = categories.len(),
            "recomputed summaries"
        );

        Self {
            monthly,
            categories,
            last_updated: now,
        }
    }

    /// Fold a newly added transaction into the summaries
    pub fn apply_add(&mut self, txn: &Transaction) {
        let now = Utc::now();
        if self.add_contribution(txn, now) {
            sort_monthly(&mut self.monthly);
        }
        sort_categories(&mut self.categories);
        self.last_updated = now;
    }

    /// Replace `old`'s contribution with `new`'s, using the default pruning
    pub fn apply_update(&mut self, old: &Transaction, new: &Transaction) {
        self.apply_update_with(old, new, MonthlyPruning::default());
    }

    /// Replace `old`'s contribution with `new`'s
    pub fn apply_update_with(
        &mut self,
        old: &Transaction,
        new: &Transaction,
        pruning: MonthlyPruning,
    ) {
        let now = Utc::now();

        let touched = self.subtract_month(old);
        match pruning {
            MonthlyPruning::RetainTouchedMonth => self
                .monthly
                .retain(|m| m.transaction_count > 0 || Some(m.key()) == touched),
            MonthlyPruning::PruneEmpty => self.monthly.retain(|m| m.transaction_count > 0),
        }
        self.subtract_category(old);

        if self.add_contribution(new, now) {
            sort_monthly(&mut self.monthly);
        }
        sort_categories(&mut self.categories);
        self.last_updated = now;
    }

    /// Remove a deleted transaction's contribution
    pub fn apply_remove(&mut self, txn: &Transaction) {
        if let Some(key) = self.subtract_month(txn) {
            if let Some(pos) = self
                .monthly
                .iter()
                .position(|m| m.key() == key && m.transaction_count == 0)
            {
                self.monthly.remove(pos);
            }
        }
        self.subtract_category(txn);
        sort_categories(&mut self.categories);
        self.last_updated = Utc::now();
    }

    /// Look up a month's totals
    pub fn month(&self, year: i32, month: u32) -> Option<&MonthlySummary> {
        self.monthly.iter().find(|m| m.key() == (year, month))
    }

    /// Look up a (category, type) bucket
    pub fn category(&self, category: &str, kind: TransactionType) -> Option<&CategorySummary> {
        self.categories
            .iter()
            .find(|c| c.kind == kind && c.category == category)
    }

    /// Compare against another snapshot within `epsilon`
    ///
    /// Months are compared in order, categories by key. Months with a zero
    /// count carry no totals and are treated as absent; timestamps are
    /// ignored.
    pub fn is_equivalent_to(&self, other: &SummariesData, epsilon: f64) -> bool {
        let ours: Vec<&MonthlySummary> = self.active_months().collect();
        let theirs: Vec<&MonthlySummary> = other.active_months().collect();

        if ours.len() != theirs.len() || self.categories.len() != other.categories.len() {
            return false;
        }

        let months_match = ours.iter().zip(&theirs).all(|(a, b)| {
            a.key() == b.key()
                && a.transaction_count == b.transaction_count
                && approx_eq(a.income, b.income, epsilon)
                && approx_eq(a.expense, b.expense, epsilon)
                && approx_eq(a.net, b.net, epsilon)
        });

        months_match
            && self.categories.iter().all(|a| {
                other.category(&a.category, a.kind).map_or(false, |b| {
                    a.transaction_count == b.transaction_count
                        && approx_eq(a.total, b.total, epsilon)
                })
            })
    }

    /// Whether every total fits in an `f64`
    ///
    /// Sums of valid amounts can still overflow to infinity, and JSON has no
    /// representation for that.
    pub fn has_finite_totals(&self) -> bool {
        self.monthly
            .iter()
            .all(|m| m.income.is_finite() && m.expense.is_finite() && m.net.is_finite())
            && self.categories.iter().all(|c| c.total.is_finite())
    }

    fn active_months(&self) -> impl Iterator<Item = &MonthlySummary> {
        self.monthly.iter().filter(|m| m.transaction_count > 0)
    }

    /// Returns true if a new monthly bucket was inserted
    fn add_contribution(&mut self, txn: &Transaction, now: DateTime<Utc>) -> bool {
        let mut inserted = false;

        match txn.year_month() {
            Some((year, month)) => {
                match self.monthly.iter_mut().find(|m| m.key() == (year, month)) {
                    Some(bucket) => bucket.add(txn),
                    None => {
                        let mut bucket = MonthlySummary::empty(year, month);
                        bucket.add(txn);
                        self.monthly.push(bucket);
                        inserted = true;
                    }
                }
            }
            None => warn!(id = %txn.id, date = %txn.date, "transaction date does not parse; skipped for monthly totals"),
        }

        let bucket = match self.categories.iter().position(|c| c.matches(txn)) {
            Some(pos) => &mut self.categories[pos],
            None => {
                self.categories
                    .push(CategorySummary::empty(&txn.category, txn.kind, now));
                let last = self.categories.len() - 1;
                &mut self.categories[last]
            }
        };
        bucket.total += txn.amount;
        bucket.transaction_count += 1;
        bucket.last_updated = now;

        inserted
    }

    /// Decrement the transaction's month; returns the month key if one was touched
    fn subtract_month(&mut self, txn: &Transaction) -> Option<(i32, u32)> {
        let key = txn.year_month()?;
        match self.monthly.iter_mut().find(|m| m.key() == key) {
            Some(bucket) => {
                bucket.subtract(txn);
                Some(key)
            }
            None => {
                debug!(id = %txn.id, "no monthly bucket to decrement");
                None
            }
        }
    }

    /// Decrement the transaction's category bucket, pruning it at zero
    fn subtract_category(&mut self, txn: &Transaction) {
        let Some(pos) = self.categories.iter().position(|c| c.matches(txn)) else {
            debug!(id = %txn.id, "no category bucket to decrement");
            return;
        };

        let bucket = &mut self.categories[pos];
        bucket.total -= txn.amount;
        bucket.transaction_count = bucket.transaction_count.saturating_sub(1);
        bucket.last_updated = Utc::now();

        if bucket.transaction_count == 0 {
            self.categories.remove(pos);
        }
    }
}

fn sort_monthly(monthly: &mut [MonthlySummary]) {
    monthly.sort_by(|a, b| b.key().cmp(&a.key()));
}

// Stable, so equal totals keep first-seen order
fn sort_categories(categories: &mut [CategorySummary]) {
    categories.sort_by(|a, b| b.total.total_cmp(&a.total));
}

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= epsilon * scale
}
