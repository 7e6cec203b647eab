//! Transaction model
//!
//! Transactions are owned by the ledger; the summary engine and backup codec
//! only read them. Dates are kept as the string the user entered so that a
//! backup round trip reproduces them exactly.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Parse a transaction type from user input (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Opaque, caller-unique identifier
    pub id: String,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Always positive; direction comes from `kind`
    pub amount: f64,

    pub category: String,

    pub account: String,

    /// Timestamp string, see [`parse_timestamp`]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

/// Reasons a transaction fails validation
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionValidationError {
    MissingId,
    InvalidType(String),
    InvalidAmount(String),
    EmptyCategory,
    EmptyAccount,
    InvalidDate(String),
    Malformed(String),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "id must be a string"),
            Self::InvalidType(t) => write!(f, "type must be Income or Expense, got {}", t),
            Self::InvalidAmount(a) => write!(f, "amount must be a finite number > 0, got {}", a),
            Self::EmptyCategory => write!(f, "category must be a non-empty string"),
            Self::EmptyAccount => write!(f, "account must be a non-empty string"),
            Self::InvalidDate(d) => write!(f, "date is not a valid timestamp: {}", d),
            Self::Malformed(e) => write!(f, "malformed transaction: {}", e),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

impl Transaction {
    /// Create a transaction with the required fields
    pub fn new(
        id: impl Into<String>,
        kind: TransactionType,
        amount: f64,
        category: impl Into<String>,
        account: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            category: category.into(),
            account: account.into(),
            date: date.into(),
            note: None,
            image_uri: None,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Calendar (year, month) the transaction falls in, if the date parses
    pub fn year_month(&self) -> Option<(i32, u32)> {
        parse_timestamp(&self.date).map(|d| (d.year(), d.month()))
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(TransactionValidationError::InvalidAmount(
                self.amount.to_string(),
            ));
        }
        if !has_text(&self.category) {
            return Err(TransactionValidationError::EmptyCategory);
        }
        if !has_text(&self.account) {
            return Err(TransactionValidationError::EmptyAccount);
        }
        if parse_timestamp(&self.date).is_none() {
            return Err(TransactionValidationError::InvalidDate(self.date.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_income() { "+" } else { "-" };
        write!(
            f,
            "{} {} {}{:.2} ({})",
            self.date, self.category, sign, self.amount, self.account
        )
    }
}

/// Validate an untrusted JSON value and convert it into a transaction
///
/// Field checks run before deserialization so the error names the first
/// offending field rather than a serde message.
pub fn validate_transaction_value(value: &Value) -> Result<Transaction, TransactionValidationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| TransactionValidationError::Malformed("not an object".to_string()))?;

    if !obj.get("id").map_or(false, Value::is_string) {
        return Err(TransactionValidationError::MissingId);
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("Income") | Some("Expense") => {}
        other => {
            return Err(TransactionValidationError::InvalidType(
                other.map_or_else(|| "nothing".to_string(), str::to_string),
            ))
        }
    }

    let amount = obj.get("amount").and_then(Value::as_f64);
    if !amount.map_or(false, |a| a.is_finite() && a > 0.0) {
        return Err(TransactionValidationError::InvalidAmount(
            obj.get("amount").map_or_else(|| "nothing".to_string(), Value::to_string),
        ));
    }

    if !obj.get("category").and_then(Value::as_str).map_or(false, has_text) {
        return Err(TransactionValidationError::EmptyCategory);
    }
    if !obj.get("account").and_then(Value::as_str).map_or(false, has_text) {
        return Err(TransactionValidationError::EmptyAccount);
    }

    match obj.get("date").and_then(Value::as_str) {
        Some(date) if parse_timestamp(date).is_some() => {}
        other => {
            return Err(TransactionValidationError::InvalidDate(
                other.unwrap_or("nothing").to_string(),
            ))
        }
    }

    serde_json::from_value(value.clone())
        .map_err(|e| TransactionValidationError::Malformed(e.to_string()))
}

// Category and account need at least one non-whitespace character
fn has_text(s: &str) -> bool {
    !s.trim().is_empty()
}

/// Parse a timestamp string to the calendar date it names
///
/// Accepts RFC 3339 (local date as written), naive date-times, and plain
/// `YYYY-MM-DD` dates.
pub fn parse_timestamp(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
