//! Backup file formats
//!
//! A backup file holds an [`EncryptedBackup`] envelope. Its sealed content is
//! a [`BackupPayload`], whose `data` slices are each optional: a missing slice
//! means the value was not exported, never that it was empty.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::crypto::SealedPayload;
use crate::error::{TallyError, TallyResult};

use super::transaction::Transaction;

/// The envelope written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedBackup {
    pub version: i64,
    /// ISO-8601 export time
    pub timestamp: String,
    pub encrypted: bool,
    /// `base64(nonce || ciphertext)`
    pub sealed_data: String,
    /// Lowercase hex HMAC-SHA256 of `sealed_data`
    pub signature: String,
}

impl EncryptedBackup {
    pub fn new(version: i64, timestamp: DateTime<Utc>, sealed: SealedPayload) -> Self {
        Self {
            version,
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            encrypted: true,
            sealed_data: sealed.sealed_data,
            signature: sealed.signature,
        }
    }

    /// Check the envelope shape of untrusted JSON
    ///
    /// All five fields must be present with the right JSON types and
    /// `encrypted` must be `true`. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> TallyResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("backup is not a JSON object"))?;

        let version = obj
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| invalid("version must be an integer"))?;
        let timestamp = string_field(obj, "timestamp")?;
        match obj.get("encrypted") {
            Some(Value::Bool(true)) => {}
            Some(Value::Bool(false)) => return Err(invalid("backup is not encrypted")),
            _ => return Err(invalid("encrypted must be a boolean")),
        }
        let sealed_data = string_field(obj, "sealedData")?;
        let signature = string_field(obj, "signature")?;

        Ok(Self {
            version,
            timestamp,
            encrypted: true,
            sealed_data,
            signature,
        })
    }
}

fn string_field(obj: &serde_json::Map<String, Value>, name: &str) -> TallyResult<String> {
    obj.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(&format!("{} must be a string", name)))
}

fn invalid(message: &str) -> TallyError {
    TallyError::InvalidEnvelopeFormat(message.to_string())
}

/// Plaintext sealed inside the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub version: u32,
    pub timestamp: String,
    pub data: BackupData,
}

/// Exported application state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,

    /// Opaque goal records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_categories: Option<Vec<String>>,

    /// Opaque; `Some(Value::Null)` is an explicit null
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_currency: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// `Some(None)` means the picture was explicitly cleared
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_picture: Option<Option<String>>,
}

impl BackupData {
    /// Names of the slices that are present, in persistence order
    pub fn present_fields(&self) -> Vec<&'static str> {
        [
            ("transactions", self.transactions.is_some()),
            ("goals", self.goals.is_some()),
            ("accounts", self.accounts.is_some()),
            ("expenseCategories", self.expense_categories.is_some()),
            ("incomeCategories", self.income_categories.is_some()),
            ("selectedCurrency", self.selected_currency.is_some()),
            ("themeMode", self.theme_mode.is_some()),
            ("firstName", self.first_name.is_some()),
            ("lastName", self.last_name.is_some()),
            ("profilePicture", self.profile_picture.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

// A present key, even one holding null, deserializes to Some
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
