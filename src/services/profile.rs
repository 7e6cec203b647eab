//! Profile and preference values
//!
//! Name, theme, and picture live in the secure store. The selected currency
//! is an opaque JSON value in the plain store.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{TallyError, TallyResult};
use crate::storage::{get_json, keys, set_json, Storage};

/// A settable profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    ThemeMode,
    FirstName,
    LastName,
    ProfilePicture,
}

impl ProfileField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ThemeMode => keys::THEME_MODE,
            Self::FirstName => keys::FIRST_NAME,
            Self::LastName => keys::LAST_NAME,
            Self::ProfilePicture => keys::PROFILE_PICTURE,
        }
    }
}

impl FromStr for ProfileField {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "theme" | "thememode" => Ok(Self::ThemeMode),
            "firstname" => Ok(Self::FirstName),
            "lastname" => Ok(Self::LastName),
            "picture" | "profilepicture" => Ok(Self::ProfilePicture),
            _ => Err(TallyError::Validation(format!(
                "Unknown profile field '{}'. Valid: theme, first-name, last-name, picture",
                s
            ))),
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Current profile values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub theme_mode: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub has_picture: bool,
    pub currency: Option<Value>,
}

/// Reads and writes profile values
pub struct ProfileService<'a> {
    storage: &'a Storage,
}

impl<'a> ProfileService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> TallyResult<Profile> {
        let secure = self.storage.secure();
        let picture: Option<String> = get_json(secure, keys::PROFILE_PICTURE)?;
        Ok(Profile {
            theme_mode: get_json(secure, keys::THEME_MODE)?,
            first_name: get_json(secure, keys::FIRST_NAME)?,
            last_name: get_json(secure, keys::LAST_NAME)?,
            has_picture: picture.map_or(false, |p| !p.is_empty()),
            currency: get_json(self.storage.plain(), keys::SELECTED_CURRENCY)?,
        })
    }

    /// Set a field; an empty value removes it
    pub fn set(&self, field: ProfileField, value: &str) -> TallyResult<()> {
        let secure = self.storage.secure();
        let value = value.trim();
        if value.is_empty() {
            secure.remove(field.key())
        } else {
            set_json(secure, field.key(), value)
        }
    }

    /// Store the selected currency code
    pub fn set_currency(&self, code: &str) -> TallyResult<()> {
        let code = code.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TallyError::Validation(format!(
                "Currency must be a three-letter code, got '{}'",
                code
            )));
        }
        set_json(self.storage.plain(), keys::SELECTED_CURRENCY, &code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LockedStore, MemoryStore};

    #[test]
    fn test_field_parsing() {
        assert_eq!("theme".parse::<ProfileField>().unwrap(), ProfileField::ThemeMode);
        assert_eq!("first-name".parse::<ProfileField>().unwrap(), ProfileField::FirstName);
        assert_eq!("lastName".parse::<ProfileField>().unwrap(), ProfileField::LastName);
        assert!("nickname".parse::<ProfileField>().is_err());
    }

    #[test]
    fn test_set_and_load() {
        let storage = Storage::in_memory();
        let profile = ProfileService::new(&storage);

        profile.set(ProfileField::FirstName, "Ada").unwrap();
        profile.set(ProfileField::ThemeMode, "dark").unwrap();
        profile.set(ProfileField::ProfilePicture, "data:image/png;base64,AA").unwrap();
        profile.set_currency("eur").unwrap();

        let loaded = profile.load().unwrap();
        assert_eq!(loaded.first_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.theme_mode.as_deref(), Some("dark"));
        assert!(loaded.has_picture);
        assert_eq!(loaded.currency, Some(Value::String("EUR".to_string())));

        profile.set(ProfileField::FirstName, "").unwrap();
        assert!(profile.load().unwrap().first_name.is_none());
    }

    #[test]
    fn test_invalid_currency() {
        let storage = Storage::in_memory();
        assert!(ProfileService::new(&storage).set_currency("dollars").is_err());
    }

    #[test]
    fn test_locked_store() {
        let storage = Storage::new(MemoryStore::new(), LockedStore);
        let profile = ProfileService::new(&storage);
        assert!(profile.load().is_err());
        assert!(profile.set(ProfileField::LastName, "Lovelace").is_err());
    }
}
