//! Profile CLI commands

use clap::Subcommand;

use crate::error::TallyResult;
use crate::services::{ProfileField, ProfileService};
use crate::storage::Storage;

/// Profile subcommands
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show profile values
    Show,
    /// Set a profile value (theme, first-name, last-name, picture); empty clears it
    Set {
        field: String,
        value: String,
    },
    /// Set the selected currency (three-letter code)
    Currency {
        code: String,
    },
}

/// Handle a profile command
pub fn handle_profile_command(storage: &Storage, cmd: ProfileCommands) -> TallyResult<()> {
    let service = ProfileService::new(storage);

    match cmd {
        ProfileCommands::Show => {
            let profile = service.load()?;
            let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
            println!("First name: {}", show(&profile.first_name));
            println!("Last name:  {}", show(&profile.last_name));
            println!("Theme:      {}", show(&profile.theme_mode));
            println!(
                "Picture:    {}",
                if profile.has_picture { "set" } else { "(not set)" }
            );
            println!(
                "Currency:   {}",
                profile
                    .currency
                    .map(|c| match c {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "(not set)".to_string())
            );
        }
        ProfileCommands::Set { field, value } => {
            let field: ProfileField = field.parse()?;
            service.set(field, &value)?;
            println!("Updated {}", field);
        }
        ProfileCommands::Currency { code } => {
            service.set_currency(&code)?;
            println!("Currency set to {}", code.trim().to_uppercase());
        }
    }

    Ok(())
}
