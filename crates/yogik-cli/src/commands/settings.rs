use clap::Subcommand;
use yogik_core::{Settings, Store};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all settings as JSON
    Show,
    /// Set a value
    Set {
        /// Setting name (e.g. "prep_time_secs", "breath_in_label")
        key: String,
        /// New value
        value: String,
    },
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: SettingsAction, store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SettingsAction::Show => {
            let settings = Settings::load(store);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = Settings::load(store);
            settings.set(&key, &value)?;
            settings.save(store)?;
            println!("ok");
        }
        SettingsAction::Reset => {
            Settings::default().save(store)?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
