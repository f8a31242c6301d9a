use clap::Subcommand;

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the settings the next session starts with
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget saved settings
    Reset,
}

pub fn run(action: SettingsAction) -> CliResult {
    let store = open_store()?;

    match action {
        SettingsAction::Show { json } => {
            let settings = store.load_settings();
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                let name = store
                    .catalog()
                    .track_name(&settings.music)
                    .unwrap_or("unknown");
                let state = if settings.notifications { "on" } else { "off" };
                println!("Music:         {name}");
                println!("               {}", settings.music);
                println!("Notifications: {state}");
            }
        }
        SettingsAction::Reset => {
            store.clear_settings()?;
            println!("settings reset");
        }
    }
    Ok(())
}
