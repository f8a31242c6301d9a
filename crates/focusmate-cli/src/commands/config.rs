use clap::Subcommand;
use focusmate_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value; unset optional values print nothing
    Get {
        /// Dot-path key (e.g. "timer.focus_secs", "audio.cue_dir")
        key: String,
    },
    /// Change one value and save
    Set {
        /// Dot-path key
        key: String,
        /// New value; an empty string clears `audio.cue_dir`
        value: String,
    },
    /// Print the whole configuration as TOML
    List {
        /// Print as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Print where the configuration file lives
    Path,
    /// Restore the default configuration
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            if let Some(value) = Config::load()?.get(&key)? {
                println!("{value}");
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key)?.unwrap_or_default());
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
