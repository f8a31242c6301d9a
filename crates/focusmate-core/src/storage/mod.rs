mod config;
pub mod database;
mod kv;
mod session_store;

pub use config::{AudioConfig, Config, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use kv::{KvStore, MemoryKv};
pub use session_store::{
    SessionStore, Settings, StoredState, CYCLES_KEY, SESSIONS_KEY, SETTINGS_KEY,
};

use std::path::PathBuf;

/// Returns the FocusMate data directory, creating it if needed.
///
/// `FOCUSMATE_DATA_DIR` overrides the location outright. Otherwise the
/// directory is `~/.config/focusmate`, or `~/.config/focusmate-dev` when
/// `FOCUSMATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSMATE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSMATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusmate-dev")
            } else {
                base_dir.join("focusmate")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
