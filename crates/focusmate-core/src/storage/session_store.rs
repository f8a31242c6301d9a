//! Persisted counters and last-used settings.
//!
//! Layout in the key-value store:
//!
//! | key               | value                                       |
//! |-------------------|---------------------------------------------|
//! | `sessionsToday`   | decimal integer                             |
//! | `cyclesCompleted` | decimal integer                             |
//! | `settings`        | JSON `{"music": string, "notifications": bool}` |
//!
//! Anything unreadable loads as its default. Only the session in progress
//! and the settings flow write here, one after the other on the same task.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::kv::KvStore;
use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::timer::SessionCounters;

pub const SESSIONS_KEY: &str = "sessionsToday";
pub const CYCLES_KEY: &str = "cyclesCompleted";
pub const SETTINGS_KEY: &str = "settings";

/// User choices collected before a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Focus track URL. Empty means the first catalog track.
    pub music: String,
    pub notifications: bool,
}

impl Settings {
    pub fn defaults(catalog: &Catalog) -> Self {
        Self {
            music: catalog.default_focus_url().to_string(),
            notifications: true,
        }
    }
}

/// Everything `load()` reads at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredState {
    pub counters: SessionCounters,
    pub settings: Settings,
}

pub struct SessionStore {
    kv: Box<dyn KvStore>,
    catalog: Catalog,
}

impl SessionStore {
    pub fn new(kv: Box<dyn KvStore>, catalog: Catalog) -> Self {
        Self { kv, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read counters and settings, falling back to defaults for anything
    /// missing or malformed.
    pub fn load(&self) -> StoredState {
        StoredState {
            counters: self.load_counters(),
            settings: self.load_settings(),
        }
    }

    pub fn load_counters(&self) -> SessionCounters {
        SessionCounters {
            sessions_completed_today: self.read_count(SESSIONS_KEY),
            cycles_completed: self.read_count(CYCLES_KEY),
        }
    }

    /// Read persisted settings. A payload that is not a JSON object is
    /// removed from the store; fields of the wrong type fall back one by one.
    pub fn load_settings(&self) -> Settings {
        let defaults = Settings::defaults(&self.catalog);
        let raw = match self.kv.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return defaults,
            Err(e) => {
                warn!(error = %e, "failed to read saved settings");
                return defaults;
            }
        };

        let parsed = serde_json::from_str::<serde_json::Value>(&raw);
        let Some(obj) = parsed.as_ref().ok().and_then(|v| v.as_object()) else {
            warn!("discarding malformed saved settings");
            if let Err(e) = self.kv.remove(SETTINGS_KEY) {
                warn!(error = %e, "failed to remove malformed settings");
            }
            return defaults;
        };

        let music = obj
            .get("music")
            .and_then(|v| v.as_str())
            .map(|url| self.catalog.resolve_focus_url(url).to_string())
            .unwrap_or(defaults.music);
        let notifications = obj
            .get("notifications")
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.notifications);
        Settings {
            music,
            notifications,
        }
    }

    /// Persist counters. Called right after every counter change.
    pub fn save(&self, counters: &SessionCounters) -> Result<(), StoreError> {
        self.kv
            .set(SESSIONS_KEY, &counters.sessions_completed_today.to_string())?;
        self.kv
            .set(CYCLES_KEY, &counters.cycles_completed.to_string())?;
        Ok(())
    }

    /// Persist the settings a session was started with.
    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let json = serde_json::to_string(settings).map_err(|e| StoreError::Encode {
            key: SETTINGS_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.kv.set(SETTINGS_KEY, &json)
    }

    pub fn clear_settings(&self) -> Result<(), StoreError> {
        self.kv.remove(SETTINGS_KEY)
    }

    /// Wipe the counters. Only reachable from outside a running session.
    pub fn clear_counters(&self) -> Result<(), StoreError> {
        self.kv.remove(SESSIONS_KEY)?;
        self.kv.remove(CYCLES_KEY)
    }

    fn read_count(&self, key: &str) -> u32 {
        match self.kv.get(key) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "ignoring malformed counter");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(key, error = %e, "failed to read counter");
                0
            }
        }
    }
}
