pub mod config;
pub mod info;
pub mod settings;
pub mod start;
pub mod stats;
pub mod tracks;

use focusmate_core::{Catalog, Database, SessionStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk store with the built-in catalog.
pub fn open_store() -> Result<SessionStore, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(SessionStore::new(Box::new(db), Catalog::builtin()))
}
