use std::path::PathBuf;

use color_eyre::Result;
use dirs::data_dir;
use signbook_storage::csv_file_store::CsvFileStore;
use tracing::debug;

use crate::config::Settings;

/// Resolve the default location of the user table.
pub fn default_data_file() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("signbook").join("users.csv"))
}

/// Build the CSV store for the resolved settings.
pub fn store_from_settings(settings: &Settings) -> CsvFileStore {
    debug!(path = ?settings.data_file, "initializing csv store");
    CsvFileStore::new(settings.data_file.clone())
}
