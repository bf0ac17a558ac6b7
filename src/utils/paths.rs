use dirs::home_dir;
use std::{env, path::PathBuf};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TRIP_LEDGER_HOME";

const DEFAULT_DIR_NAME: &str = ".trip_ledger";
const STORE_DIR: &str = "store";
const CONFIG_FILE: &str = "config.json";

/// Returns the application data directory, defaulting to `~/.trip_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one JSON file per storage key.
pub fn store_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(STORE_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}
