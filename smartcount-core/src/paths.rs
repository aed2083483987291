//! Path constants for configuration and log files.

use std::ffi::OsString;
use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/ and the cache directory
pub const CONFIG_DIR_NAME: &str = "smartcount";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "smartcount.log";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SMARTCOUNT_CONFIG";

/// Get the configuration directory path (~/.config/smartcount/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (`$SMARTCOUNT_CONFIG` or ~/.config/smartcount/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_path_from(std::env::var_os(CONFIG_PATH_ENV))
}

/// Resolve the config file path from an override value; empty values are ignored
fn config_path_from(override_path: Option<OsString>) -> PathBuf {
    override_path
        .filter(|value| !value.is_empty())
        .map_or_else(|| config_dir().join(CONFIG_FILE_NAME), PathBuf::from)
}

/// Get the log directory path (`<cache dir>/smartcount/`)
#[must_use]
pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(config_dir)
        .join(CONFIG_DIR_NAME)
}

/// Get the log file path (`<cache dir>/smartcount/smartcount.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    log_dir().join(LOG_FILE_NAME)
}
