//! On-disk locations used by the CLI.
//!
//! Everything lives under `~/.chainname/` unless `--config` points
//! elsewhere, in which case the consent file sits next to the config file.

use std::path::{Path, PathBuf};

/// File holding the persisted consent state.
pub const CONSENT_FILE: &str = "consent.json";

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainname")
}

/// Get the default config file path.
#[must_use]
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Config file to use, given the `--config` override.
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_config_path, Path::to_path_buf)
}

/// Consent file belonging to `config_path`.
#[must_use]
pub fn consent_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map_or_else(|| PathBuf::from(CONSENT_FILE), |dir| dir.join(CONSENT_FILE))
}
