//! Centralized application directory paths for labrank.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/labrank/` | `~/.config/labrank/` |
//! | Cache | `~/Library/Caches/labrank/` | `~/.cache/labrank/` |
//!
//! # Environment Overrides
//!
//! - `LABRANK_CONFIG_DIR` overrides [`config_dir`]
//! - `LABRANK_CACHE_DIR` overrides [`cache_dir`]

use std::path::PathBuf;

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/labrank/` by default. Override with
/// the `LABRANK_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("LABRANK_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("labrank"))
        .unwrap_or_else(|| PathBuf::from("/tmp/labrank-config"))
}

/// Application cache directory.
///
/// Used for downloaded embedding models. Resolves to
/// `dirs::cache_dir()/labrank/` by default. Override with the
/// `LABRANK_CACHE_DIR` environment variable.
#[must_use]
pub fn cache_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("LABRANK_CACHE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::cache_dir()
        .map(|d| d.join("labrank"))
        .unwrap_or_else(|| PathBuf::from("/tmp/labrank-cache"))
}

/// Embedding model cache (`cache_dir()/models/`).
#[must_use]
pub fn models_dir() -> PathBuf {
    cache_dir().join("models")
}

/// Default config file (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
