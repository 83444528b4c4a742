//! Persistent configuration for the `iptrules` CLI
//!
//! The library core takes everything as arguments; this module only
//! supplies the defaults the binary feeds it (target [`Features`], the hash
//! comment prefix and the log level).

use crate::core::error::{Error, Result};
use crate::core::features::Features;
use crate::utils::config_path;
use crate::validators::validate_hash_prefix;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Capabilities of the target iptables version
    #[serde(default)]
    pub features: Features,
    /// Prefix of the tracking comment carrying each rule's hash
    #[serde(default = "default_hash_comment_prefix")]
    pub hash_comment_prefix: String,
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            features: Features::default(),
            hash_comment_prefix: default_hash_comment_prefix(),
            log_level: default_log_level(),
        }
    }
}

fn default_hash_comment_prefix() -> String {
    "cali".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Loads and validates a config file.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or parsed, or if the hash
/// comment prefix is unsafe to embed in a comment.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&json)?;
    validate_hash_prefix(&config.hash_comment_prefix)
        .map_err(|message| Error::validation("hash_comment_prefix", message))?;
    Ok(config)
}

/// Loads the config from the default location, or returns defaults if it is
/// missing or invalid.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return AppConfig::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config at {}: {e}", path.display());
            AppConfig::default()
        }
    }
}

/// Saves the config using an atomic write pattern.
/// 1. Writes to a temporary file in the target directory (mode 0o600 on Unix).
/// 2. Flushes it to disk.
/// 3. Atomically renames it over the target path.
///
/// # Errors
///
/// Returns `Err` if the directory cannot be created or the file cannot be
/// written or renamed.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(config)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::StorageFull {
            Error::Config("Disk full: cannot save configuration".to_string())
        } else {
            Error::Io(e.error)
        }
    })?;
    Ok(())
}
