//! Utility functions for directory management
//!
//! Follows the XDG Base Directory specification:
//!
//! - Config: `~/.config/iptrules/` - `config.json`

use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "IPTRULES_CONFIG";

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "iptrules", "iptrules").map(|pd| pd.config_dir().to_path_buf())
}

/// Resolves the config file path: `$IPTRULES_CONFIG` if set, else the XDG default.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    get_config_dir().map(|mut dir| {
        dir.push("config.json");
        dir
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_is_json() {
        if std::env::var_os(CONFIG_ENV_VAR).is_some() {
            return;
        }
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.json"));
        }
    }
}
