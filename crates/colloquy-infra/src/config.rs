//! Data directory and `config.toml` loading.
//!
//! A broken or missing config file never stops the binary: it logs and runs
//! on [`GlobalConfig::default`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use colloquy_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "COLLOQUY_DATA_DIR";

const CONFIG_FILE: &str = "config.toml";

/// `$COLLOQUY_DATA_DIR` when set and non-blank, else `~/.colloquy`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".colloquy"),
    }
}

/// Read `{data_dir}/config.toml`, falling back to defaults on any problem.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let path = data_dir.join(CONFIG_FILE);

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return GlobalConfig::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
            return GlobalConfig::default();
        }
    };

    toml::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "config malformed, using defaults");
        GlobalConfig::default()
    })
}
