//! Configuration types for logex.
//!
//! [`Config::load`] reads `~/.config/logex/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[storage]
db_path = "./log.db"

[ingest]
watch_dir        = "/var/log"
state_dir        = "./.logex"
poll_interval_ms = 2000
journal          = true
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from `~/.config/logex/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// `[storage]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./log.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// `[ingest]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Directory of plain-text log files to tail. Not scanned recursively.
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,
    /// Directory holding the journal cursor and per-file byte offsets.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Delay between tailer passes over the watch directory.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Whether to follow the system journal at all. Even when enabled the
    /// journal feed is skipped if `journalctl` is not on `PATH`.
    #[serde(default = "default_journal")]
    pub journal: bool,
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from("/var/log")
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("./.logex")
}
fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_journal() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            state_dir: default_state_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            journal: default_journal(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/logex/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(err) = std::fs::write(&path, DEFAULT_CONFIG.trim_start()) {
                tracing::warn!(error = %err, path = %path.display(), "could not write default config");
            }
        }

        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from(path.as_path()).required(false))
            .build()?
            .try_deserialize()
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logex")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
