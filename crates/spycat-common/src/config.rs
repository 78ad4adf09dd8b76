use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = ".spycat/config.toml";
const DEFAULT_DB_FILE: &str = "spycat.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpyCatConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub breeds: BreedsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_file")]
    pub file_name: String,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Breed names accepted when a cat is created. Empty means any non-empty name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreedsConfig {
    #[serde(default)]
    pub allowlist: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file_name: default_db_file(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for SpyCatConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".spycat")
            .join("data");

        Self {
            data_dir,
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            breeds: BreedsConfig::default(),
        }
    }
}

fn default_db_file() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize default config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("config has invalid value: {0}")]
    ValidationFailed(String),
}

impl SpyCatConfig {
    pub fn resolve_path() -> PathBuf {
        if let Ok(path) = env::var("SPYCAT_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, raw).map_err(|source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn load_or_create() -> Result<(Self, PathBuf, bool), ConfigError> {
        let path = Self::resolve_path();
        if path.exists() {
            let cfg = Self::load(&path)?;
            return Ok((cfg, path, false));
        }

        let cfg = Self::default();
        cfg.save(&path)?;
        Ok((cfg, path, true))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.file_name)
    }

    pub fn validate_and_prepare(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "log_level cannot be empty".to_string(),
            ));
        }
        if self.database.file_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "database.file_name cannot be empty".to_string(),
            ));
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "database.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "server.bind cannot be empty".to_string(),
            ));
        }
        if let Some(blank) = self.breeds.allowlist.iter().position(|b| b.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(format!(
                "breeds.allowlist[{blank}] cannot be empty"
            )));
        }
        fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::WriteFailed {
            path: self.data_dir.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_keeps_sections() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("nested/config.toml");
        let cfg = SpyCatConfig {
            data_dir: tmp.path().join("data"),
            breeds: BreedsConfig {
                allowlist: vec!["Siamese".to_string()],
            },
            ..SpyCatConfig::default()
        };
        cfg.save(&path).expect("save config");

        let loaded = SpyCatConfig::load(&path).expect("load config");
        assert_eq!(loaded.data_dir, tmp.path().join("data"));
        assert_eq!(loaded.database.busy_timeout_ms, 5_000);
        assert_eq!(loaded.breeds.allowlist, vec!["Siamese".to_string()]);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: SpyCatConfig =
            toml::from_str("data_dir = \"/tmp/spycat\"\nlog_level = \"debug\"\n")
                .expect("parse minimal config");
        assert_eq!(cfg.database.file_name, "spycat.db");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert!(cfg.breeds.allowlist.is_empty());
        assert_eq!(cfg.db_path(), PathBuf::from("/tmp/spycat/spycat.db"));
    }

    #[test]
    fn zero_busy_timeout_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let mut cfg = SpyCatConfig {
            data_dir: tmp.path().to_path_buf(),
            ..SpyCatConfig::default()
        };
        cfg.database.busy_timeout_ms = 0;
        let err = cfg.validate_and_prepare().expect_err("must reject");
        assert!(err.to_string().contains("busy_timeout_ms"));
    }

    #[test]
    fn validate_creates_data_dir() {
        let tmp = tempdir().expect("tempdir");
        let cfg = SpyCatConfig {
            data_dir: tmp.path().join("a/b"),
            ..SpyCatConfig::default()
        };
        cfg.validate_and_prepare().expect("valid config");
        assert!(tmp.path().join("a/b").is_dir());
    }
}
