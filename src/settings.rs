use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};
use crate::staging::DEFAULT_TTL_MINUTES;
use crate::workbook::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Minutes a staged upload stays eligible for import.
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_session_ttl_minutes() -> u64 {
    DEFAULT_TTL_MINUTES
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            session_ttl_minutes: default_session_ttl_minutes(),
            max_upload_bytes: default_max_upload_bytes(),
            log_level: default_log_level(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("followup")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("followup")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| IntakeError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn db_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("followup.db")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.session_ttl_minutes, 30);
        assert_eq!(s.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(s.log_level, "warn");
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "session_ttl_minutes": 5}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/test");
        assert_eq!(s.session_ttl_minutes, 5);
        assert_eq!(s.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/srv/followup".to_string(),
            session_ttl_minutes: 15,
            max_upload_bytes: 1024,
            log_level: "debug".to_string(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.data_dir, "/srv/followup");
        assert_eq!(loaded.session_ttl_minutes, 15);
        assert_eq!(loaded.log_level, "debug");
    }

    #[test]
    fn test_db_path() {
        let p = db_path(std::path::Path::new("/data"));
        assert_eq!(p, PathBuf::from("/data/followup.db"));
    }
}
