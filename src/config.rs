//! Application configuration loaded from TOML files and environment variables.
//!
//! Precedence: explicit path > `VISIONCACHE_CONFIG` > `~/.config/visioncache.toml`
//! > `./visioncache.toml` > defaults; environment overrides are applied last.

use crate::cache::{CacheConfig, DEFAULT_STORAGE_KEY};
use crate::errors::{VisionError, VisionResult};
use crate::optimizer::{DEFAULT_THUMBNAIL_QUALITY, MIN_OPTIMIZE_BYTES, OptimizeOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub reserve: usize,
    pub default_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub storage_key: String,
    /// Directory of the file-backed store; defaults to the platform data dir.
    pub storage_dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            reserve: 100,
            default_ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 5 * 60,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    #[serde(flatten)]
    pub options: OptimizeOptions,
    pub min_optimize_bytes: u64,
    pub thumbnail_quality: u8,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            options: OptimizeOptions::default(),
            min_optimize_bytes: MIN_OPTIMIZE_BYTES,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    /// error|warn|info|debug|trace
    pub level: String,
    pub retention: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { dir: None, level: "info".to_string(), retention: 7 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheSettings,
    pub optimizer: OptimizerSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// Returns `VisionError::Config` on malformed TOML or mistyped fields.
    pub fn from_toml_str(s: &str) -> VisionResult<Self> {
        toml::from_str(s).map_err(|e| VisionError::Config(e.to_string()))
    }

    /// Reads one TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> VisionResult<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| VisionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Loads the first existing config file by precedence, then applies env overrides.
    ///
    /// # Errors
    /// Returns an error if an existing config file is malformed, or an env override
    /// cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> VisionResult<Self> {
        let mut cfg = Self::default();
        if let Some(path) = candidate_paths(explicit).into_iter().find(|p| p.exists()) {
            log::debug!("loading config from {}", path.display());
            cfg = Self::from_file(&path)?;
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies `VISIONCACHE_*` overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns `VisionError::Config` when a numeric override is not a number.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> VisionResult<()> {
        if let Some(dir) = lookup("VISIONCACHE_STORAGE_DIR") {
            self.cache.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(v) = lookup("VISIONCACHE_MAX_ENTRIES") {
            self.cache.max_entries = parse_env("VISIONCACHE_MAX_ENTRIES", &v)?;
        }
        if let Some(v) = lookup("VISIONCACHE_TTL_SECS") {
            self.cache.default_ttl_secs = parse_env("VISIONCACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("VISIONCACHE_LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }

    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.cache.max_entries.max(1),
            reserve: self.cache.reserve,
            default_ttl: Duration::from_secs(self.cache.default_ttl_secs),
            sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs.max(1)),
            storage_key: self.cache.storage_key.clone(),
        }
    }

    /// Storage directory for the cache snapshot.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.cache.storage_dir.clone().unwrap_or_else(|| {
            dirs_next::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("visioncache")
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> VisionResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VisionError::Config(format!("{key}: not a number: {value}")))
}

fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("VISIONCACHE_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join("visioncache.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("visioncache.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::OutputFormat;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [cache]
            max_entries = 50

            [optimizer]
            format = "png"
            quality = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cache.max_entries, 50);
        assert_eq!(cfg.cache.reserve, 100);
        assert_eq!(cfg.optimizer.options.format, OutputFormat::Png);
        assert_eq!(cfg.optimizer.options.max_width, 1024);
        assert_eq!(cfg.optimizer.min_optimize_bytes, MIN_OPTIMIZE_BYTES);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> =
            [("VISIONCACHE_MAX_ENTRIES", "10"), ("VISIONCACHE_TTL_SECS", "60")].into();
        let mut cfg = AppConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
        let cc = cfg.cache_config();
        assert_eq!(cc.max_entries, 10);
        assert_eq!(cc.default_ttl, Duration::from_secs(60));
    }

    #[test]
    fn bad_env_number_is_config_error() {
        let mut cfg = AppConfig::default();
        let err = cfg
            .apply_env(|k| (k == "VISIONCACHE_MAX_ENTRIES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(AppConfig::from_toml_str("[cache]\nmax_entries = \"x\"").is_err());
    }
}
