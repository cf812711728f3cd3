//! Configuration system for glshim

use crate::error::{GlshimError, Result};
use crate::program::ProgramKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub translator: TranslatorConfig,
    pub cache: CacheConfig,
    pub debug: DebugConfig,
}

/// ARB translator settings
///
/// Each table overrides individual limits on top of the built-in defaults
/// for that program kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    pub vertex: LimitOverrides,
    pub fragment: LimitOverrides,
}

/// Optional per-limit overrides as they appear in the config file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LimitOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_instructions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temporaries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_address_registers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_env_params: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_local_params: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_texture_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_texture_coords: Option<u32>,
}

/// Resource limits a program is checked against while parsing.
///
/// These stand in for the hardware capability queries of the host driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorLimits {
    pub max_instructions: u32,
    pub max_temporaries: u32,
    pub max_address_registers: u32,
    pub max_env_params: u32,
    pub max_local_params: u32,
    pub max_texture_units: u32,
    pub max_texture_coords: u32,
}

/// Precompiled shader archive settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub archive_path: PathBuf,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    /// Write every translated program next to `dump_path`
    pub dump_shaders: bool,
    pub dump_path: PathBuf,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// Default implementations

impl TranslatorLimits {
    pub fn vertex() -> Self {
        Self {
            max_instructions: 1024,
            max_temporaries: 32,
            max_address_registers: 1,
            max_env_params: 256,
            max_local_params: 256,
            max_texture_units: 0,
            max_texture_coords: 8,
        }
    }

    pub fn fragment() -> Self {
        Self {
            max_instructions: 1024,
            max_temporaries: 32,
            max_address_registers: 0,
            max_env_params: 64,
            max_local_params: 64,
            max_texture_units: 16,
            max_texture_coords: 8,
        }
    }

    /// Built-in limits for programs of the given kind
    pub fn for_kind(kind: ProgramKind) -> Self {
        match kind {
            ProgramKind::Vertex => Self::vertex(),
            ProgramKind::Fragment => Self::fragment(),
        }
    }

    fn apply(mut self, overrides: &LimitOverrides) -> Self {
        let pick = |over: Option<u32>, base: u32| over.unwrap_or(base);
        self.max_instructions = pick(overrides.max_instructions, self.max_instructions);
        self.max_temporaries = pick(overrides.max_temporaries, self.max_temporaries);
        self.max_address_registers =
            pick(overrides.max_address_registers, self.max_address_registers);
        self.max_env_params = pick(overrides.max_env_params, self.max_env_params);
        self.max_local_params = pick(overrides.max_local_params, self.max_local_params);
        self.max_texture_units = pick(overrides.max_texture_units, self.max_texture_units);
        self.max_texture_coords = pick(overrides.max_texture_coords, self.max_texture_coords);
        self
    }
}

impl TranslatorConfig {
    /// Limits that apply to programs of the given kind
    pub fn limits(&self, kind: ProgramKind) -> TranslatorLimits {
        let overrides = match kind {
            ProgramKind::Vertex => &self.vertex,
            ProgramKind::Fragment => &self.fragment,
        };
        TranslatorLimits::for_kind(kind).apply(overrides)
    }
}

impl CacheConfig {
    /// Archive location, or `None` when the archive is disabled
    pub fn active_archive(&self) -> Option<&Path> {
        if self.enabled {
            Some(self.archive_path.as_path())
        } else {
            None
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let base = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glshim");

        Self {
            enabled: true,
            archive_path: base.join("shaders.psa"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            dump_shaders: false,
            dump_path: PathBuf::from("glshim-dump"),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, or defaults if the file doesn't exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| GlshimError::Config(e.to_string()))
    }

    /// Save configuration to `path`
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| GlshimError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glshim")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.debug.log_level, LogLevel::Warn);
        assert_eq!(config.translator.limits(ProgramKind::Vertex).max_address_registers, 1);
        assert_eq!(config.translator.limits(ProgramKind::Fragment).max_address_registers, 0);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.translator.fragment.max_texture_units = Some(4);
        config.debug.log_level = LogLevel::Trace;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.translator.limits(ProgramKind::Fragment).max_texture_units,
            4
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [translator.vertex]
            max_temporaries = 12
            "#,
        )
        .unwrap();
        let vertex = config.translator.limits(ProgramKind::Vertex);
        assert_eq!(vertex.max_temporaries, 12);
        assert_eq!(vertex.max_env_params, 256);
        assert_eq!(
            config.translator.limits(ProgramKind::Fragment),
            TranslatorLimits::fragment()
        );
    }

    #[test]
    fn test_disabled_cache_has_no_archive() {
        let mut cache = CacheConfig::default();
        assert_eq!(cache.active_archive(), Some(cache.archive_path.as_path()));

        let config: Config = toml::from_str("[cache]\nenabled = false\n").unwrap();
        assert!(config.cache.active_archive().is_none());

        cache.enabled = false;
        assert!(cache.active_archive().is_none());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
