//! Configuration management for depgate.
//!
//! Thresholds deserialize through the severity parser, so an unrecognized
//! value fails at load time; nothing falls back to a default lazily.

use crate::gate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub ecosystems: EcosystemsConfig,
    pub api: ApiConfig,
    pub audit: AuditSettings,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the given file, or the default config file when it exists, or
    /// built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depgate")
            .join("config.toml")
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Policy thresholds and the fail policy for an unreachable scan service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    #[serde(with = "severity_serde")]
    pub vulnerability_threshold: Severity,
    #[serde(with = "severity_serde")]
    pub license_threshold: Severity,
    pub block_on_api_failure: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            vulnerability_threshold: Severity::Low,
            license_threshold: Severity::Low,
            block_on_api_failure: true,
        }
    }
}

/// Per-ecosystem scanning toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemsConfig {
    pub maven: bool,
    pub npm: bool,
    pub pypi: bool,
}

impl Default for EcosystemsConfig {
    fn default() -> Self {
        Self {
            maven: true,
            npm: true,
            pypi: true,
        }
    }
}

/// Settings for the upstream vulnerability-data provider. Consumed by the
/// host's scanner implementations; carried here so one file configures the
/// whole plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub token: String,
    pub organization: String,
    /// Base for persisted reference URLs.
    pub vuln_base_url: String,
    pub ssl_certificate_path: String,
    pub trust_all_certificates: bool,
    pub http_proxy_host: String,
    pub http_proxy_port: u16,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://snyk.io/api/v1/".to_string(),
            token: String::new(),
            organization: String::new(),
            vuln_base_url: "https://snyk.io/vuln/".to_string(),
            ssl_certificate_path: String::new(),
            trust_all_certificates: false,
            http_proxy_host: String::new(),
            http_proxy_port: 8080,
            timeout_secs: 10,
        }
    }
}

/// Audit log location and rotation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub enabled: bool,
    /// Log file path [default: platform data dir].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_file_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_file_bytes: 10 * 1024 * 1024,
            max_rotated_files: 5,
        }
    }
}

impl AuditSettings {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("depgate")
                .join("audit.log")
        })
    }
}

/// Serde helper routing severities through the case-insensitive parser.
mod severity_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(severity: &Severity, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&severity.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Severity, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
