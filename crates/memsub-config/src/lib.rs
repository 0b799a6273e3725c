use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_path: "./data/memsub.redb".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub statement_deadline_seconds: u64,
    pub connection_acquire_deadline_seconds: u64,
    pub pool_primary: u32,
    pub pool_overflow: u32,
    pub pool_recycle_seconds: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            statement_deadline_seconds: 30,
            connection_acquire_deadline_seconds: 10,
            pool_primary: 15,
            pool_overflow: 20,
            pool_recycle_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantConfig {
    pub ttl_hours: u64,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    pub ttl_minutes: u32,
    pub seed_activation_threshold_delta: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self { ttl_minutes: 45, seed_activation_threshold_delta: 0.15 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Path to a rule document overriding the shipped default; `None` (an
    /// empty string on disk) means "use the embedded default policy".
    pub document_path: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { document_path: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub concurrency: ConcurrencyConfig,
    pub grant: GrantConfig,
    pub spiral: SpiralConfig,
    pub policy: PolicyConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn has_policy_override(&self) -> bool {
        !self.policy.document_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_resource_model() {
        let config = AppConfig::default();
        assert_eq!(config.concurrency.pool_primary, 15);
        assert_eq!(config.concurrency.pool_overflow, 20);
        assert_eq!(config.grant.ttl_hours, 24);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("/nonexistent/path.toml").unwrap();
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn partial_toml_is_valid_via_serde_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memsub.toml");
        fs::write(&path, "[grant]\nttl_hours = 48\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.grant.ttl_hours, 48);
        assert_eq!(config.concurrency.pool_primary, 15);
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memsub.toml");
        let config = AppConfig::default();
        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.grant.ttl_hours, config.grant.ttl_hours);
    }
}
