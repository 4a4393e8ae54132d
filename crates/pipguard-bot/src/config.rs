//! Application configuration.
//!
//! Loaded from a TOML file: accounts list, engine thresholds,
//! telemetry/persistence paths and the cached TP ladders used by the
//! progressive variant. Credentials never live in the file; each
//! account names the environment variable holding its password.

use std::path::Path;

use pipguard_engine::EngineConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One terminal account to monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Short name used in logs, audit lines and file names.
    pub name: String,
    pub login: u64,
    pub server: String,
    /// Environment variable holding the account password.
    #[serde(default)]
    pub password_env: Option<String>,
    /// Run against the in-memory simulated broker instead of a
    /// terminal session.
    #[serde(default)]
    pub simulation: bool,
    /// Symbol for the seeded simulation scenario.
    #[serde(default)]
    pub test_symbol: Option<String>,
}

/// Monitor loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_summary_interval_secs")]
    pub summary_interval_secs: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_summary_interval_secs() -> u64 {
    300
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            summary_interval_secs: default_summary_interval_secs(),
        }
    }
}

/// File locations for audit log and heartbeats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
    #[serde(default = "default_heartbeat_dir")]
    pub heartbeat_dir: String,
}

fn default_audit_file() -> String {
    "logs/key_events.log".to_string()
}

fn default_heartbeat_dir() -> String {
    "heartbeats".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            audit_file: default_audit_file(),
            heartbeat_dir: default_heartbeat_dir(),
        }
    }
}

/// Durable state location (progressive hit groups).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_state_dir() -> String {
    "state".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

/// TP ladder for one signal group id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Signal group id, e.g. "G12345".
    pub group: String,
    /// Ordered TP prices, index 0 = TP1.
    pub levels: Vec<Decimal>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub accounts: Vec<AccountConfig>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub ladders: Vec<LadderConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| AppError::Config(format!("invalid {}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.accounts.is_empty() {
            return Err(AppError::Config("no accounts configured".to_string()));
        }
        let mut names: Vec<&str> = self.accounts.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.accounts.len() {
            return Err(AppError::Config("duplicate account names".to_string()));
        }
        for ladder in &self.ladders {
            if ladder.levels.is_empty() {
                return Err(AppError::Config(format!(
                    "ladder {} has no levels",
                    ladder.group
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [[accounts]]
        name = "main"
        login = 12345678
        server = "Broker-Live01"
        password_env = "PIPGUARD_MAIN_PASSWORD"

        [[accounts]]
        name = "demo"
        login = 555
        server = "Broker-Demo"
        simulation = true
        test_symbol = "EURUSD"

        [engine]
        progressive = true
        trigger_distance_pips = "3.01"

        [monitor]
        tick_interval_ms = 500

        [[ladders]]
        group = "G12345"
        levels = ["1.1010", "1.1020", "1.1030"]
    "#;

    #[test]
    fn test_parse_sample() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].name, "main");
        assert!(!config.accounts[0].simulation);
        assert!(config.accounts[1].simulation);
        assert!(config.engine.progressive);
        assert_eq!(config.monitor.tick_interval_ms, 500);
        assert_eq!(config.monitor.summary_interval_secs, 300);
        assert_eq!(config.ladders[0].levels[1], dec!(1.1020));
        assert_eq!(config.telemetry.audit_file, "logs/key_events.log");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn test_rejects_empty_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "accounts = []\n").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let toml = r#"
            [[accounts]]
            name = "main"
            login = 1
            server = "s"

            [[accounts]]
            name = "main"
            login = 2
            server = "s"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_ladder() {
        let toml = r#"
            [[accounts]]
            name = "main"
            login = 1
            server = "s"

            [[ladders]]
            group = "G1"
            levels = []
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }
}
