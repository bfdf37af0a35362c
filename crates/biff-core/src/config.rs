//! biff.toml server configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{AgentOptions, NodeConfig, Schedule, ScheduledQuery};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Shared secret every host must present to `/enroll`.
    pub enroll_secret: String,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default, skip_serializing_if = "AgentOptions::is_empty")]
    pub options: AgentOptions,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/biff")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl ServerConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configs the server cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enroll_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("enroll_secret must not be empty".to_string()));
        }
        if self.schedule.is_empty() {
            return Err(ConfigError::Invalid(
                "schedule must contain at least one query".to_string(),
            ));
        }
        for (name, query) in &self.schedule {
            if query.query.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("schedule.{name}: query is empty")));
            }
            if query.interval == 0 {
                return Err(ConfigError::Invalid(format!(
                    "schedule.{name}: interval must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// The payload served to every enrolled node.
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            schedule: self.schedule.clone(),
            options: self.options.clone(),
        }
    }

    /// Scaffold a starter config around the given enroll secret.
    pub fn scaffold(enroll_secret: &str) -> Self {
        let mut schedule = Schedule::new();
        schedule.insert(
            "system_info".to_string(),
            ScheduledQuery::new(
                "SELECT hostname, cpu_brand, physical_memory FROM system_info;",
                3600,
                "Basic host inventory",
            ),
        );
        schedule.insert(
            "os_version".to_string(),
            ScheduledQuery::new(
                "SELECT name, version, build, platform FROM os_version;",
                86400,
                "Operating system release",
            ),
        );
        ServerConfig {
            enroll_secret: enroll_secret.to_string(),
            server: ServerSection::default(),
            options: AgentOptions::new(),
            schedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
enroll_secret = "somesecret"

[schedule.time]
query = "SELECT * FROM time;"
interval = "60"
"#;

    #[test]
    fn test_parse_minimal() {
        let config = ServerConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.enroll_secret, "somesecret");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.data_dir, PathBuf::from("/var/lib/biff"));
        assert_eq!(config.schedule["time"].interval, 60);
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
enroll_secret = "s3cret"

[server]
port = 9000
data_dir = "/tmp/biff"

[options]
distributed_interval = 60
logger_plugin = "tls"

[schedule.uptime]
query = "SELECT * FROM uptime;"
interval = 300
description = "Host uptime"
"#;
        let config = ServerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.options["distributed_interval"], 60);
        assert_eq!(config.options["logger_plugin"], "tls");
        assert_eq!(config.schedule["uptime"].description, "Host uptime");

        let node_config = config.node_config();
        assert_eq!(node_config.schedule, config.schedule);
        assert_eq!(node_config.options, config.options);
    }

    #[test]
    fn test_rejects_empty_secret() {
        let toml_str = MINIMAL.replace("somesecret", "  ");
        let err = ServerConfig::from_toml_str(&toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_schedule() {
        let err = ServerConfig::from_toml_str("enroll_secret = \"x\"\nschedule = {}\n").unwrap_err();
        assert!(err.to_string().contains("schedule"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let toml_str = MINIMAL.replace("\"60\"", "0");
        let err = ServerConfig::from_toml_str(&toml_str).unwrap_err();
        assert!(err.to_string().contains("schedule.time"));
    }

    #[test]
    fn test_missing_secret_is_parse_error() {
        let err = ServerConfig::from_toml_str("[schedule.t]\nquery = \"SELECT 1;\"\ninterval = 1\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_scaffold_round_trip() {
        let config = ServerConfig::scaffold("abc123");
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("abc123"));
        assert!(toml_str.contains("system_info"));

        let parsed = ServerConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.schedule, config.schedule);
    }

    #[test]
    fn test_render_error() {
        let mut config = ServerConfig::scaffold("abc123");
        config
            .options
            .insert("unset".to_string(), serde_json::Value::Null);
        let err = config.to_toml_string().unwrap_err();
        assert!(matches!(err, ConfigError::Render(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biff.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.schedule.len(), 1);
    }
}
