// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logger configuration.
//!
//! ## Sources
//!
//! [`LoggerConfig::load`] merges, later sources overriding earlier ones:
//!
//! 1. **Defaults** - see [`LoggerConfig::default`]
//! 2. **YAML file** - optional, e.g. `gol.yaml`
//! 3. **Environment variables** - `GOL_` prefix, `__` separates nested keys
//!
//! ```yaml
//! list_name: chat-logs
//! redis:
//!   host: 127.0.0.1
//!   port: 6379
//! log_service:
//!   host: logs.example.com
//!   port: 443
//!   path: v1/ingest
//! pool:
//!   max_size: 16
//!   wait_timeout_ms: 2000
//! mode: absorb
//! ```
//!
//! is equivalent to `GOL_LIST_NAME=chat-logs`, `GOL_REDIS__HOST=127.0.0.1`,
//! `GOL_LOG_SERVICE__PATH=v1/ingest`, `GOL_POOL__WAIT_TIMEOUT_MS=2000`, ...
//!
//! ## Validation
//!
//! A configuration is only usable once [`LoggerConfig::validate`] passes; the
//! logger calls it on construction. The list name and the Redis host and port
//! are required. The log service is optional, but when present needs a host
//! and a port.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::message::Target;

const DEFAULT_POOL_SIZE: usize = 8;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether delivery failures reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Every failure is returned as an error. Fallback sinks still receive
    /// diagnostics for serialization and delivery failures.
    #[default]
    Strict,
    /// Every failure, invalid messages included, is handed to the fallback
    /// sinks and the call succeeds. Behaves like `Strict` when no sink is
    /// registered.
    Absorb,
}

/// Address of a remote service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Only used by the log service.
    pub path: String,
}

impl ServiceConfig {
    #[must_use]
    pub fn domain(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn uri(&self) -> String {
        format!(
            "https://{}/{}",
            self.domain(),
            self.path.trim_start_matches('/')
        )
    }

    fn validate(&self, host: &'static str, port: &'static str) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField(host));
        }
        if self.port == 0 {
            return Err(ConfigError::MissingField(port));
        }
        Ok(())
    }
}

/// Redis connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_size: usize,
    /// How long a push waits for a free connection.
    #[serde(rename = "wait_timeout_ms", deserialize_with = "deserialize_duration_from_millis")]
    pub wait_timeout: Duration,
    #[serde(rename = "connect_timeout_ms", deserialize_with = "deserialize_duration_from_millis")]
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_size: DEFAULT_POOL_SIZE,
            wait_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Redis list the messages are pushed to.
    pub list_name: String,
    pub redis: ServiceConfig,
    pub log_service: Option<ServiceConfig>,
    pub pool: PoolConfig,
    #[serde(rename = "http_timeout_ms", deserialize_with = "deserialize_duration_from_millis")]
    pub http_timeout: Duration,
    pub mode: DeliveryMode,
    /// Targets this deployment accepts. Messages naming any other target are rejected.
    pub targets: Vec<Target>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            list_name: String::new(),
            redis: ServiceConfig::default(),
            log_service: None,
            pool: PoolConfig::default(),
            http_timeout: DEFAULT_TIMEOUT,
            mode: DeliveryMode::default(),
            targets: Target::ALL.to_vec(),
        }
    }
}

impl LoggerConfig {
    /// Loads the configuration from an optional YAML file and `GOL_*` environment variables.
    ///
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<LoggerConfig, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: LoggerConfig = figment
            .merge(Env::prefixed("GOL_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_name.trim().is_empty() {
            return Err(ConfigError::MissingField("list_name"));
        }
        self.redis.validate("redis.host", "redis.port")?;
        if let Some(log_service) = &self.log_service {
            log_service.validate("log_service.host", "log_service.port")?;
        }
        if self.pool.max_size == 0 {
            return Err(ConfigError::Invalid(
                "pool.max_size must be greater than zero".to_string(),
            ));
        }
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid(
                "targets must declare at least one target".to_string(),
            ));
        }
        Ok(())
    }
}

fn deserialize_duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> LoggerConfig {
        LoggerConfig {
            list_name: "logs".to_string(),
            redis: ServiceConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                path: String::new(),
            },
            ..LoggerConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_empty_list_name() {
        let config = LoggerConfig {
            list_name: "  ".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("list_name"))
        );
    }

    #[test]
    fn test_redis_address_required() {
        let mut config = valid();
        config.redis.host = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("redis.host"))
        );

        let mut config = valid();
        config.redis.port = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("redis.port"))
        );
    }

    #[test]
    fn test_log_service_validated_when_present() {
        let config = LoggerConfig {
            log_service: Some(ServiceConfig {
                host: "logs.example.com".to_string(),
                port: 0,
                path: "ingest".to_string(),
            }),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("log_service.port"))
        );
    }

    #[test]
    fn test_no_declared_targets() {
        let config = LoggerConfig {
            targets: Vec::new(),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_uri() {
        let service = ServiceConfig {
            host: "logs.example.com".to_string(),
            port: 443,
            path: "/v1/ingest".to_string(),
        };
        assert_eq!(service.uri(), "https://logs.example.com:443/v1/ingest");
        assert_eq!(service.domain(), "logs.example.com:443");
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GOL_LIST_NAME", "chat-logs");
            jail.set_env("GOL_REDIS__HOST", "redis.internal");
            jail.set_env("GOL_REDIS__PORT", "6380");
            jail.set_env("GOL_POOL__WAIT_TIMEOUT_MS", "250");
            jail.set_env("GOL_MODE", "absorb");

            let config = LoggerConfig::load(None).unwrap();
            assert_eq!(config.list_name, "chat-logs");
            assert_eq!(config.redis.domain(), "redis.internal:6380");
            assert_eq!(config.pool.wait_timeout, Duration::from_millis(250));
            assert_eq!(config.pool.connect_timeout, DEFAULT_TIMEOUT);
            assert_eq!(config.mode, DeliveryMode::Absorb);
            assert_eq!(config.log_service, None);
            assert_eq!(config.targets, Target::ALL.to_vec());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "gol.yaml",
                r"
list_name: yaml-logs
redis:
  host: redis.internal
  port: 6379
log_service:
  host: logs.example.com
  port: 443
  path: v1/ingest
http_timeout_ms: 1500
targets:
  - dashbot
  - elastic
",
            )?;
            jail.set_env("GOL_LIST_NAME", "env-logs");

            let config = LoggerConfig::load(Some(Path::new("gol.yaml"))).unwrap();
            assert_eq!(config.list_name, "env-logs");
            assert_eq!(
                config.log_service.map(|s| s.uri()),
                Some("https://logs.example.com:443/v1/ingest".to_string())
            );
            assert_eq!(config.http_timeout, Duration::from_millis(1500));
            assert_eq!(config.targets, vec![Target::Dashbot, Target::Elastic]);
            assert_eq!(config.mode, DeliveryMode::Strict);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_missing_list_name() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GOL_REDIS__HOST", "redis.internal");
            jail.set_env("GOL_REDIS__PORT", "6379");

            assert_eq!(
                LoggerConfig::load(None),
                Err(ConfigError::MissingField("list_name"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_load_reports_bad_values() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GOL_MODE", "sometimes");

            assert!(matches!(
                LoggerConfig::load(None),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }
}
