//! Workbench configuration: a TOML file when present, `GREENLIGHT_*`
//! environment variables on top, programmatic overrides last.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::gate::DEFAULT_COMMENT_MAX_LEN;
use crate::payload::{FieldRule, FieldSource};

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub module: ModulePolicy,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

/// Per-module tunables plus the payload field-resolution table.
#[derive(Clone, Debug, PartialEq)]
pub struct ModulePolicy {
    pub module: String,
    pub comment_max_len: usize,
    pub settle_delay_ms: u64,
    /// Most modules preserve the operator's input after a failed
    /// dispatch so they can retry without re-typing.
    pub reset_gate_on_failure: bool,
    pub field_rules: Vec<FieldRule>,
}

impl ModulePolicy {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            comment_max_len: DEFAULT_COMMENT_MAX_LEN,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            reset_gate_on_failure: false,
            field_rules: Self::standard_field_rules(),
        }
    }

    /// The fields every module's approval payload carries; module
    /// extras are appended on top.
    pub fn standard_field_rules() -> Vec<FieldRule> {
        vec![
            FieldRule::new(
                "TrNo",
                vec![FieldSource::RefNo, FieldSource::Item("TrNo".to_string())],
                "",
            ),
            FieldRule::new("MOID", vec![FieldSource::Moid], ""),
            FieldRule::new("CheckAmount", vec![FieldSource::CheckAmount], "0"),
            FieldRule::new("Action", vec![FieldSource::ActionValue], "Verify"),
            FieldRule::new("ActionRemarks", vec![FieldSource::Comment], ""),
            FieldRule::new("ActionBy", vec![FieldSource::ActorName], "N/A"),
            FieldRule::new("ActionRole", vec![FieldSource::ActorRole], ""),
            FieldRule::new("UserId", vec![FieldSource::ActorId], ""),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub module: Option<String>,
    pub comment_max_len: Option<usize>,
    pub settle_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    client: RawClient,
    #[serde(default)]
    module: RawModule,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Debug, Default, Deserialize)]
struct RawClient {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawModule {
    name: Option<String>,
    comment_max_len: Option<usize>,
    settle_delay_ms: Option<u64>,
    reset_gate_on_failure: Option<bool>,
    #[serde(default, rename = "field")]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    detail_key: Option<String>,
    item_key: Option<String>,
    #[serde(default)]
    default: String,
}

impl RawField {
    fn into_rule(self) -> FieldRule {
        let detail_key = self.detail_key.unwrap_or_else(|| self.name.clone());
        let item_key = self.item_key.unwrap_or_else(|| self.name.clone());
        FieldRule::new(
            self.name,
            vec![FieldSource::Detail(detail_key), FieldSource::Item(item_key)],
            self.default,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawLogging {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let raw = match &options.path {
            Some(path) => read_raw(path)?,
            None => RawConfig::default(),
        };

        let overrides = options.overrides;
        let base_url = overrides
            .base_url
            .or_else(|| env_var("GREENLIGHT_BASE_URL"))
            .or(raw.client.base_url)
            .unwrap_or_default();
        let timeout_secs = overrides
            .timeout_secs
            .or_else(|| env_parsed("GREENLIGHT_TIMEOUT_SECS"))
            .or(raw.client.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_attempts =
            overrides.max_attempts.or(raw.client.max_attempts).unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let module_name = overrides
            .module
            .or_else(|| env_var("GREENLIGHT_MODULE"))
            .or(raw.module.name)
            .unwrap_or_default();
        let mut module = ModulePolicy::new(module_name);
        if let Some(limit) = overrides.comment_max_len.or(raw.module.comment_max_len) {
            module.comment_max_len = limit;
        }
        if let Some(delay) = overrides.settle_delay_ms.or(raw.module.settle_delay_ms) {
            module.settle_delay_ms = delay;
        }
        if let Some(reset) = raw.module.reset_gate_on_failure {
            module.reset_gate_on_failure = reset;
        }
        module.field_rules.extend(raw.module.fields.into_iter().map(RawField::into_rule));

        let logging = LoggingConfig {
            level: overrides
                .log_level
                .or_else(|| env_var("GREENLIGHT_LOG_LEVEL"))
                .or(raw.logging.level)
                .unwrap_or_else(|| "info".to_string()),
            format: raw.logging.format.unwrap_or(LogFormat::Compact),
        };

        let config = Self {
            client: ClientConfig { base_url, timeout_secs, max_attempts },
            module,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "client.base_url",
                reason: "a backend base URL is required".to_string(),
            });
        }
        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "client.base_url",
                reason: format!("`{}` is not an http(s) URL", self.client.base_url),
            });
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "client.timeout_secs",
                reason: "timeout must be at least one second".to_string(),
            });
        }
        if self.client.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "client.max_attempts",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.module.module.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "module.name",
                reason: "a module code is required".to_string(),
            });
        }
        if self.module.comment_max_len == 0 {
            return Err(ConfigError::Invalid {
                field: "module.comment_max_len",
                reason: "the comment limit must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    toml::from_str(&contents)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|value| value.parse().ok())
}
