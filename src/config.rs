//! Layered daemon configuration.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `attendanced.toml` in the working directory
//! 3. `ATTENDANCED_*` environment variables, `__` separating sections
//!    (`ATTENDANCED_REPORTS__MONTHLY_TIE_BREAK=last`)
//!
//! `ATTENDANCED_LOG` is reserved for the tracing filter and is not read here.

use crate::classinfo::DEFAULT_CLASS_NAME;
use crate::report::TieBreak;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_FILE: &str = "attendanced.toml";
pub const ENV_PREFIX: &str = "ATTENDANCED_";
pub const LOG_ENV: &str = "ATTENDANCED_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_class_name() -> String {
    DEFAULT_CLASS_NAME.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportsConfig {
    #[serde(default)]
    pub monthly_tie_break: TieBreak,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassConfig {
    /// Shown when no class label has been saved.
    #[serde(default = "default_class_name")]
    pub default_name: String,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            default_name: default_class_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Workspace opened at startup, before any `workspace.select`.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub class: ClassConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["log"]).split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.class.default_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "class.default_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_sources() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load().expect("load");
            assert!(config.workspace.is_none());
            assert_eq!(config.log.filter, "info");
            assert_eq!(config.reports.monthly_tie_break, TieBreak::First);
            assert_eq!(config.class.default_name, DEFAULT_CLASS_NAME);
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                workspace = "/srv/class-7a"

                [reports]
                monthly_tie_break = "last"

                [class]
                default_name = "七年甲班"
                "#,
            )?;
            jail.set_env("ATTENDANCED_REPORTS__MONTHLY_TIE_BREAK", "first");
            jail.set_env("ATTENDANCED_LOG", "debug");
            let config = AppConfig::load().expect("load");
            assert_eq!(config.workspace, Some(PathBuf::from("/srv/class-7a")));
            assert_eq!(config.reports.monthly_tie_break, TieBreak::First);
            assert_eq!(config.class.default_name, "七年甲班");
            assert_eq!(config.log.filter, "info");
            Ok(())
        });
    }

    #[test]
    fn unknown_tie_break_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ATTENDANCED_REPORTS__MONTHLY_TIE_BREAK", "middle");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Figment(_))));
            Ok(())
        });
    }

    #[test]
    fn blank_default_class_name_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ATTENDANCED_CLASS__DEFAULT_NAME", " ");
            assert!(matches!(
                AppConfig::load(),
                Err(ConfigError::InvalidValue { .. })
            ));
            Ok(())
        });
    }
}
