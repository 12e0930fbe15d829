use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::data::SchedulingKey;
use crate::error::ConfigError;
use crate::grading::{GradingPolicy, PassMarkMode, UngradedMarks};

/// Server configuration loaded from environment variables. The binary loads a
/// `.env` file from the working directory first, if there is one.
///
/// | Env Var                 | Default     |
/// |-------------------------|-------------|
/// | `HOST`                  | `127.0.0.1` |
/// | `PORT`                  | `8080`      |
/// | `LOG_LEVEL`             | `info`      |
/// | `CATALOG_PATH`          | unset (demo catalog) |
/// | `PASS_MARK_MODE`        | `percentage` |
/// | `UNGRADED_MARKS`        | `count`     |
/// | `DEFAULT_SEMESTER`      | `1`         |
/// | `DEFAULT_ACADEMIC_YEAR` | `2024-2025` |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub catalog_path: Option<PathBuf>,
    pub grading: GradingPolicy,
    /// Used when a generation request leaves out its scheduling key.
    pub default_key: SchedulingKey,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            catalog_path: None,
            grading: GradingPolicy::default(),
            default_key: SchedulingKey::new(1, "2024-2025"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT", defaults.port)?;
        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);
        let catalog_path = lookup("CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let pass_mark: PassMarkMode = parse_var(&lookup, "PASS_MARK_MODE", defaults.grading.pass_mark)?;
        let ungraded_marks: UngradedMarks =
            parse_var(&lookup, "UNGRADED_MARKS", defaults.grading.ungraded_marks)?;

        let semester = parse_var(&lookup, "DEFAULT_SEMESTER", defaults.default_key.semester)?;
        let academic_year =
            lookup("DEFAULT_ACADEMIC_YEAR").unwrap_or(defaults.default_key.academic_year);
        if academic_year.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_ACADEMIC_YEAR",
                value: academic_year,
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            log_level,
            catalog_path,
            grading: GradingPolicy {
                pass_mark,
                ungraded_marks,
            },
            default_key: SchedulingKey::new(semester, academic_year),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "HOST",
            value: raw,
            reason: e.to_string(),
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
