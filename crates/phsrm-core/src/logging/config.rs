//! Logging configuration.
//!
//! `PHSRM_LOG` sets the engine level and `PHSRM_LOG_FORMAT` the output form.
//! A `RUST_LOG` value is never interpreted here; [`super::env_filter`] hands
//! it to `EnvFilter` whole.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl LogFormat {
    const ALL: [LogFormat; 2] = [LogFormat::Human, LogFormat::Jsonl];

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

/// Minimum level for engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-evaluation truncation windows.
    Trace,
    /// Per-step likelihood and canonicalization details.
    Debug,
    #[default]
    Info,
    /// Captured-weight shortfalls.
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    /// Directive name understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

fn by_name<T: Copy>(all: &[T], name: fn(T) -> &'static str, s: &str) -> Option<T> {
    let s = s.trim();
    all.iter().copied().find(|&v| name(v).eq_ignore_ascii_case(s))
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        by_name(&Self::ALL, Self::as_str, s).ok_or_else(|| format!("unknown log format: {s}"))
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        by_name(&Self::ALL, Self::as_str, s).ok_or_else(|| format!("unknown log level: {s}"))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Config from an arbitrary variable lookup. Unparseable values keep the
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = LogConfig::default();
        if let Some(level) = lookup("PHSRM_LOG").and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = lookup("PHSRM_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("JSONL".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!(" warn ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("xml".parse::<LogFormat>().is_err());
        assert!("loud".parse::<LogLevel>().is_err());
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    fn reads_engine_variables() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("PHSRM_LOG", "debug"),
            ("PHSRM_LOG_FORMAT", "jsonl"),
        ]));
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn rust_log_is_left_to_env_filter() {
        let config = LogConfig::from_lookup(lookup_from(&[(
            "RUST_LOG",
            "hyper=trace,phsrm_core=warn",
        )]));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("PHSRM_LOG", "loud"),
            ("PHSRM_LOG_FORMAT", "xml"),
        ]));
        assert_eq!(config, LogConfig::default());
    }
}
