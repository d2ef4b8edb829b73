//! Engine configuration.
//!
//! Supports configuration via:
//! - Defaults (`eps = 1e-8`, `ufactor = 1.01`)
//! - JSON files or strings (missing fields fall back to defaults)
//! - Environment variables (PHSRM_EPS, PHSRM_UFACTOR, PHSRM_MAX_RIGHT)
//!
//! Every loading path validates before returning.

use crate::error::{Cf1Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Poisson truncation tolerance.
pub const DEFAULT_EPS: f64 = 1.0e-8;

/// Default uniformization safety factor.
pub const DEFAULT_UFACTOR: f64 = 1.01;

/// Default ceiling on the truncation index of a single evaluation.
pub const DEFAULT_MAX_RIGHT: usize = 1_000_000;

/// Numerical settings shared by every uniformized evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Poisson tail mass allowed beyond the truncation index.
    pub eps: f64,
    /// Uniformization rate multiplier over the largest phase rate (> 1).
    pub ufactor: f64,
    /// Largest truncation index accepted before failing with
    /// `TruncationOverflow`.
    pub max_right: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            ufactor: DEFAULT_UFACTOR,
            max_right: DEFAULT_MAX_RIGHT,
        }
    }
}

impl EngineConfig {
    /// Replace the truncation tolerance.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Replace the uniformization factor.
    pub fn with_ufactor(mut self, ufactor: f64) -> Self {
        self.ufactor = ufactor;
        self
    }

    /// Replace the truncation ceiling.
    pub fn with_max_right(mut self, max_right: usize) -> Self {
        self.max_right = max_right;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(Cf1Error::InvalidTolerance { eps: self.eps });
        }
        if !(self.ufactor > 1.0 && self.ufactor.is_finite()) {
            return Err(Cf1Error::InvalidUniformization {
                ufactor: self.ufactor,
            });
        }
        if self.max_right == 0 {
            return Err(Cf1Error::Config("max_right must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Cf1Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Apply PHSRM_EPS / PHSRM_UFACTOR / PHSRM_MAX_RIGHT overrides and validate.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup("PHSRM_EPS") {
            self.eps = parse_var("PHSRM_EPS", &raw)?;
        }
        if let Some(raw) = lookup("PHSRM_UFACTOR") {
            self.ufactor = parse_var("PHSRM_UFACTOR", &raw)?;
        }
        if let Some(raw) = lookup("PHSRM_MAX_RIGHT") {
            self.max_right = parse_var("PHSRM_MAX_RIGHT", &raw)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Cf1Error::Config(format!("invalid value for {}: {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.eps, 1e-8);
        assert_eq!(config.ufactor, 1.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let err = EngineConfig::default().with_eps(0.0).validate().unwrap_err();
        assert!(matches!(err, Cf1Error::InvalidTolerance { .. }));

        let err = EngineConfig::default().with_ufactor(1.0).validate().unwrap_err();
        assert!(matches!(err, Cf1Error::InvalidUniformization { .. }));
        assert_eq!(err.kind(), ErrorKind::Domain);

        let err = EngineConfig::default().with_max_right(0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "eps": 1e-10 }"#).unwrap();
        assert_eq!(config.eps, 1e-10);
        assert_eq!(config.ufactor, DEFAULT_UFACTOR);
        assert_eq!(config.max_right, DEFAULT_MAX_RIGHT);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = EngineConfig::from_json_str("{ eps: }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = EngineConfig::from_json_str(r#"{ "ufactor": 0.5 }"#).unwrap_err();
        assert!(matches!(err, Cf1Error::InvalidUniformization { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "eps": 1e-6, "ufactor": 1.5, "max_right": 5000 }"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config, EngineConfig::default().with_eps(1e-6).with_ufactor(1.5).with_max_right(5000));

        let missing = EngineConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Config);
    }

    #[test]
    fn overrides_apply_and_validate() {
        let vars: HashMap<&str, &str> =
            [("PHSRM_EPS", "1e-6"), ("PHSRM_MAX_RIGHT", " 200 ")].into_iter().collect();
        let config = EngineConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.eps, 1e-6);
        assert_eq!(config.max_right, 200);
        assert_eq!(config.ufactor, DEFAULT_UFACTOR);

        let err = EngineConfig::default()
            .with_overrides(|k| (k == "PHSRM_UFACTOR").then(|| "fast".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = EngineConfig::default()
            .with_overrides(|k| (k == "PHSRM_UFACTOR").then(|| "0.9".to_string()))
            .unwrap_err();
        assert!(matches!(err, Cf1Error::InvalidUniformization { .. }));
    }

    #[test]
    fn roundtrips_through_json() {
        let config = EngineConfig::default().with_eps(1e-9);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
