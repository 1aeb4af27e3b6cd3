use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runway thresholds (in months) used by the health assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    /// Runway strictly above this is "excellent". Also the 100-point score anchor.
    pub excellent_above_months:  f64,
    pub good_above_months:       f64,
    pub concerning_above_months: f64,
    /// Runway strictly below this raises a warning alert.
    pub warning_below_months:    f64,
    /// Runway strictly below this raises a critical alert instead.
    pub critical_below_months:   f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            excellent_above_months:  18.0,
            good_above_months:       12.0,
            concerning_above_months: 6.0,
            warning_below_months:    12.0,
            critical_below_months:   6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Horizon used when a request does not name one.
    pub default_forecast_months: i32,
    /// Inclusive upper bound on any forecast horizon.
    pub max_forecast_months:     i32,
    /// Floor on the burn rate in the runway division.
    pub runway_epsilon:          f64,
    /// Scenario results retained per company in the history ledger.
    pub history_limit:           usize,
    pub health:                  HealthConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_forecast_months: 12,
            max_forecast_months:     120,
            runway_epsilon:          1e-9,
            history_limit:           50,
            health:                  HealthConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from `<data_dir>/engine.json`.
    /// Fields missing from the file keep their defaults.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but falls back to defaults when the file does not exist.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        if Path::new(data_dir).join("engine.json").exists() {
            Self::load(data_dir)
        } else {
            log::debug!("No engine.json under {data_dir}; using default engine config");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_forecast_months <= 0 {
            anyhow::bail!("default_forecast_months must be positive");
        }
        if self.max_forecast_months < self.default_forecast_months {
            anyhow::bail!(
                "max_forecast_months ({}) is below default_forecast_months ({})",
                self.max_forecast_months,
                self.default_forecast_months
            );
        }
        if !(self.runway_epsilon > 0.0 && self.runway_epsilon.is_finite()) {
            anyhow::bail!("runway_epsilon must be a positive finite number");
        }
        if self.history_limit == 0 {
            anyhow::bail!("history_limit must be at least 1");
        }
        let h = &self.health;
        if !(h.excellent_above_months > h.good_above_months
            && h.good_above_months > h.concerning_above_months)
        {
            anyhow::bail!("health status thresholds must be strictly decreasing");
        }
        if h.critical_below_months > h.warning_below_months {
            anyhow::bail!("critical_below_months must not exceed warning_below_months");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "max_forecast_months": 36 }"#).unwrap();
        assert_eq!(cfg.max_forecast_months, 36);
        assert_eq!(cfg.default_forecast_months, 12);
        assert_eq!(cfg.health, HealthConfig::default());
    }

    #[test]
    fn horizon_below_default_rejected() {
        let cfg = EngineConfig {
            max_forecast_months: 6,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = EngineConfig::load("/definitely/not/here").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/engine.json"));
    }
}
