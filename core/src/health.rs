//! Rule-based financial health assessment.
//!
//! Classifies a context by its runway and raises alerts when the
//! runway falls under the configured thresholds.

use crate::{config::HealthConfig, context::FinancialContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Concerning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthAlert {
    pub level:   AlertLevel,
    pub message: String,
    pub action:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialHealth {
    pub status:    HealthStatus,
    /// 0..=100, linear in runway up to the "excellent" threshold.
    pub score:     f64,
    /// Monthly net outflow, 0 when revenue covers expenses.
    pub burn_rate: f64,
    pub alerts:    Vec<HealthAlert>,
}

pub fn assess_health(ctx: &FinancialContext, config: &HealthConfig) -> FinancialHealth {
    let runway = ctx.runway_months;

    let status = if runway > config.excellent_above_months {
        HealthStatus::Excellent
    } else if runway > config.good_above_months {
        HealthStatus::Good
    } else if runway > config.concerning_above_months {
        HealthStatus::Concerning
    } else {
        HealthStatus::Critical
    };

    let score = if runway.is_infinite() {
        100.0
    } else {
        (runway / config.excellent_above_months * 100.0).clamp(0.0, 100.0)
    };

    let mut alerts = Vec::new();
    if runway < config.critical_below_months {
        alerts.push(HealthAlert {
            level:   AlertLevel::Critical,
            message: format!("Critical: only {runway:.1} months of runway remaining"),
            action:  "Immediate action required".into(),
        });
    } else if runway < config.warning_below_months {
        alerts.push(HealthAlert {
            level:   AlertLevel::Warning,
            message: format!("Warning: {runway:.1} months of runway remaining"),
            action:  "Consider cost optimization".into(),
        });
    }

    if status == HealthStatus::Critical {
        log::warn!(
            "'{}' is in critical health: runway {:.1} months",
            ctx.company_id,
            runway
        );
    }

    FinancialHealth {
        status,
        score,
        burn_rate: ctx.net_burn().max(0.0),
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_runway(months: f64) -> FinancialContext {
        // burn of 1000/month
        FinancialContext::new("acme", months * 1_000.0, 4_000.0, 5_000.0)
    }

    #[test]
    fn status_follows_thresholds() {
        let cfg = HealthConfig::default();
        assert_eq!(assess_health(&with_runway(24.0), &cfg).status, HealthStatus::Excellent);
        assert_eq!(assess_health(&with_runway(18.0), &cfg).status, HealthStatus::Good);
        assert_eq!(assess_health(&with_runway(12.0), &cfg).status, HealthStatus::Concerning);
        assert_eq!(assess_health(&with_runway(6.0), &cfg).status, HealthStatus::Critical);
    }

    #[test]
    fn score_is_clamped_linear() {
        let cfg = HealthConfig::default();
        assert_eq!(assess_health(&with_runway(9.0), &cfg).score, 50.0);
        assert_eq!(assess_health(&with_runway(36.0), &cfg).score, 100.0);
        assert_eq!(assess_health(&with_runway(0.0), &cfg).score, 0.0);
    }

    #[test]
    fn unbounded_runway_is_excellent_without_alerts() {
        let ctx = FinancialContext::new("acme", 10.0, 5_000.0, 1_000.0);
        let health = assess_health(&ctx, &HealthConfig::default());
        assert_eq!(health.status, HealthStatus::Excellent);
        assert_eq!(health.score, 100.0);
        assert_eq!(health.burn_rate, 0.0);
        assert!(health.alerts.is_empty());
    }

    #[test]
    fn alerts_escalate_from_warning_to_critical() {
        let cfg = HealthConfig::default();
        let warning = assess_health(&with_runway(10.0), &cfg);
        assert_eq!(warning.alerts.len(), 1);
        assert_eq!(warning.alerts[0].level, AlertLevel::Warning);

        let critical = assess_health(&with_runway(3.0), &cfg);
        assert_eq!(critical.alerts.len(), 1);
        assert_eq!(critical.alerts[0].level, AlertLevel::Critical);
        assert_eq!(critical.burn_rate, 1_000.0);
    }
}
