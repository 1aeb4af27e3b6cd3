//! Scenario inputs and outputs.
//!
//! Every change field is an `Option`: `None` means "leave as is",
//! `Some(0.0)` is an explicit change to zero.

use crate::{
    context::{unbounded_as_null, FinancialContext},
    error::{CoreError, CoreResult},
    health::FinancialHealth,
    types::{CompanyId, Month, ScenarioId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_revenue:         Option<f64>,
    /// New total monthly outflow. Wins over every derived expense adjustment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_expenses:        Option<f64>,
    /// New marketing line item. Tracked apart from `monthly_expenses`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_spend:         Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size:               Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_change_percent:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_percent:    Option<f64>,
    /// Scales baseline expenses before payroll adjustments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spending_change_percent: Option<f64>,
}

impl ScenarioChanges {
    pub fn is_empty(&self) -> bool {
        *self == ScenarioChanges::default()
    }

    /// Amounts must be finite and non-negative; percentages finite and
    /// not below -100.
    pub fn validate(&self) -> CoreResult<()> {
        let amounts = [
            ("monthly_revenue", self.monthly_revenue),
            ("monthly_expenses", self.monthly_expenses),
            ("marketing_spend", self.marketing_spend),
        ];
        for (field, value) in amounts {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(CoreError::invalid(field, format!("must be finite, got {v}")));
                }
                if v < 0.0 {
                    return Err(CoreError::invalid(field, format!("must not be negative, got {v}")));
                }
            }
        }

        let percents = [
            ("salary_change_percent", self.salary_change_percent),
            ("price_change_percent", self.price_change_percent),
            ("spending_change_percent", self.spending_change_percent),
        ];
        for (field, value) in percents {
            if let Some(p) = value {
                if !p.is_finite() {
                    return Err(CoreError::invalid(field, format!("must be finite, got {p}")));
                }
                if p < -100.0 {
                    return Err(CoreError::invalid(field, format!("cannot cut below -100%, got {p}")));
                }
            }
        }
        Ok(())
    }
}

/// The request shape a caller submits for one company.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioRequest {
    pub company_id:              CompanyId,
    pub spending_change_percent: Option<f64>,
    pub monthly_expenses:        Option<f64>,
    pub pricing_change_percent:  Option<f64>,
    /// Net new heads; negative for layoffs.
    pub hiring_count:            Option<i64>,
    pub marketing_budget:        Option<f64>,
    pub months_to_forecast:      Option<i32>,
}

impl ScenarioRequest {
    pub fn new(company_id: impl Into<CompanyId>) -> Self {
        Self {
            company_id: company_id.into(),
            ..Self::default()
        }
    }

    /// Translate against the baseline; hiring is relative to its headcount.
    pub fn to_changes(&self, baseline: &FinancialContext) -> CoreResult<ScenarioChanges> {
        let team_size = match self.hiring_count {
            None => None,
            Some(delta) => {
                let invalid = || {
                    CoreError::invalid(
                        "hiring_count",
                        format!("{delta} does not fit a team of {}", baseline.team_size),
                    )
                };
                let target = i64::from(baseline.team_size)
                    .checked_add(delta)
                    .ok_or_else(invalid)?;
                Some(u32::try_from(target).map_err(|_| invalid())?)
            }
        };

        Ok(ScenarioChanges {
            monthly_revenue: None,
            monthly_expenses: self.monthly_expenses,
            marketing_spend: self.marketing_budget,
            team_size,
            salary_change_percent: None,
            price_change_percent: self.pricing_change_percent,
            spending_change_percent: self.spending_change_percent,
        })
    }
}

/// Signed deltas, updated minus original.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ImpactAnalysis {
    pub revenue_change:   f64,
    pub expense_change:   f64,
    pub marketing_impact: f64,
    /// Infinite when runway moves between bounded and unbounded.
    #[serde(with = "unbounded_as_null")]
    pub runway_impact:    f64,
    pub profit_impact:    f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonthlyForecast {
    pub month:      Month,
    pub revenue:    f64,
    pub expenses:   f64,
    pub net_income: f64,
    /// Cash after this month.
    pub balance:    f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    pub months:                 Vec<MonthlyForecast>,
    /// First month the balance is at or below zero; the full horizon
    /// when it never gets there.
    pub total_months_of_runway: Month,
    pub final_cash_balance:     f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioInput {
    pub changes:            ScenarioChanges,
    pub months_to_forecast: Month,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioResult {
    pub scenario_id:            ScenarioId,
    pub company_id:             CompanyId,
    pub timestamp:              DateTime<Utc>,
    pub input:                  ScenarioInput,
    pub monthly_forecast:       Vec<MonthlyForecast>,
    pub total_months_of_runway: Month,
    pub final_cash_balance:     f64,
}

/// Everything a caller needs to display one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioReport {
    pub result:           ScenarioResult,
    pub impact_analysis:  ImpactAnalysis,
    pub original_context: FinancialContext,
    pub updated_context:  FinancialContext,
    pub health:           FinancialHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_zero_are_distinct() {
        let absent: ScenarioChanges = serde_json::from_str("{}").unwrap();
        let zero: ScenarioChanges = serde_json::from_str(r#"{ "marketing_spend": 0 }"#).unwrap();
        assert!(absent.is_empty());
        assert!(!zero.is_empty());
        assert_eq!(zero.marketing_spend, Some(0.0));
    }

    #[test]
    fn negative_infinity_percent_rejected() {
        let changes = ScenarioChanges {
            price_change_percent: Some(f64::NEG_INFINITY),
            ..ScenarioChanges::default()
        };
        let err = changes.validate().unwrap_err();
        assert!(err.to_string().contains("price_change_percent"));
    }

    #[test]
    fn percent_below_minus_hundred_rejected() {
        let changes = ScenarioChanges {
            salary_change_percent: Some(-150.0),
            ..ScenarioChanges::default()
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn negative_expense_override_rejected() {
        let changes = ScenarioChanges {
            monthly_expenses: Some(-1.0),
            ..ScenarioChanges::default()
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn request_hiring_is_relative_to_baseline() {
        let base = FinancialContext::new("acme", 1.0, 1.0, 1.0).with_team(4, 100.0);
        let req = ScenarioRequest {
            hiring_count: Some(3),
            marketing_budget: Some(2_500.0),
            pricing_change_percent: Some(10.0),
            ..ScenarioRequest::new("acme")
        };
        let changes = req.to_changes(&base).unwrap();
        assert_eq!(changes.team_size, Some(7));
        assert_eq!(changes.marketing_spend, Some(2_500.0));
        assert_eq!(changes.price_change_percent, Some(10.0));
        assert_eq!(changes.monthly_revenue, None);
    }

    #[test]
    fn request_layoffs_below_zero_rejected() {
        let base = FinancialContext::new("acme", 1.0, 1.0, 1.0).with_team(2, 100.0);
        let req = ScenarioRequest {
            hiring_count: Some(-3),
            ..ScenarioRequest::new("acme")
        };
        let err = req.to_changes(&base).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }
}
