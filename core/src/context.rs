//! The baseline financial snapshot of one company.
//!
//! `runway_months` is derived state. Every constructor and every
//! engine/store write path re-derives it from cash, revenue and
//! expenses, so a context read back from the store is always
//! consistent with its money fields.

use crate::{
    error::{CoreError, CoreResult},
    types::{CompanyId, UNBOUNDED_RUNWAY},
};
use serde::{Deserialize, Serialize};

/// Burn floor used by the builders. The engine uses its configured value.
pub const DEFAULT_RUNWAY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialContext {
    pub company_id:       CompanyId,
    pub current_cash:     f64,
    pub monthly_revenue:  f64,
    /// Total recurring outflow. Marketing and payroll are components of it.
    pub monthly_expenses: f64,
    pub marketing_spend:  f64,
    pub team_size:        u32,
    /// Per-head monthly cost.
    pub average_salary:   f64,
    pub price_per_unit:   f64,
    pub units_sold:       f64,
    #[serde(with = "unbounded_as_null", default = "unbounded")]
    pub runway_months:    f64,
}

fn unbounded() -> f64 {
    UNBOUNDED_RUNWAY
}

impl FinancialContext {
    pub fn new(
        company_id: impl Into<CompanyId>,
        current_cash: f64,
        monthly_revenue: f64,
        monthly_expenses: f64,
    ) -> Self {
        let mut ctx = Self {
            company_id: company_id.into(),
            current_cash,
            monthly_revenue,
            monthly_expenses,
            marketing_spend: 0.0,
            team_size: 0,
            average_salary: 0.0,
            price_per_unit: 0.0,
            units_sold: 0.0,
            runway_months: UNBOUNDED_RUNWAY,
        };
        ctx.refresh_runway(DEFAULT_RUNWAY_EPSILON);
        ctx
    }

    /// Record the marketing line item. Does not touch `monthly_expenses`.
    pub fn with_marketing_spend(mut self, marketing_spend: f64) -> Self {
        self.marketing_spend = marketing_spend;
        self
    }

    pub fn with_team(mut self, team_size: u32, average_salary: f64) -> Self {
        self.team_size = team_size;
        self.average_salary = average_salary;
        self
    }

    pub fn with_units(mut self, price_per_unit: f64, units_sold: f64) -> Self {
        self.price_per_unit = price_per_unit;
        self.units_sold = units_sold;
        self
    }

    /// `monthly_expenses - monthly_revenue`; positive means cash is burning.
    pub fn net_burn(&self) -> f64 {
        self.monthly_expenses - self.monthly_revenue
    }

    pub fn monthly_profit(&self) -> f64 {
        self.monthly_revenue - self.monthly_expenses
    }

    pub fn payroll(&self) -> f64 {
        self.team_size as f64 * self.average_salary
    }

    pub fn has_unbounded_runway(&self) -> bool {
        self.runway_months.is_infinite()
    }

    pub fn refresh_runway(&mut self, epsilon: f64) {
        self.runway_months = runway_months_for(
            self.current_cash,
            self.monthly_revenue,
            self.monthly_expenses,
            epsilon,
        );
    }

    /// Reject non-finite money fields and a runway that is not a
    /// legitimate function of them.
    pub fn validate(&self) -> CoreResult<()> {
        if self.company_id.trim().is_empty() {
            return Err(CoreError::invalid("company_id", "must not be empty"));
        }
        let money = [
            ("current_cash", self.current_cash),
            ("monthly_revenue", self.monthly_revenue),
            ("monthly_expenses", self.monthly_expenses),
            ("marketing_spend", self.marketing_spend),
            ("average_salary", self.average_salary),
            ("price_per_unit", self.price_per_unit),
            ("units_sold", self.units_sold),
        ];
        for (field, value) in money {
            if !value.is_finite() {
                return Err(CoreError::invalid(field, format!("must be finite, got {value}")));
            }
        }
        if self.runway_months.is_nan() {
            return Err(CoreError::computation(format!(
                "runway for '{}' is NaN",
                self.company_id
            )));
        }
        if self.runway_months.is_infinite() && self.net_burn() > 0.0 {
            return Err(CoreError::computation(format!(
                "runway for '{}' overflowed with burn {:.2}/month",
                self.company_id,
                self.net_burn()
            )));
        }
        Ok(())
    }
}

/// Months of cash at the current burn.
///
/// No burn (revenue >= expenses) is unbounded. With burn and no cash
/// left the runway is already 0.
pub fn runway_months_for(cash: f64, revenue: f64, expenses: f64, epsilon: f64) -> f64 {
    let burn = expenses - revenue;
    if burn <= 0.0 {
        return UNBOUNDED_RUNWAY;
    }
    if cash <= 0.0 {
        return 0.0;
    }
    cash / burn.max(epsilon)
}

/// Infinite values travel as JSON `null`; `null` reads back as +inf.
pub(crate) mod unbounded_as_null {
    use crate::types::UNBOUNDED_RUNWAY;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(UNBOUNDED_RUNWAY))
    }
}
