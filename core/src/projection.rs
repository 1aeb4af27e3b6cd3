//! Scenario projection: pure functions over contexts.
//!
//! RULES:
//!   - Every change is applied against the ORIGINAL context, never
//!     against a partially updated one.
//!   - Explicit absolute values win over derived ones
//!     (`monthly_revenue` over a price change, `monthly_expenses`
//!     over spending/payroll adjustments).
//!   - `marketing_spend` is a line item. Changing it never moves
//!     `monthly_expenses`; callers that want the total to move pass
//!     the new total in `monthly_expenses`.
//!   - Nothing here touches a store.

use crate::{
    context::FinancialContext,
    error::{CoreError, CoreResult},
    scenario::{Forecast, ImpactAnalysis, MonthlyForecast, ScenarioChanges},
    types::Month,
};

/// Produce the context a scenario would lead to.
pub fn apply_changes(
    original: &FinancialContext,
    changes: &ScenarioChanges,
    runway_epsilon: f64,
) -> CoreResult<FinancialContext> {
    changes.validate()?;
    original.validate()?;

    let mut updated = original.clone();

    // ── Revenue ────────────────────────────────────────────────
    if let Some(pct) = changes.price_change_percent {
        let factor = 1.0 + pct / 100.0;
        updated.price_per_unit = original.price_per_unit * factor;
        // Without unit data the run-rate scales with price.
        updated.monthly_revenue = if original.units_sold > 0.0 {
            updated.price_per_unit * original.units_sold
        } else {
            original.monthly_revenue * factor
        };
    }
    if let Some(revenue) = changes.monthly_revenue {
        updated.monthly_revenue = revenue;
    }

    // ── Payroll ────────────────────────────────────────────────
    if let Some(pct) = changes.salary_change_percent {
        updated.average_salary = original.average_salary * (1.0 + pct / 100.0);
    }
    if let Some(team_size) = changes.team_size {
        updated.team_size = team_size;
    }

    // ── Expenses ───────────────────────────────────────────────
    updated.monthly_expenses = match changes.monthly_expenses {
        Some(total) => total,
        None => {
            let base = match changes.spending_change_percent {
                Some(pct) => original.monthly_expenses * (1.0 + pct / 100.0),
                None => original.monthly_expenses,
            };
            // New heads at the new average, plus existing heads re-priced.
            let payroll_delta = updated.payroll() - original.payroll();
            let expenses = base + payroll_delta;
            if expenses < 0.0 {
                return Err(CoreError::invalid(
                    "monthly_expenses",
                    format!(
                        "payroll change of {payroll_delta:.2} would drive expenses to {expenses:.2}"
                    ),
                ));
            }
            expenses
        }
    };

    if let Some(marketing) = changes.marketing_spend {
        updated.marketing_spend = marketing;
    }

    updated.refresh_runway(runway_epsilon);
    updated.validate()?;
    Ok(updated)
}

/// Field-wise `updated - original`.
pub fn compute_impact(original: &FinancialContext, updated: &FinancialContext) -> ImpactAnalysis {
    let runway_impact = if original.has_unbounded_runway() && updated.has_unbounded_runway() {
        0.0
    } else {
        updated.runway_months - original.runway_months
    };

    ImpactAnalysis {
        revenue_change:   updated.monthly_revenue - original.monthly_revenue,
        expense_change:   updated.monthly_expenses - original.monthly_expenses,
        marketing_impact: updated.marketing_spend - original.marketing_spend,
        runway_impact,
        profit_impact:    updated.monthly_profit() - original.monthly_profit(),
    }
}

/// Check a requested horizon against `1..=max_months`.
pub fn validate_horizon(months_to_forecast: i32, max_months: i32) -> CoreResult<Month> {
    if months_to_forecast <= 0 {
        return Err(CoreError::invalid(
            "months_to_forecast",
            format!("must be positive, got {months_to_forecast}"),
        ));
    }
    if months_to_forecast > max_months {
        return Err(CoreError::invalid(
            "months_to_forecast",
            format!("must be at most {max_months}, got {months_to_forecast}"),
        ));
    }
    Ok(months_to_forecast as Month)
}

/// Flat run-rate cash projection over `months_to_forecast` months.
pub fn forecast(ctx: &FinancialContext, months_to_forecast: i32) -> CoreResult<Forecast> {
    let horizon = validate_horizon(months_to_forecast, i32::MAX)?;
    ctx.validate()?;

    let revenue = ctx.monthly_revenue;
    let expenses = ctx.monthly_expenses;
    let net_income = revenue - expenses;

    let mut balance = ctx.current_cash;
    // Already underwater before the first month. Zero cash only counts
    // when the company is burning; break-even or profit keeps it afloat.
    let underwater = balance < 0.0 || (balance == 0.0 && net_income < 0.0);
    let mut depleted_at: Option<Month> = underwater.then_some(0);
    let mut months = Vec::with_capacity(horizon as usize);

    for month in 1..=horizon {
        balance += net_income;
        months.push(MonthlyForecast {
            month,
            revenue,
            expenses,
            net_income,
            balance,
        });
        if depleted_at.is_none() && balance <= 0.0 {
            depleted_at = Some(month);
        }
    }

    log::debug!(
        "Forecast for '{}': {} months, net {:.2}/month, final balance {:.2}",
        ctx.company_id,
        horizon,
        net_income,
        balance
    );

    Ok(Forecast {
        months,
        total_months_of_runway: depleted_at.unwrap_or(horizon),
        final_cash_balance: balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> FinancialContext {
        FinancialContext::new("acme", 100_000.0, 20_000.0, 15_000.0)
    }

    #[test]
    fn empty_changes_are_identity() {
        let ctx = baseline().with_team(3, 4_000.0).with_units(50.0, 400.0);
        let updated = apply_changes(&ctx, &ScenarioChanges::default(), 1e-9).unwrap();
        assert_eq!(updated, ctx);
    }

    #[test]
    fn self_impact_is_zero() {
        let ctx = baseline();
        assert_eq!(compute_impact(&ctx, &ctx), ImpactAnalysis::default());
    }

    #[test]
    fn zero_horizon_rejected() {
        assert!(forecast(&baseline(), 0).is_err());
        assert!(forecast(&baseline(), -3).is_err());
    }

    #[test]
    fn horizon_above_max_rejected() {
        assert_eq!(validate_horizon(120, 120).unwrap(), 120);
        assert!(validate_horizon(121, 120).is_err());
    }
}
