//! Laws that must hold for every context, checked over a seeded
//! stream of random contexts so failures reproduce exactly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use runway_core::{
    context::FinancialContext,
    projection::{apply_changes, compute_impact, forecast},
    ImpactAnalysis, ScenarioChanges,
};

const SEED: u64 = 0x5EED_CAFE_F00D_0001;
const CASES: usize = 500;

fn random_context(rng: &mut Pcg64Mcg, i: usize) -> FinancialContext {
    // Exactly zero cash is a boundary worth hitting often.
    let cash = if rng.gen_bool(0.1) {
        0.0
    } else {
        rng.gen_range(-50_000.0..2_000_000.0)
    };
    let revenue = rng.gen_range(0.0..200_000.0);
    // Bias toward burning companies, but keep some profitable ones.
    let expenses = revenue * rng.gen_range(0.5..2.0);
    FinancialContext::new(format!("co-{i}"), cash, revenue, expenses)
        .with_marketing_spend(rng.gen_range(0.0..=expenses * 0.3))
        .with_team(rng.gen_range(0..60), rng.gen_range(2_000.0..15_000.0))
        .with_units(rng.gen_range(1.0..500.0), rng.gen_range(0.0..1_000.0))
}

fn contexts() -> impl Iterator<Item = FinancialContext> {
    let mut rng = Pcg64Mcg::seed_from_u64(SEED);
    (0..CASES).map(move |i| random_context(&mut rng, i))
}

#[test]
fn empty_changes_are_identity_for_all_contexts() {
    for ctx in contexts() {
        let updated = apply_changes(&ctx, &ScenarioChanges::default(), 1e-9).unwrap();
        assert_eq!(updated, ctx, "identity law broken for {}", ctx.company_id);
    }
}

#[test]
fn self_impact_is_all_zero_for_all_contexts() {
    for ctx in contexts() {
        assert_eq!(
            compute_impact(&ctx, &ctx),
            ImpactAnalysis::default(),
            "non-zero self impact for {}",
            ctx.company_id
        );
    }
}

#[test]
fn balance_steps_equal_net_income() {
    let mut rng = Pcg64Mcg::seed_from_u64(SEED ^ 1);
    for ctx in contexts() {
        let months = rng.gen_range(1..=120);
        let projection = forecast(&ctx, months).unwrap();
        assert_eq!(projection.months.len(), months as usize);

        let mut previous = ctx.current_cash;
        for m in &projection.months {
            assert_eq!(m.net_income, m.revenue - m.expenses);
            let step = m.balance - previous;
            let tolerance = 1e-6 * previous.abs().max(m.balance.abs()).max(1.0);
            assert!(
                (step - m.net_income).abs() <= tolerance,
                "{} month {}: step {step} != net {}",
                ctx.company_id,
                m.month,
                m.net_income
            );
            previous = m.balance;
        }
        assert_eq!(projection.final_cash_balance, previous);
    }
}

#[test]
fn runway_month_is_first_non_positive_balance() {
    for ctx in contexts() {
        let projection = forecast(&ctx, 60).unwrap();
        let net_income = ctx.monthly_revenue - ctx.monthly_expenses;
        let underwater =
            ctx.current_cash < 0.0 || (ctx.current_cash == 0.0 && net_income < 0.0);
        let expected = if underwater {
            0
        } else {
            projection
                .months
                .iter()
                .find(|m| m.balance <= 0.0)
                .map(|m| m.month)
                .unwrap_or(60)
        };
        assert_eq!(projection.total_months_of_runway, expected, "{}", ctx.company_id);
    }
}

#[test]
fn non_burning_companies_last_the_whole_window() {
    for ctx in contexts().filter(|c| c.current_cash >= 0.0 && c.net_burn() <= 0.0) {
        let projection = forecast(&ctx, 24).unwrap();
        assert_eq!(projection.total_months_of_runway, 24, "{}", ctx.company_id);
    }
}

#[test]
fn context_runway_is_consistent_with_money_fields() {
    for ctx in contexts() {
        let burn = ctx.monthly_expenses - ctx.monthly_revenue;
        if burn <= 0.0 {
            assert!(ctx.has_unbounded_runway());
        } else if ctx.current_cash <= 0.0 {
            assert_eq!(ctx.runway_months, 0.0);
        } else {
            assert_eq!(ctx.runway_months, ctx.current_cash / burn);
        }
    }
}
