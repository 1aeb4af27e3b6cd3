//! The scenario engine: store bracketing around pure projection.
//!
//! EXECUTION ORDER for one scenario (fixed):
//!   1. Validate horizon and changes (no lock taken on bad input)
//!   2. Take the company's transaction lock
//!   3. Read the baseline context
//!   4. apply_changes → compute_impact → forecast → assess_health
//!   5. Persist the updated context (only after every step succeeded)
//!
//! RULES:
//!   - The store is written at most once per scenario, last.
//!   - Two scenarios for one company never interleave steps 3–5.

use crate::{
    config::EngineConfig,
    context::FinancialContext,
    context_store::ContextStore,
    error::CoreResult,
    health::{assess_health, FinancialHealth},
    projection::{apply_changes, compute_impact, forecast, validate_horizon},
    scenario::{ScenarioChanges, ScenarioInput, ScenarioReport, ScenarioRequest, ScenarioResult},
    types::{CompanyId, ScenarioId},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct ScenarioEngine {
    config: EngineConfig,
    store:  Arc<ContextStore>,
}

impl ScenarioEngine {
    pub fn new(config: EngineConfig, store: Arc<ContextStore>) -> Self {
        Self { config, store }
    }

    /// Engine with a fresh, empty store configured from `config`.
    pub fn build(config: EngineConfig) -> Self {
        let store = Arc::new(ContextStore::with_runway_epsilon(config.runway_epsilon));
        Self::new(config, store)
    }

    /// Default config, empty store. For tests and tooling.
    pub fn build_test() -> Self {
        Self::build(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Store a baseline produced by upstream ingestion.
    /// Returns the context as stored (with runway derived).
    pub fn upload_context(&self, context: FinancialContext) -> CoreResult<FinancialContext> {
        let company_id = context.company_id.clone();
        self.store.with_company_lock(&company_id, || {
            self.store.put(&company_id, context)?;
            self.store.get(&company_id)
        })
    }

    pub fn context(&self, company_id: &str) -> CoreResult<FinancialContext> {
        self.store.get(company_id)
    }

    pub fn health(&self, company_id: &str) -> CoreResult<FinancialHealth> {
        let ctx = self.store.get(company_id)?;
        Ok(assess_health(&ctx, &self.config.health))
    }

    /// Apply `changes`, forecast, and commit the updated context.
    pub fn run_scenario(
        &self,
        company_id: &str,
        changes: &ScenarioChanges,
        months_to_forecast: i32,
    ) -> CoreResult<ScenarioReport> {
        changes.validate()?;
        self.transact(company_id, months_to_forecast, true, |_| Ok(changes.clone()))
    }

    /// Same as `run_scenario` but leaves the store untouched.
    pub fn preview_scenario(
        &self,
        company_id: &str,
        changes: &ScenarioChanges,
        months_to_forecast: i32,
    ) -> CoreResult<ScenarioReport> {
        changes.validate()?;
        self.transact(company_id, months_to_forecast, false, |_| Ok(changes.clone()))
    }

    /// Run a caller request. Relative fields (hiring) resolve against the
    /// baseline read inside the transaction.
    pub fn run_request(&self, request: &ScenarioRequest) -> CoreResult<ScenarioReport> {
        let months = request
            .months_to_forecast
            .unwrap_or(self.config.default_forecast_months);
        self.transact(&request.company_id, months, true, |baseline| {
            request.to_changes(baseline)
        })
    }

    fn transact<F>(
        &self,
        company_id: &str,
        months_to_forecast: i32,
        commit: bool,
        changes_for: F,
    ) -> CoreResult<ScenarioReport>
    where
        F: FnOnce(&FinancialContext) -> CoreResult<ScenarioChanges>,
    {
        let horizon = validate_horizon(months_to_forecast, self.config.max_forecast_months)?;

        self.store.with_company_lock(company_id, || {
            let original = self.store.get(company_id)?;
            let changes = changes_for(&original)?;

            let updated = apply_changes(&original, &changes, self.config.runway_epsilon)?;
            let impact_analysis = compute_impact(&original, &updated);
            let projection = forecast(&updated, months_to_forecast)?;
            let health = assess_health(&updated, &self.config.health);

            let result = ScenarioResult {
                scenario_id:            new_scenario_id(),
                company_id:             CompanyId::from(company_id),
                timestamp:              Utc::now(),
                input:                  ScenarioInput {
                    changes,
                    months_to_forecast: horizon,
                },
                monthly_forecast:       projection.months,
                total_months_of_runway: projection.total_months_of_runway,
                final_cash_balance:     projection.final_cash_balance,
            };

            if commit {
                self.store.put(company_id, updated.clone())?;
                log::info!(
                    "{} committed for '{}': runway {:.1} -> {:.1} months, profit impact {:.0}",
                    result.scenario_id,
                    company_id,
                    original.runway_months,
                    updated.runway_months,
                    impact_analysis.profit_impact
                );
            } else {
                log::debug!("{} previewed for '{company_id}'", result.scenario_id);
            }

            Ok(ScenarioReport {
                result,
                impact_analysis,
                original_context: original,
                updated_context: updated,
                health,
            })
        })
    }
}

fn new_scenario_id() -> ScenarioId {
    format!("scn_{}", Uuid::new_v4().simple())
}
