//! The caller layer around the engine.
//!
//! Owns what the core deliberately does not: usage counters and the
//! scenario history ledger. Every committed scenario is recorded.

use chrono::{DateTime, Utc};
use runway_core::{
    context::FinancialContext,
    error::{CoreError, CoreResult},
    ScenarioChanges, ScenarioEngine, ScenarioLedger, ScenarioReport, ScenarioRequest,
    ScenarioResult,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageStats {
    pub scenarios_run:      u64,
    pub contexts_stored:    u64,
    pub history_entries:    i64,
    pub last_scenario_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status:    &'static str,
    pub service:   &'static str,
    pub companies: usize,
    pub timestamp: DateTime<Utc>,
}

pub struct DeskService {
    engine:          ScenarioEngine,
    ledger:          Mutex<ScenarioLedger>,
    scenarios_run:   AtomicU64,
    contexts_stored: AtomicU64,
}

impl DeskService {
    /// `ledger` must already be migrated.
    pub fn new(engine: ScenarioEngine, ledger: ScenarioLedger) -> Self {
        Self {
            engine,
            ledger: Mutex::new(ledger),
            scenarios_run: AtomicU64::new(0),
            contexts_stored: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &ScenarioEngine {
        &self.engine
    }

    pub fn upload(&self, context: FinancialContext) -> CoreResult<FinancialContext> {
        let stored = self.engine.upload_context(context)?;
        self.contexts_stored.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "Context uploaded for '{}': cash {:.0}, runway {:.1} months",
            stored.company_id,
            stored.current_cash,
            stored.runway_months
        );
        Ok(stored)
    }

    pub fn context(&self, company_id: &str) -> CoreResult<FinancialContext> {
        self.engine.context(company_id)
    }

    pub fn run_request(&self, request: &ScenarioRequest) -> CoreResult<ScenarioReport> {
        let report = self.engine.run_request(request)?;
        self.record(&report.result);
        Ok(report)
    }

    pub fn run_changes(
        &self,
        company_id: &str,
        changes: &ScenarioChanges,
        months_to_forecast: i32,
    ) -> CoreResult<ScenarioReport> {
        let report = self.engine.run_scenario(company_id, changes, months_to_forecast)?;
        self.record(&report.result);
        Ok(report)
    }

    /// Not counted and not recorded; the store is untouched.
    pub fn preview(
        &self,
        company_id: &str,
        changes: &ScenarioChanges,
        months_to_forecast: i32,
    ) -> CoreResult<ScenarioReport> {
        self.engine.preview_scenario(company_id, changes, months_to_forecast)
    }

    pub fn history(&self, company_id: &str, limit: usize) -> CoreResult<Vec<ScenarioResult>> {
        self.ledger()?.recent(company_id, limit)
    }

    pub fn usage(&self) -> CoreResult<UsageStats> {
        let ledger = self.ledger()?;
        Ok(UsageStats {
            scenarios_run:      self.scenarios_run.load(Ordering::Relaxed),
            contexts_stored:    self.contexts_stored.load(Ordering::Relaxed),
            history_entries:    ledger.total_count()?,
            last_scenario_time: ledger.latest_timestamp()?,
        })
    }

    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            status:    "healthy",
            service:   "cfo-desk",
            companies: self.engine.store().len(),
            timestamp: Utc::now(),
        }
    }

    /// The scenario is already committed when this runs, so a ledger
    /// failure only degrades history and is never reported as a failed run.
    /// Recording happens after the company lock is released: under
    /// concurrent runs, ledger order may differ from commit order.
    fn record(&self, result: &ScenarioResult) {
        self.scenarios_run.fetch_add(1, Ordering::Relaxed);
        let limit = self.engine.config().history_limit;
        let recorded = self.ledger().and_then(|ledger| ledger.record(result, limit));
        if let Err(e) = recorded {
            log::warn!(
                "{} committed but history not recorded: {e}",
                result.scenario_id
            );
        }
    }

    fn ledger(&self) -> CoreResult<std::sync::MutexGuard<'_, ScenarioLedger>> {
        self.ledger
            .lock()
            .map_err(|_| CoreError::computation("scenario ledger lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runway_core::{EngineConfig, ErrorKind};

    fn service() -> DeskService {
        let ledger = ScenarioLedger::in_memory().unwrap();
        ledger.migrate().unwrap();
        let config = EngineConfig {
            history_limit: 2,
            ..EngineConfig::default()
        };
        DeskService::new(ScenarioEngine::build(config), ledger)
    }

    #[test]
    fn counters_track_uploads_and_committed_runs() {
        let svc = service();
        svc.upload(FinancialContext::new("acme", 50_000.0, 10_000.0, 12_000.0))
            .unwrap();

        let request = ScenarioRequest {
            marketing_budget: Some(1_000.0),
            ..ScenarioRequest::new("acme")
        };
        svc.run_request(&request).unwrap();
        svc.run_changes("acme", &ScenarioChanges::default(), 6).unwrap();
        svc.preview("acme", &ScenarioChanges::default(), 6).unwrap();

        let usage = svc.usage().unwrap();
        assert_eq!(usage.contexts_stored, 1);
        assert_eq!(usage.scenarios_run, 2);
        assert_eq!(usage.history_entries, 2);
        assert!(usage.last_scenario_time.is_some());
    }

    #[test]
    fn failed_runs_are_not_counted() {
        let svc = service();
        let err = svc.run_request(&ScenarioRequest::new("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let usage = svc.usage().unwrap();
        assert_eq!(usage.scenarios_run, 0);
        assert_eq!(usage.history_entries, 0);
        assert_eq!(usage.last_scenario_time, None);
    }

    #[test]
    fn history_respects_configured_limit() {
        let svc = service();
        svc.upload(FinancialContext::new("acme", 50_000.0, 10_000.0, 12_000.0))
            .unwrap();
        for _ in 0..4 {
            svc.run_changes("acme", &ScenarioChanges::default(), 3).unwrap();
        }
        assert_eq!(svc.history("acme", 10).unwrap().len(), 2);
        assert_eq!(svc.usage().unwrap().scenarios_run, 4);
    }

    #[test]
    fn ledger_failure_keeps_committed_run_successful() {
        // No migration, so every insert fails.
        let ledger = ScenarioLedger::in_memory().unwrap();
        let svc = DeskService::new(ScenarioEngine::build_test(), ledger);
        svc.upload(FinancialContext::new("acme", 50_000.0, 10_000.0, 12_000.0))
            .unwrap();

        let changes = ScenarioChanges {
            monthly_revenue: Some(11_000.0),
            ..ScenarioChanges::default()
        };
        let report = svc.run_changes("acme", &changes, 6).unwrap();
        assert_eq!(svc.context("acme").unwrap(), report.updated_context);
        assert_eq!(svc.scenarios_run.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn health_reports_company_count() {
        let svc = service();
        svc.upload(FinancialContext::new("acme", 1.0, 1.0, 1.0)).unwrap();
        svc.upload(FinancialContext::new("globex", 1.0, 1.0, 1.0)).unwrap();
        let health = svc.health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.companies, 2);
    }
}
