//! runway-core: financial context store and scenario projection engine.
//!
//! A baseline `FinancialContext` per company lives in the
//! `ContextStore`. The `ScenarioEngine` applies `ScenarioChanges` to
//! it, forecasts cash month by month, and commits the updated context.

pub mod config;
pub mod context;
pub mod context_store;
pub mod engine;
pub mod error;
pub mod health;
pub mod history;
pub mod projection;
pub mod scenario;
pub mod types;

pub use config::{EngineConfig, HealthConfig};
pub use context::FinancialContext;
pub use context_store::ContextStore;
pub use engine::ScenarioEngine;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use history::ScenarioLedger;
pub use scenario::{
    Forecast, ImpactAnalysis, MonthlyForecast, ScenarioChanges, ScenarioReport, ScenarioRequest,
    ScenarioResult,
};
