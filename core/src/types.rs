//! Shared primitive types used across the crate.

/// Opaque company key. One financial context per company.
pub type CompanyId = String;

/// Generated identifier of a single scenario run, `scn_<uuid>`.
pub type ScenarioId = String;

/// Forecast month index, 1-based.
pub type Month = u32;

/// Runway reported when revenue covers expenses (no burn).
/// Serialized as JSON `null`.
pub const UNBOUNDED_RUNWAY: f64 = f64::INFINITY;
