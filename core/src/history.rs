//! SQLite-backed scenario history.
//!
//! RULE: Only this module talks to the database.
//! Each company keeps at most `limit` results; older rows are pruned
//! on every insert.

use crate::{
    error::{CoreError, CoreResult},
    scenario::ScenarioResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct ScenarioLedger {
    conn: Connection,
}

impl ScenarioLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &str) -> CoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and by default).
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_scenario_history.sql"))?;
        Ok(())
    }

    /// Insert a result and prune the company's history down to `limit`.
    /// Returns how many old rows were pruned.
    pub fn record(&self, result: &ScenarioResult, limit: usize) -> CoreResult<usize> {
        let json = serde_json::to_string(result)?;
        self.conn.execute(
            "INSERT INTO scenario_history
                 (scenario_id, company_id, created_at, total_months_of_runway,
                  final_cash_balance, result_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.scenario_id,
                result.company_id,
                result.timestamp.to_rfc3339(),
                result.total_months_of_runway as i64,
                result.final_cash_balance,
                json,
            ],
        )?;

        let pruned = self.conn.execute(
            "DELETE FROM scenario_history
             WHERE company_id = ?1
               AND id NOT IN (
                   SELECT id FROM scenario_history
                   WHERE company_id = ?1
                   ORDER BY id DESC LIMIT ?2
               )",
            params![result.company_id, limit as i64],
        )?;
        if pruned > 0 {
            log::debug!("Pruned {pruned} old scenario(s) for '{}'", result.company_id);
        }
        Ok(pruned)
    }

    /// Newest first.
    pub fn recent(&self, company_id: &str, n: usize) -> CoreResult<Vec<ScenarioResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT result_json FROM scenario_history
             WHERE company_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![company_id, n as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|json| serde_json::from_str::<ScenarioResult>(json).map_err(CoreError::from))
            .collect()
    }

    pub fn count(&self, company_id: &str) -> CoreResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scenario_history WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_count(&self) -> CoreResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scenario_history",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Timestamp of the most recently recorded scenario, any company.
    pub fn latest_timestamp(&self) -> CoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM scenario_history ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| CoreError::Other(anyhow::anyhow!("bad created_at '{s}': {e}")))
        })
        .transpose()
    }
}
