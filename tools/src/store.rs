//! SQLite export of finished runs.
//!
//! RULE: Only store.rs talks to the database.
//! The simulation itself never touches SQLite; the runner writes each
//! run's config, daily snapshots and summary once the run has finished.

use anyhow::Result;
use fyndr_core::{DailySnapshot, SimConfig, SimSummary};
use rusqlite::{params, Connection};

pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("../migrations/001_runs.sql"))?;
        Ok(())
    }

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: u64,
        days: u64,
        started_at: &str,
        config: &SimConfig,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, days, version, started_at, config_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                seed as i64,
                days as i64,
                env!("CARGO_PKG_VERSION"),
                started_at,
                serde_json::to_string(config)?,
            ],
        )?;
        Ok(())
    }

    /// Write every snapshot of a run in one transaction.
    pub fn insert_snapshots(&mut self, run_id: &str, snapshots: &[DailySnapshot]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO daily_snapshot
                   (run_id, day, active_players, total_revenue, scans_today,
                    active_stickers, retention_rate, event_active, state_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for s in snapshots {
                stmt.execute(params![
                    run_id,
                    s.day as i64,
                    s.active_players as i64,
                    s.total_revenue,
                    s.scans_today as i64,
                    s.active_stickers as i64,
                    s.retention_rate,
                    s.event_active,
                    serde_json::to_string(s)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_summary(&self, run_id: &str, summary: &SimSummary) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run_summary
               (run_id, days_simulated, total_revenue, active_players,
                total_players_ever, retention_rate, summary_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                summary.days_simulated as i64,
                summary.total_revenue,
                summary.active_players as i64,
                summary.total_players_ever as i64,
                summary.retention_rate,
                serde_json::to_string(summary)?,
            ],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn snapshot_count(&self, run_id: &str) -> Result<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_snapshot WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    #[cfg(test)]
    pub fn summary_revenue(&self, run_id: &str) -> Result<f64> {
        let revenue = self.conn.query_row(
            "SELECT total_revenue FROM run_summary WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(revenue)
    }
}
