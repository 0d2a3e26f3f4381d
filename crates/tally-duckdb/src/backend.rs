use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use tally_core::visit::{NewVisit, VisitRecord};

use crate::schema::init_sql;

/// A DuckDB backend holding the `visits` table.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// contend. The connection sits behind `Arc<Mutex<_>>` so every insert is
/// serialised while the struct stays cheap to share across Axum handlers.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    /// The schema is created if it does not already exist.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert one enriched visit and return the id assigned by the sequence.
    ///
    /// `created_at` and `processed` take their column defaults.
    pub async fn insert_visit(&self, visit: &NewVisit) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"INSERT INTO visits (
                visitor_id, "timestamp", url, path, referrer, user_agent,
                screen_width, screen_height, ip_address, country, city,
                device_type, language, event_type, duration
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15
            ) RETURNING id"#,
        )?;
        let id: i64 = stmt.query_row(
            duckdb::params![
                visit.visitor_id,
                visit.timestamp,
                visit.url,
                visit.path,
                visit.referrer,
                visit.user_agent,
                visit.screen_width,
                visit.screen_height,
                visit.ip_address,
                visit.country,
                visit.city,
                visit.device_type,
                visit.language,
                visit.event_type,
                visit.duration,
            ],
            |row| row.get(0),
        )?;
        tracing::debug!(id, visitor_id = %visit.visitor_id, "Visit inserted");
        Ok(id)
    }

    /// Return up to `limit` visits ordered newest first.
    pub async fn recent_visits(&self, limit: usize) -> Result<Vec<VisitRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"SELECT id, visitor_id, "timestamp", url, path, referrer, user_agent,
                      screen_width, screen_height, ip_address, country, city,
                      device_type, language, event_type, duration,
                      CAST(created_at AS VARCHAR), processed
               FROM visits
               ORDER BY id DESC
               LIMIT ?1"#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(duckdb::params![limit], |row| {
            Ok(VisitRecord {
                id: row.get(0)?,
                visitor_id: row.get(1)?,
                timestamp: row.get(2)?,
                url: row.get(3)?,
                path: row.get(4)?,
                referrer: row.get(5)?,
                user_agent: row.get(6)?,
                screen_width: row.get(7)?,
                screen_height: row.get(8)?,
                ip_address: row.get(9)?,
                country: row.get(10)?,
                city: row.get(11)?,
                device_type: row.get(12)?,
                language: row.get(13)?,
                event_type: row.get(14)?,
                duration: row.get(15)?,
                created_at: row.get(16)?,
                processed: row.get(17)?,
            })
        })?;

        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?);
        }
        Ok(visits)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
