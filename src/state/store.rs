//! StateStore — SQLite-backed persistence for per-service alert state.
//!
//! Two tables: `service_state` holds one row per service, `service_history`
//! holds the rolling window of recent outcomes. Every evaluation writes the
//! row, appends history and prunes it inside one transaction while holding
//! the connection mutex, so readers only ever see committed evaluations.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::debug;

use crate::health::ProbeResult;
use crate::state::error::{StateError, StateResult};
use crate::state::machine::{evaluate, DisplayStatus, ServiceStateRow, ServiceStatus, StateChange};

/// Entries kept per service in `service_history`.
pub const HISTORY_LIMIT: usize = 10;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS service_state (
        service_name   TEXT PRIMARY KEY,
        status         TEXT NOT NULL DEFAULT 'ok',
        message        TEXT NOT NULL DEFAULT '',
        error_count    INTEGER NOT NULL DEFAULT 0,
        alerted        INTEGER NOT NULL DEFAULT 0,
        last_checked   TEXT,
        first_error_at TEXT
    );
    CREATE TABLE IF NOT EXISTS service_history (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        service_name TEXT NOT NULL,
        status       TEXT NOT NULL,
        checked_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_service_history_name
        ON service_history (service_name, id);
";

/// One retained outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub status: ServiceStatus,
    pub checked_at: DateTime<Utc>,
}

/// A service's row plus its retained history, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSnapshot {
    pub name: String,
    pub display_status: DisplayStatus,
    #[serde(flatten)]
    pub state: ServiceStateRow,
    /// Oldest first.
    pub history: Vec<HistoryEntry>,
}

/// Thread-safe state store backed by SQLite.
#[derive(Clone)]
pub struct StateStore {
    conn: Arc<Mutex<Connection>>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let conn = Connection::open(path).map_err(|e| StateError::Open(e.to_string()))?;
        let store = Self::init(conn)?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StateError::Open(e.to_string()))?;
        let store = Self::init(conn)?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn init(conn: Connection) -> StateResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))
            .and_then(|_| conn.execute_batch(SCHEMA))
            .map_err(|e| StateError::Open(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StateResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StateError::Poisoned)
    }

    /// Evaluate `result` against the stored row and persist the outcome.
    ///
    /// A service seen for the first time starts from the default row.
    pub fn record(&self, result: &ProbeResult, threshold: u32) -> StateResult<StateChange> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let previous = load_row(&tx, &result.service_name)?.unwrap_or_default();
        let (row, change) = evaluate(&previous, result, threshold);
        write_row(&tx, &result.service_name, &row)?;
        append_history(&tx, &result.service_name, row.status, result.checked_at)?;

        tx.commit()?;
        debug!(
            service = %result.service_name,
            status = %row.status,
            error_count = row.error_count,
            alerted = row.alerted,
            "state recorded"
        );
        Ok(change)
    }

    /// Stored row for one service, if it has ever been evaluated.
    pub fn load(&self, service: &str) -> StateResult<Option<ServiceStateRow>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        load_row(&tx, service)
    }

    /// Retained history for one service, oldest first.
    pub fn history(&self, service: &str) -> StateResult<Vec<HistoryEntry>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        load_history(&tx, service)
    }

    /// Every known service ordered by name, with its history.
    pub fn all_states(&self) -> StateResult<Vec<ServiceSnapshot>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let names: Vec<String> = {
            let mut stmt = tx.prepare("SELECT service_name FROM service_state ORDER BY service_name")?;
            let rows = stmt.query_map([], |r| r.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut snapshots = Vec::with_capacity(names.len());
        for name in names {
            let Some(state) = load_row(&tx, &name)? else {
                continue;
            };
            let history = load_history(&tx, &name)?;
            snapshots.push(ServiceSnapshot {
                display_status: state.display_status(),
                name,
                state,
                history,
            });
        }
        Ok(snapshots)
    }

    /// [`record`](Self::record) on the blocking thread pool.
    pub async fn record_async(&self, result: ProbeResult, threshold: u32) -> StateResult<StateChange> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.record(&result, threshold)).await?
    }

    /// [`all_states`](Self::all_states) on the blocking thread pool.
    pub async fn all_states_async(&self) -> StateResult<Vec<ServiceSnapshot>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.all_states()).await?
    }

    /// Close the database once this is the last handle.
    pub fn close(self) -> StateResult<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner().map_err(|_| StateError::Poisoned)?;
                conn.close().map_err(|(_, e)| StateError::Query(e))?;
                debug!("state store closed");
            }
            Err(_) => debug!("state store still shared; closing with the last handle"),
        }
        Ok(())
    }
}

fn load_row(tx: &Transaction<'_>, service: &str) -> StateResult<Option<ServiceStateRow>> {
    let raw = tx
        .query_row(
            "SELECT status, message, error_count, alerted, last_checked, first_error_at
             FROM service_state WHERE service_name = ?1",
            params![service],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, Option<String>>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((status, message, error_count, alerted, last_checked, first_error_at)) = raw else {
        return Ok(None);
    };

    let corrupt = |detail: String| StateError::Corrupt {
        service: service.to_string(),
        detail,
    };

    Ok(Some(ServiceStateRow {
        status: ServiceStatus::parse(&status).ok_or_else(|| corrupt(format!("status '{}'", status)))?,
        message: message.unwrap_or_default(),
        error_count: u32::try_from(error_count).map_err(|_| corrupt(format!("error_count {}", error_count)))?,
        alerted: alerted != 0,
        last_checked: last_checked.map(|s| decode_time(&s)).transpose().map_err(corrupt)?,
        first_error_at: first_error_at.map(|s| decode_time(&s)).transpose().map_err(corrupt)?,
    }))
}

fn write_row(tx: &Transaction<'_>, service: &str, row: &ServiceStateRow) -> StateResult<()> {
    tx.execute(
        "INSERT INTO service_state
             (service_name, status, message, error_count, alerted, last_checked, first_error_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(service_name) DO UPDATE SET
             status = excluded.status,
             message = excluded.message,
             error_count = excluded.error_count,
             alerted = excluded.alerted,
             last_checked = excluded.last_checked,
             first_error_at = excluded.first_error_at",
        params![
            service,
            row.status.as_str(),
            row.message,
            i64::from(row.error_count),
            i64::from(row.alerted),
            row.last_checked.map(encode_time),
            row.first_error_at.map(encode_time),
        ],
    )?;
    Ok(())
}

fn append_history(
    tx: &Transaction<'_>,
    service: &str,
    status: ServiceStatus,
    checked_at: DateTime<Utc>,
) -> StateResult<()> {
    tx.execute(
        "INSERT INTO service_history (service_name, status, checked_at) VALUES (?1, ?2, ?3)",
        params![service, status.as_str(), encode_time(checked_at)],
    )?;
    tx.execute(
        "DELETE FROM service_history
         WHERE service_name = ?1
           AND id NOT IN (
               SELECT id FROM service_history
               WHERE service_name = ?1
               ORDER BY id DESC
               LIMIT ?2
           )",
        params![service, HISTORY_LIMIT as i64],
    )?;
    Ok(())
}

fn load_history(tx: &Transaction<'_>, service: &str) -> StateResult<Vec<HistoryEntry>> {
    let mut stmt = tx.prepare(
        "SELECT status, checked_at FROM service_history WHERE service_name = ?1 ORDER BY id ASC",
    )?;
    let raw = stmt
        .query_map(params![service], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(status, checked_at)| {
            let corrupt = |detail: String| StateError::Corrupt {
                service: service.to_string(),
                detail,
            };
            Ok(HistoryEntry {
                status: ServiceStatus::parse(&status).ok_or_else(|| corrupt(format!("history status '{}'", status)))?,
                checked_at: decode_time(&checked_at).map_err(corrupt)?,
            })
        })
        .collect()
}

fn encode_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("timestamp '{}': {}", raw, e))
}
