// =============================================================================
// History Store — append-only bar history in SQLite
// =============================================================================
//
// Shared by every subscriber session. Each operation is a short-lived
// transaction on a pooled connection: WAL mode gives concurrent readers and
// a single serialized writer, so no lock is ever held across an await point.
//
// Schema: prices(timestamp TEXT, symbol TEXT, price REAL). `timestamp` is a
// clock-time label (`HH:MM`) and may repeat across days; `rowid` is the only
// total order (arrival sequence).
// =============================================================================

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params_from_iter;
use tracing::info;

use crate::error::EngineError;
use crate::types::Bar;

pub type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS prices (
        timestamp TEXT,
        symbol TEXT,
        price REAL
    );
    CREATE INDEX IF NOT EXISTS idx_sym_time ON prices(symbol, timestamp);
";

/// Append-only tabular store of closed bars, queryable by symbol set.
pub struct HistoryStore {
    pool: DbPool,
}

impl HistoryStore {
    /// Open (or create) the bar database at `path`.
    pub fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            let _ = conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
            conn.busy_timeout(std::time::Duration::from_millis(5000))
        });
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .map_err(|e| EngineError::Store(e.to_string()))?;

        pool.get()?.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "history store opened");
        Ok(Self { pool })
    }

    /// In-memory store for tests. Pool size stays 1 so every operation sees
    /// the same memory database.
    #[cfg(test)]
    pub fn open_in_memory() -> Self {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        pool.get().unwrap().execute_batch(SCHEMA).unwrap();
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // Writes (serialized, one transaction per commit)
    // -------------------------------------------------------------------------

    /// Append all `bars` atomically. Either every row lands or none does.
    pub fn insert_batch(&self, bars: &[Bar]) -> Result<(), EngineError> {
        if bars.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO prices VALUES (?1, ?2, ?3)")?;
            for bar in bars {
                stmt.execute(rusqlite::params![bar.timestamp, bar.symbol, bar.price])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Clear a symbol's entire series. Used when re-seeding from a cold-start
    /// snapshot so stale rows don't leave jagged charts.
    pub fn delete_all(&self, symbol: &str) -> Result<usize, EngineError> {
        let conn = self.pool.get()?;
        let n = conn.execute("DELETE FROM prices WHERE symbol = ?1", [symbol])?;
        Ok(n)
    }

    /// Bulk-load a seeded series for one symbol in a single transaction.
    pub fn bulk_load(&self, symbol: &str, bars: &[Bar]) -> Result<(), EngineError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO prices VALUES (?1, ?2, ?3)")?;
            for bar in bars {
                stmt.execute(rusqlite::params![bar.timestamp, symbol, bar.price])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Full series for the given symbol set, in arrival order.
    pub fn query(&self, symbols: &[String]) -> Result<Vec<Bar>, EngineError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT timestamp, symbol, price FROM prices
             WHERE symbol IN ({}) ORDER BY rowid ASC",
            placeholders(symbols.len())
        );
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(symbols), row_to_bar)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The most recent `per_symbol_limit × |symbols|` rows for the given
    /// symbol set, returned in arrival order.
    pub fn query_recent(
        &self,
        symbols: &[String],
        per_symbol_limit: usize,
    ) -> Result<Vec<Bar>, EngineError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT timestamp, symbol, price FROM prices
             WHERE symbol IN ({}) ORDER BY rowid DESC LIMIT {}",
            placeholders(symbols.len()),
            per_symbol_limit * symbols.len()
        );
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(params_from_iter(symbols), row_to_bar)?
            .collect::<Result<Vec<_>, _>>()?;
        // Back to arrival order.
        rows.reverse();
        Ok(rows)
    }

    /// Most recently persisted price for a symbol, if any. Live-price
    /// fallback when a session's tick buffer is empty.
    pub fn last_price(&self, symbol: &str) -> Result<Option<f64>, EngineError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT price FROM prices WHERE symbol = ?1 ORDER BY rowid DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([symbol])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Time label of a symbol's newest bar, if any. Drives the cold-start
    /// freshness check (skip re-seeding when the series already reaches the
    /// current minute).
    pub fn latest_label(&self, symbol: &str) -> Result<Option<String>, EngineError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp FROM prices WHERE symbol = ?1 ORDER BY rowid DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([symbol])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn row_to_bar(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bar> {
    Ok(Bar {
        timestamp: row.get(0)?,
        symbol: row.get(1)?,
        price: row.get(2)?,
    })
}
