// ── Persistent traffic store ──
//
// Owns the (raw_data, data_types) relations and their many-to-many
// association. Every operation runs in one transaction. A raw row exists
// only while at least one data type matched it at insert time; cascade
// paths delete rows whose association count drops to zero.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{DataType, Direction, NewRawData, RawRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS data_types (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT    NOT NULL UNIQUE,
    forecasting        INTEGER NOT NULL DEFAULT 0,
    network_protocol   INTEGER NOT NULL,
    transport_protocol INTEGER NOT NULL,
    port               INTEGER NOT NULL,
    UNIQUE (network_protocol, transport_protocol, port)
);

CREATE TABLE IF NOT EXISTS raw_data (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    ts        INTEGER NOT NULL,
    bytes     INTEGER NOT NULL,
    direction INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS data_to_types (
    data_id INTEGER NOT NULL REFERENCES raw_data (id),
    type_id INTEGER NOT NULL REFERENCES data_types (id),
    PRIMARY KEY (data_id, type_id)
);

CREATE INDEX IF NOT EXISTS idx_raw_data_ts ON raw_data (ts);
CREATE INDEX IF NOT EXISTS idx_links_type ON data_to_types (type_id);
"#;

/// Matching rule: wildcard-zero fields widen the match; the port matches
/// either end of the flow.
const MATCH_TYPES_SQL: &str = "SELECT id FROM data_types \
     WHERE network_protocol = 0 \
        OR (network_protocol = ?1 \
            AND (transport_protocol = 0 \
                 OR (transport_protocol = ?2 \
                     AND (port = 0 OR port = ?3 OR port = ?4))))";

const SELECT_TYPE_SQL: &str =
    "SELECT id, name, forecasting, network_protocol, transport_protocol, port FROM data_types";

/// The store plus the coarse advisory lock analyzers serialize on.
pub struct TrafficStore {
    conn: Mutex<Connection>,
    ultimate: Mutex<()>,
}

/// Held by an analyzer for a whole per-tick pass.
pub struct UltimateGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

impl TrafficStore {
    /// Open (or create) the store at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "store opened");
        Self::init(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ultimate: Mutex::new(()),
        })
    }

    /// Acquire the advisory analyzer lock for a full per-tick pass.
    pub async fn ultimate_lock(&self) -> UltimateGuard<'_> {
        UltimateGuard(self.ultimate.lock().await)
    }

    // ── Ingest ───────────────────────────────────────────────────────

    /// Insert one aggregated batch atomically.
    ///
    /// Each row is matched against the catalog; rows with at least one
    /// match are inserted and linked to every matching type, the rest are
    /// dropped. Returns how many rows were persisted.
    pub async fn insert_batch(&self, rows: &[NewRawData]) -> Result<usize, CoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
            let mut match_stmt = tx.prepare(MATCH_TYPES_SQL)?;
            let mut insert_stmt =
                tx.prepare("INSERT INTO raw_data (ts, bytes, direction) VALUES (?1, ?2, ?3)")?;
            let mut link_stmt =
                tx.prepare("INSERT INTO data_to_types (data_id, type_id) VALUES (?1, ?2)")?;

            for row in rows {
                let type_ids: Vec<i64> = match_stmt
                    .query_map(
                        params![
                            row.key.network_protocol,
                            row.key.transport_protocol,
                            row.key.src_port,
                            row.key.dst_port,
                        ],
                        |r| r.get(0),
                    )?
                    .collect::<Result<_, _>>()?;
                if type_ids.is_empty() {
                    continue;
                }

                insert_stmt.execute(params![
                    row.timestamp.timestamp_millis(),
                    row.bytes as i64,
                    row.key.direction.as_u8(),
                ])?;
                let data_id = tx.last_insert_rowid();
                for type_id in type_ids {
                    link_stmt.execute(params![data_id, type_id])?;
                }
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    // ── Data type catalog ────────────────────────────────────────────

    pub async fn list_data_types(&self) -> Result<Vec<DataType>, CoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("{SELECT_TYPE_SQL} ORDER BY id"))?;
        let types = stmt
            .query_map([], row_to_data_type)?
            .collect::<Result<_, _>>()?;
        Ok(types)
    }

    pub async fn get_data_type(&self, id: i64) -> Result<DataType, CoreError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("{SELECT_TYPE_SQL} WHERE id = ?1"),
            params![id],
            row_to_data_type,
        )
        .optional()?
        .ok_or_else(|| not_found(id))
    }

    /// Create a data type; the store assigns the id.
    pub async fn create_data_type(&self, spec: &DataType) -> Result<DataType, CoreError> {
        spec.validate()?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO data_types (name, forecasting, network_protocol, transport_protocol, port) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                spec.name,
                spec.forecasting,
                spec.network_protocol,
                spec.transport_protocol,
                spec.port,
            ],
        )
        .map_err(conflict_on_unique)?;
        let id = conn.last_insert_rowid();
        debug!(id, name = %spec.name, "data type created");
        Ok(DataType {
            id,
            ..spec.clone()
        })
    }

    /// Update all mutable fields of a data type.
    pub async fn update_data_type(&self, id: i64, spec: &DataType) -> Result<DataType, CoreError> {
        spec.validate()?;
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM data_types WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(not_found(id));
        }
        tx.execute(
            "UPDATE data_types \
             SET name = ?1, forecasting = ?2, network_protocol = ?3, transport_protocol = ?4, port = ?5 \
             WHERE id = ?6",
            params![
                spec.name,
                spec.forecasting,
                spec.network_protocol,
                spec.transport_protocol,
                spec.port,
                id,
            ],
        )
        .map_err(conflict_on_unique)?;
        tx.commit()?;
        debug!(id, name = %spec.name, "data type updated");
        Ok(DataType {
            id,
            ..spec.clone()
        })
    }

    /// Delete a data type, its associations, and any raw rows orphaned by
    /// the unlink. Returns the deleted type.
    pub async fn delete_data_type(&self, id: i64) -> Result<DataType, CoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let data_type = tx
            .query_row(
                &format!("{SELECT_TYPE_SQL} WHERE id = ?1"),
                params![id],
                row_to_data_type,
            )
            .optional()?
            .ok_or_else(|| not_found(id))?;

        let linked_rows: Vec<i64> = tx
            .prepare("SELECT data_id FROM data_to_types WHERE type_id = ?1")?
            .query_map(params![id], |r| r.get(0))?
            .collect::<Result<_, _>>()?;

        tx.execute("DELETE FROM data_to_types WHERE type_id = ?1", params![id])?;
        {
            let mut orphan_stmt = tx.prepare(
                "DELETE FROM raw_data WHERE id = ?1 \
                 AND NOT EXISTS (SELECT 1 FROM data_to_types WHERE data_id = ?1)",
            )?;
            for data_id in linked_rows {
                orphan_stmt.execute(params![data_id])?;
            }
        }
        tx.execute("DELETE FROM data_types WHERE id = ?1", params![id])?;

        tx.commit()?;
        debug!(id, name = %data_type.name, "data type deleted");
        Ok(data_type)
    }

    // ── Queries the analyzers run ────────────────────────────────────

    /// Recent rows of a named class in one direction, oldest first.
    pub async fn list_recent(
        &self,
        name: &str,
        since: DateTime<Utc>,
        direction: Direction,
    ) -> Result<Vec<RawRecord>, CoreError> {
        let conn = self.conn.lock().await;
        let type_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM data_types WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?;
        let Some(type_id) = type_id else {
            return Err(CoreError::NotFound {
                entity: "data type",
                identifier: name.to_string(),
            });
        };

        let mut stmt = conn.prepare(
            "SELECT r.id, r.ts, r.bytes, r.direction \
             FROM raw_data r \
             JOIN data_to_types l ON l.data_id = r.id \
             WHERE l.type_id = ?1 AND r.ts > ?2 AND r.direction = ?3 \
             ORDER BY r.ts ASC",
        )?;
        let records = stmt
            .query_map(
                params![type_id, since.timestamp_millis(), direction.as_u8()],
                row_to_raw_record,
            )?
            .collect::<Result<_, _>>()?;
        Ok(records)
    }

    /// Retention sweep: unlink and delete every row at or before `cutoff`.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, CoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let cutoff_ms = cutoff.timestamp_millis();
        tx.execute(
            "DELETE FROM data_to_types \
             WHERE data_id IN (SELECT id FROM raw_data WHERE ts <= ?1)",
            params![cutoff_ms],
        )?;
        let removed = tx.execute("DELETE FROM raw_data WHERE ts <= ?1", params![cutoff_ms])?;
        tx.commit()?;
        Ok(removed)
    }
}

// ── Row mapping / error translation ─────────────────────────────────

fn row_to_data_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<DataType> {
    Ok(DataType {
        id: row.get(0)?,
        name: row.get(1)?,
        forecasting: row.get(2)?,
        network_protocol: row.get(3)?,
        transport_protocol: row.get(4)?,
        port: row.get(5)?,
    })
}

fn row_to_raw_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    let ts_ms: i64 = row.get(1)?;
    let direction: u8 = row.get(3)?;
    Ok(RawRecord {
        id: row.get(0)?,
        timestamp: DateTime::from_timestamp_millis(ts_ms).unwrap_or(DateTime::UNIX_EPOCH),
        bytes: row.get::<_, i64>(2)? as u64,
        direction: Direction::from_u8(direction).unwrap_or(Direction::Rx),
    })
}

fn not_found(id: i64) -> CoreError {
    CoreError::NotFound {
        entity: "data type",
        identifier: id.to_string(),
    }
}

fn conflict_on_unique(error: rusqlite::Error) -> CoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &error {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            return CoreError::Conflict {
                message: error.to_string(),
            };
        }
    }
    CoreError::Persistence(error)
}
