//! The persistent corpus: a single SQLite file holding every ingested GTFS
//! entity plus the synthetic transfers and per-process metadata the rest of
//! the pipeline depends on.
//!
//! Mirrors the original importer's choice of SQLite, accessed here through
//! `rusqlite` instead of the stdlib `sqlite3` module. `Session` is the
//! explicit connection/cursor abstraction called for in the design notes:
//! callers open one, use it, and it is released on drop rather than being
//! threaded through as an optional duck-typed argument.

pub mod error;
pub mod schema;
pub mod types;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

pub use error::{Result, StoreError};
pub use types::*;

/// Owns the one writable connection to the store file and knows how to mint
/// additional read-only connections for parallel workers (TransferBuilder).
pub struct Store {
    path: PathBuf,
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "foreign_keys", &"OFF")?;
        Ok(Store { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes all persistent state. Schema is untouched so a subsequent
    /// `ensure_schema` call is always safe to run unconditionally.
    pub fn reset(&self) -> Result<()> {
        schema::reset(&self.conn)
    }

    pub fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.conn)
    }

    /// Borrow the live connection for the duration of a scoped operation.
    /// This is the Store's "session": there is nothing to close explicitly,
    /// the borrow itself is the scope.
    pub fn open_session(&self) -> Session<'_> {
        Session { conn: &self.conn }
    }

    /// A second, independent connection onto the same file, for a worker
    /// that must not share the writer's connection. Never used for writes.
    pub fn open_read_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "query_only", &"ON")?;
        Ok(conn)
    }

    /// Raw access for the ingest/transfer-builder crates, which need to run
    /// bulk statements this crate doesn't expose a typed wrapper for.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        self.open_session().get_metadata(key)
    }
}

/// A scoped, read-oriented view onto a connection. Cheap to create, cheap
/// to drop; the typed lookups a caller needs to hydrate journey steps live
/// here rather than as free functions taking a bare `&Connection`.
pub struct Session<'a> {
    conn: &'a Connection,
}

impl<'a> Session<'a> {
    pub fn new(conn: &'a Connection) -> Session<'a> {
        Session { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::from(other)),
            })
    }

    pub fn get_agency(&self, agency_id: &str) -> Result<Agency> {
        self.conn
            .query_row(
                "SELECT agency_id, agency_name, agency_url, agency_timezone, agency_lang, agency_phone
                 FROM agency WHERE agency_id = ?1",
                [agency_id],
                |row| {
                    Ok(Agency {
                        agency_id: row.get(0)?,
                        agency_name: row.get(1)?,
                        agency_url: row.get(2)?,
                        agency_timezone: row.get(3)?,
                        agency_lang: row.get(4)?,
                        agency_phone: row.get(5)?,
                    })
                },
            )
            .map_err(|err| not_found_or(err, "agency", agency_id))
    }

    pub fn get_stop(&self, stop_id: &str) -> Result<Stop> {
        self.conn
            .query_row(
                "SELECT stop_id, stop_name, stop_lat, stop_lon, stop_code, zone_id,
                        parent_station, location_type, wheelchair_boarding, platform_code
                 FROM stops WHERE stop_id = ?1",
                [stop_id],
                |row| {
                    Ok(Stop {
                        stop_id: row.get(0)?,
                        stop_name: row.get(1)?,
                        stop_lat: row.get(2)?,
                        stop_lon: row.get(3)?,
                        stop_code: row.get(4)?,
                        zone_id: row.get(5)?,
                        parent_station: row.get(6)?,
                        location_type: row.get(7)?,
                        wheelchair_boarding: row.get(8)?,
                        platform_code: row.get(9)?,
                    })
                },
            )
            .map_err(|err| not_found_or(err, "stop", stop_id))
    }

    pub fn get_route(&self, route_id: &str) -> Result<Route> {
        self.conn
            .query_row(
                "SELECT route_id, agency_id, route_short_name, route_long_name, route_type,
                        route_color, route_text_color
                 FROM routes WHERE route_id = ?1",
                [route_id],
                |row| {
                    Ok(Route {
                        route_id: row.get(0)?,
                        agency_id: row.get(1)?,
                        route_short_name: row.get(2)?,
                        route_long_name: row.get(3)?,
                        route_type: row.get(4)?,
                        route_color: row.get(5)?,
                        route_text_color: row.get(6)?,
                    })
                },
            )
            .map_err(|err| not_found_or(err, "route", route_id))
    }

    pub fn get_trip(&self, trip_id: &str) -> Result<Trip> {
        self.conn
            .query_row(
                "SELECT trip_id, route_id, service_id, trip_headsign, trip_short_name,
                        direction_id, block_id, shape_id, wheelchair_accessible, bikes_allowed
                 FROM trips WHERE trip_id = ?1",
                [trip_id],
                |row| {
                    Ok(Trip {
                        trip_id: row.get(0)?,
                        route_id: row.get(1)?,
                        service_id: row.get(2)?,
                        trip_headsign: row.get(3)?,
                        trip_short_name: row.get(4)?,
                        direction_id: row.get(5)?,
                        block_id: row.get(6)?,
                        shape_id: row.get(7)?,
                        wheelchair_accessible: row.get(8)?,
                        bikes_allowed: row.get(9)?,
                    })
                },
            )
            .map_err(|err| not_found_or(err, "trip", trip_id))
    }

    /// Returns `(from_stop_sequence, to_stop_sequence)` for two stops visited
    /// by the same trip. `StoreError::NotFound` if the trip doesn't visit
    /// exactly those two stops once each (the Inconsistency case of §7).
    pub fn get_stop_sequences(
        &self,
        trip_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
    ) -> Result<(i64, i64)> {
        let mut stmt = self.conn.prepare(
            "SELECT stop_id, stop_sequence FROM stop_times
             WHERE trip_id = ?1 AND stop_id IN (?2, ?3)",
        )?;
        let mut from_seq = None;
        let mut to_seq = None;
        let mut rows = stmt.query(rusqlite::params![trip_id, from_stop_id, to_stop_id])?;
        while let Some(row) = rows.next()? {
            let stop_id: String = row.get(0)?;
            let seq: i64 = row.get(1)?;
            if stop_id == from_stop_id {
                from_seq = Some(seq);
            } else if stop_id == to_stop_id {
                to_seq = Some(seq);
            }
        }
        match (from_seq, to_seq) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(StoreError::NotFound(format!(
                "stop sequences for trip {} between {} and {}",
                trip_id, from_stop_id, to_stop_id
            ))),
        }
    }
}

fn not_found_or(err: rusqlite::Error, kind: &str, key: &str) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => {
            StoreError::NotFound(format!("{} {}", kind, key))
        }
        other => StoreError::from(other),
    }
}
