//! Synthetic pedestrian transfer generation between stops that are close in
//! space but not already linked — see `journey_planner` for the consumer
//! of the rows this produces.
//!
//! Ported from `TransferGenerator.generate_transfers`: same bounding-box
//! approximation, same excluded-prefix table, same "workers compute,
//! orchestrator writes" shape, but workers share one in-memory `rstar` tree
//! instead of each re-querying an on-disk spatial index.

pub mod error;
pub mod geo;
pub mod spatial;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rstar::AABB;

pub use error::{Result, TransferError};
use gtfs_store::Store;
use spatial::IndexedStop;

/// Stops sharing a feed whose raw id begins with one of these prefixes
/// already carry exhaustive internal transfers; synthesising more between
/// them would bloat the graph without adding reachability.
pub const EXCLUDED_PREFIXES: &[&str] = &["IDFM", "de", "NSR", "cz", "ch", "pl"];

pub struct TransferBuilder {
    pub max_distance_m: f64,
    pub transfer_time_sec: i64,
}

impl Default for TransferBuilder {
    fn default() -> Self {
        TransferBuilder {
            max_distance_m: 100.0,
            transfer_time_sec: 120,
        }
    }
}

/// Strips the `"NN/"` feed-index prefix, leaving the raw id the source feed
/// assigned. Used only to test the excluded-prefix rule, never persisted.
fn raw_suffix(id: &str) -> &str {
    match id.find('/') {
        Some(idx) => &id[idx + 1..],
        None => id,
    }
}

fn shares_excluded_prefix(a: &str, b: &str) -> bool {
    let (ra, rb) = (raw_suffix(a), raw_suffix(b));
    EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| ra.starts_with(prefix) && rb.starts_with(prefix))
}

impl TransferBuilder {
    pub fn new(max_distance_m: f64, transfer_time_sec: i64) -> Self {
        TransferBuilder {
            max_distance_m,
            transfer_time_sec,
        }
    }

    /// Runs the full build: refreshes the spatial index, fans the work out
    /// across `rayon`'s thread pool, and performs one serialised batched
    /// write of both transfer directions. Returns the number of rows
    /// inserted (new pairs × 2).
    pub fn build(&self, store: &Store) -> Result<usize> {
        let stops = self.ensure_spatial_index(store)?;
        if stops.is_empty() {
            return Ok(0);
        }

        let existing = self.load_existing_transfers(store)?;
        let tree = spatial::build_index(stops.clone());

        let processed = AtomicUsize::new(0);
        let total = stops.len();

        let new_pairs: HashSet<(String, String)> = stops
            .par_iter()
            .fold(HashSet::new, |mut acc, stop| {
                self.candidates_for(stop, &tree, &existing, &mut acc);
                let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if n % 1000 == 0 {
                    log::info!("transfer build: {}/{} stops processed", n, total);
                }
                acc
            })
            .reduce(HashSet::new, |mut a, b| {
                a.extend(b);
                a
            });

        self.write_transfers(store, &new_pairs)?;
        Ok(new_pairs.len() * 2)
    }

    fn candidates_for(
        &self,
        stop: &IndexedStop,
        tree: &rstar::RTree<IndexedStop>,
        existing: &HashSet<(String, String)>,
        out: &mut HashSet<(String, String)>,
    ) {
        let (dlat, dlon) = geo::bbox_delta(stop.lat, self.max_distance_m);
        let envelope = AABB::from_corners(
            [stop.lon - dlon, stop.lat - dlat],
            [stop.lon + dlon, stop.lat + dlat],
        );
        for other in tree.locate_in_envelope(&envelope) {
            if other.stop_id == stop.stop_id {
                continue;
            }
            if shares_excluded_prefix(&stop.stop_id, &other.stop_id) {
                continue;
            }
            let pair = canonical_pair(&stop.stop_id, &other.stop_id);
            if existing.contains(&pair) || out.contains(&pair) {
                continue;
            }
            let distance = geo::haversine_meters(stop.lat, stop.lon, other.lat, other.lon);
            if distance <= self.max_distance_m {
                out.insert(pair);
            }
        }
    }

    /// Assigns every stop a dense `stop_idx`, repopulates the persistent
    /// rtree table for schema fidelity, and returns the stop list the
    /// in-memory tree is actually built from.
    fn ensure_spatial_index(&self, store: &Store) -> Result<Vec<IndexedStop>> {
        let conn = store.connection();
        let mut stmt = conn.prepare("SELECT stop_id, stop_lat, stop_lon FROM stops ORDER BY stop_id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IndexedStop {
                    stop_id: row.get(0)?,
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);

        conn.execute_batch("DELETE FROM stop_index;")?;
        let tx_conn = conn;
        {
            let mut update_idx = tx_conn.prepare("UPDATE stops SET stop_idx = ?1 WHERE stop_id = ?2")?;
            let mut insert_idx = tx_conn.prepare(
                "INSERT INTO stop_index (id, min_lat, max_lat, min_lon, max_lon) VALUES (?1, ?2, ?2, ?3, ?3)",
            )?;
            for (idx, stop) in rows.iter().enumerate() {
                update_idx.execute(rusqlite::params![idx as i64, stop.stop_id])?;
                insert_idx.execute(rusqlite::params![idx as i64, stop.lat, stop.lon])?;
            }
        }
        Ok(rows)
    }

    fn load_existing_transfers(&self, store: &Store) -> Result<HashSet<(String, String)>> {
        let conn = store.connection();
        let mut stmt = conn.prepare("SELECT from_stop_id, to_stop_id FROM transfers")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(pairs)
    }

    fn write_transfers(&self, store: &Store, pairs: &HashSet<(String, String)>) -> Result<usize> {
        if pairs.is_empty() {
            return Ok(0);
        }
        let conn = store.connection();
        conn.execute_batch("BEGIN;")?;
        let result = (|| -> Result<usize> {
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO transfers (from_stop_id, to_stop_id, transfer_type, min_transfer_time)
                 VALUES (?1, ?2, 2, ?3)",
            )?;
            let mut inserted = 0;
            for (a, b) in pairs {
                inserted += stmt.execute(rusqlite::params![a, b, self.transfer_time_sec])?;
                inserted += stmt.execute(rusqlite::params![b, a, self.transfer_time_sec])?;
            }
            Ok(inserted)
        })();
        match result {
            Ok(inserted) => {
                conn.execute_batch("COMMIT;")?;
                Ok(inserted)
            }
            Err(err) => {
                conn.execute_batch("ROLLBACK;")?;
                Err(err)
            }
        }
    }
}

fn canonical_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn excluded_prefix_blocks_both_idfm() {
        assert!(shares_excluded_prefix("01/IDFM:1234", "02/IDFM:5678"));
    }

    #[test]
    fn excluded_prefix_allows_mixed_feeds() {
        assert!(!shares_excluded_prefix("01/IDFM:1234", "02/NSR:5678"));
    }

    #[test]
    fn canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair("b", "a"), canonical_pair("a", "b"));
    }

    fn store_with_stops(stops: &[(&str, f64, f64)]) -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();
        for (id, lat, lon) in stops {
            store
                .connection()
                .execute(
                    "INSERT INTO stops (stop_id, stop_name, stop_lat, stop_lon) VALUES (?1, ?1, ?2, ?3)",
                    rusqlite::params![id, lat, lon],
                )
                .unwrap();
        }
        (store, dir)
    }

    #[test]
    fn builds_transfers_between_nearby_stops() {
        let (store, _dir) = store_with_stops(&[
            ("01/A", 48.8566, 2.3522),
            ("02/B", 48.8567, 2.3522), // ~11m away
            ("03/C", 40.0, 10.0),      // far away
        ]);
        let builder = TransferBuilder::default();
        let inserted = builder.build(&store).unwrap();
        assert_eq!(inserted, 2);

        let conn = store.connection();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let min_transfer_time: i64 = conn
            .query_row(
                "SELECT min_transfer_time FROM transfers WHERE from_stop_id = '01/A'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(min_transfer_time, 120);
    }

    #[test]
    fn is_idempotent_on_a_second_run() {
        let (store, _dir) = store_with_stops(&[("01/A", 48.8566, 2.3522), ("02/B", 48.8567, 2.3522)]);
        let builder = TransferBuilder::default();
        builder.build(&store).unwrap();
        let second_run_inserted = builder.build(&store).unwrap();
        assert_eq!(second_run_inserted, 0);
    }
}
