//! Neighbour expansion for the time-expanded graph, §4.4.3 and §4.4.4.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::error::Result;
use crate::service::ServiceValidityCache;
use crate::time::parse_gtfs_time;

#[derive(Debug, Clone)]
pub struct RideNeighbor {
    pub stop_id: String,
    pub arrival: NaiveDateTime,
    pub trip_id: String,
    pub from_sequence: i64,
    pub to_sequence: i64,
}

#[derive(Debug, Clone)]
pub struct TransferNeighbor {
    pub stop_id: String,
    pub arrival: NaiveDateTime,
    pub duration_seconds: i64,
}

/// For the state `(u, t)`, finds every trip boarding at `u` within
/// `[t, t + window_seconds]` on a service valid for `t`'s date, and returns
/// one successor per reachable downstream stop `v` — the earliest arrival
/// among all qualifying trips, per the dedupe rule in §4.4.3.
pub fn ride_neighbors(
    conn: &Connection,
    service_cache: &mut ServiceValidityCache,
    u: &str,
    t: NaiveDateTime,
    window_seconds: i64,
) -> Result<Vec<RideNeighbor>> {
    let service_date = t.date();
    let valid_ids = service_cache.valid_on(conn, service_date)?.clone();
    let window_end = t + Duration::seconds(window_seconds);

    let mut boardings = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT st.trip_id, st.stop_sequence, st.departure_time, tr.service_id
             FROM stop_times st JOIN trips tr ON tr.trip_id = st.trip_id
             WHERE st.stop_id = ?1",
        )?;
        let mut rows = stmt.query([u])?;
        while let Some(row) = rows.next()? {
            let trip_id: String = row.get(0)?;
            let from_sequence: i64 = row.get(1)?;
            let departure_raw: String = row.get(2)?;
            let service_id: String = row.get(3)?;
            if !valid_ids.contains(&service_id) {
                continue;
            }
            let departure = match parse_gtfs_time(service_date, &departure_raw) {
                Some(dt) => dt,
                None => {
                    log::warn!("unparsable departure_time '{}' on trip {}", departure_raw, trip_id);
                    continue;
                }
            };
            if departure < t || departure > window_end {
                continue;
            }
            boardings.push((trip_id, from_sequence));
        }
    }

    let mut best: HashMap<String, RideNeighbor> = HashMap::new();
    for (trip_id, from_sequence) in boardings {
        let mut stmt = conn.prepare(
            "SELECT stop_id, stop_sequence, arrival_time FROM stop_times
             WHERE trip_id = ?1 AND stop_sequence > ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![trip_id, from_sequence])?;
        while let Some(row) = rows.next()? {
            let v: String = row.get(0)?;
            let to_sequence: i64 = row.get(1)?;
            let arrival_raw: String = row.get(2)?;
            let arrival = match parse_gtfs_time(service_date, &arrival_raw) {
                Some(a) => a,
                None => {
                    log::warn!("unparsable arrival_time '{}' on trip {}", arrival_raw, trip_id);
                    continue;
                }
            };
            let improves = match best.get(&v) {
                Some(existing) => arrival < existing.arrival,
                None => true,
            };
            if improves {
                best.insert(
                    v.clone(),
                    RideNeighbor {
                        stop_id: v,
                        arrival,
                        trip_id: trip_id.clone(),
                        from_sequence,
                        to_sequence,
                    },
                );
            }
        }
    }
    Ok(best.into_values().collect())
}

/// For the state `(u, t)`, one successor per `Transfer` row starting at `u`.
/// Ride count is unchanged; the transfer's duration is added to both the
/// arrival time and the accumulated-transfer-seconds bookkeeping.
pub fn transfer_neighbors(conn: &Connection, u: &str, t: NaiveDateTime) -> Result<Vec<TransferNeighbor>> {
    let mut stmt = conn.prepare(
        "SELECT to_stop_id, min_transfer_time FROM transfers WHERE from_stop_id = ?1",
    )?;
    let mut rows = stmt.query([u])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let stop_id: String = row.get(0)?;
        let duration_seconds: i64 = row.get::<_, Option<i64>>(1)?.unwrap_or(0);
        out.push(TransferNeighbor {
            stop_id,
            arrival: t + Duration::seconds(duration_seconds),
            duration_seconds,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use gtfs_store::Store;

    fn store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();
        let conn = store.connection();
        conn.execute(
            "INSERT INTO calendar (service_id, monday, tuesday, wednesday, thursday, friday,
                saturday, sunday, start_date, end_date)
             VALUES ('S', 1, 1, 1, 1, 1, 1, 1, '20250101', '20251231')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO trips (trip_id, route_id, service_id) VALUES ('T1', 'R1', 'S')",
            [],
        )
        .unwrap();
        for (stop_id, seq, arr, dep) in [
            ("A", 1, "08:00:00", "08:00:00"),
            ("B", 2, "08:10:00", "08:10:00"),
            ("C", 3, "08:20:00", "08:20:00"),
        ] {
            conn.execute(
                "INSERT INTO stop_times (trip_id, arrival_time, departure_time, stop_id, stop_sequence)
                 VALUES ('T1', ?1, ?2, ?3, ?4)",
                rusqlite::params![arr, dep, stop_id, seq],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO transfers (from_stop_id, to_stop_id, transfer_type, min_transfer_time)
             VALUES ('A', 'Z', 2, 90)",
            [],
        )
        .unwrap();
        (store, dir)
    }

    #[test]
    fn ride_neighbors_reach_every_downstream_stop() {
        let (store, _dir) = store();
        let mut cache = ServiceValidityCache::new();
        let t = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let neighbors = ride_neighbors(store.connection(), &mut cache, "A", t, 3600).unwrap();
        let mut stops: Vec<&str> = neighbors.iter().map(|n| n.stop_id.as_str()).collect();
        stops.sort();
        assert_eq!(stops, vec!["B", "C"]);
    }

    #[test]
    fn ride_neighbors_outside_the_window_are_excluded() {
        let (store, _dir) = store();
        let mut cache = ServiceValidityCache::new();
        let t = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let neighbors = ride_neighbors(store.connection(), &mut cache, "A", t, 60).unwrap();
        assert!(neighbors.is_empty());
    }

    #[test]
    fn transfer_neighbors_add_the_dwell_duration() {
        let (store, _dir) = store();
        let t = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let neighbors = transfer_neighbors(store.connection(), "A", t).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].stop_id, "Z");
        assert_eq!(neighbors[0].arrival, t + Duration::seconds(90));
    }
}
