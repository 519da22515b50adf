//! Geometry retrieval (§4.4.7): turning hydrated steps into polylines.

use gtfs_store::Session;

use crate::error::Result;
use crate::steps::JourneyStep;

pub type LatLon = (f64, f64);

fn ride_geometry(session: &Session, step: &crate::steps::RideStep) -> Result<Vec<LatLon>> {
    let from = session.get_stop(&step.from_stop_id)?;
    let to = session.get_stop(&step.to_stop_id)?;

    let mut stmt = session.connection().prepare(
        "SELECT s.stop_lat, s.stop_lon
         FROM stop_times st JOIN stops s ON s.stop_id = st.stop_id
         WHERE st.trip_id = ?1 AND st.stop_sequence > ?2 AND st.stop_sequence < ?3
         ORDER BY st.stop_sequence",
    )?;
    let mut rows = stmt.query(rusqlite::params![step.trip_id, step.from_sequence, step.to_sequence])?;

    let mut points = vec![(from.stop_lat, from.stop_lon)];
    while let Some(row) = rows.next()? {
        points.push((row.get(0)?, row.get(1)?));
    }
    points.push((to.stop_lat, to.stop_lon));
    Ok(points)
}

fn transfer_geometry(session: &Session, step: &crate::steps::TransferStep) -> Result<Vec<LatLon>> {
    let from = session.get_stop(&step.from_stop_id)?;
    let to = session.get_stop(&step.to_stop_id)?;
    Ok(vec![(from.stop_lat, from.stop_lon), (to.stop_lat, to.stop_lon)])
}

pub fn step_geometry(session: &Session, step: &JourneyStep) -> Result<Vec<LatLon>> {
    match step {
        JourneyStep::Ride(ride) => ride_geometry(session, ride),
        JourneyStep::Transfer(transfer) => transfer_geometry(session, transfer),
    }
}

/// Concatenates every step's geometry, dropping the repeated point where
/// one step's arrival coordinate is the next step's departure coordinate.
pub fn journey_geometry(session: &Session, steps: &[JourneyStep]) -> Result<Vec<LatLon>> {
    let mut out: Vec<LatLon> = Vec::new();
    for step in steps {
        let points = step_geometry(session, step)?;
        let mut iter = points.into_iter();
        if let Some(first) = iter.next() {
            if out.last() != Some(&first) {
                out.push(first);
            }
            out.extend(iter);
        }
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
        for (stop_id, name, lat, lon) in [
            ("A", "Alpha", 0.0, 0.0),
            ("B", "Beta", 1.0, 1.0),
            ("C", "Gamma", 2.0, 2.0),
        ] {
            conn.execute(
                "INSERT INTO stops (stop_id, stop_name, stop_lat, stop_lon) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![stop_id, name, lat, lon],
            ).unwrap();
        }
        for (stop_id, seq) in [("A", 1), ("B", 2), ("C", 3)] {
            conn.execute(
                "INSERT INTO stop_times (trip_id, arrival_time, departure_time, stop_id, stop_sequence)
                 VALUES ('T1', '08:00:00', '08:00:00', ?1, ?2)",
                rusqlite::params![stop_id, seq],
            ).unwrap();
        }
        (store, dir)
    }

    #[test]
    fn ride_geometry_includes_intermediate_stops() {
        let (store, _dir) = store();
        let session = store.open_session();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let step = crate::steps::RideStep {
            trip_id: "T1".into(),
            route_short_name: None,
            route_long_name: None,
            trip_headsign: None,
            agency_name: None,
            from_stop_id: "A".into(),
            from_stop_name: "Alpha".into(),
            to_stop_id: "C".into(),
            to_stop_name: "Gamma".into(),
            departure: date.and_hms_opt(8, 0, 0).unwrap(),
            arrival: date.and_hms_opt(8, 20, 0).unwrap(),
            from_sequence: 1,
            to_sequence: 3,
        };
        let points = ride_geometry(&session, &step).unwrap();
        assert_eq!(points, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    }
}
