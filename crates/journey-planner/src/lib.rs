//! The time-expanded-graph itinerary search, built directly against a
//! `gtfs_store::Store`. This is the "hard engineering" crate: search, step
//! hydration, geometry, and stop lookup all live here, wrapped behind a
//! single `Planner` handle so a CLI/GUI collaborator never touches SQL.

pub mod error;
pub mod geometry;
pub mod neighbors;
pub mod params;
pub mod search;
pub mod service;
pub mod steps;
pub mod stops;
pub mod summary;
pub mod time;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

pub use error::{PlannerError, Result};
pub use geometry::LatLon;
pub use params::{Mode, SearchParams};
pub use search::{Itinerary, PathNode};
pub use steps::{JourneyStep, RideStep, TransferStep};

use gtfs_store::Store;

/// A Planner is cheap to construct and holds no state across calls except
/// what's local to a single search — it is not safe to share across
/// threads (§5), since nothing here prevents a caller from doing so anyway,
/// this is a documentation contract rather than an enforced one.
pub struct Planner<'a> {
    store: &'a Store,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a Store) -> Planner<'a> {
        Planner { store }
    }

    pub fn search_stop(&self, prefix: &str, limit: usize) -> Result<Vec<(String, String)>> {
        stops::search_stop(self.store.connection(), prefix, limit)
    }

    pub fn search_stop_custom(&self, prefix: &str, limit: usize) -> Result<Vec<(String, String)>> {
        stops::search_stop_custom(self.store.connection(), prefix, limit)
    }

    pub fn journey_search(
        &self,
        from_stop_id: &str,
        to_stop_id: &str,
        departure_utc: chrono::NaiveDateTime,
        mode: Mode,
        max_execution_time_seconds: Option<u64>,
    ) -> Result<(Option<Itinerary>, f64)> {
        search::journey_search(self.store, from_stop_id, to_stop_id, departure_utc, mode, max_execution_time_seconds)
    }

    /// Hydrates a path into display steps, localised to `tz`. Internally
    /// every search datetime is naive UTC (§4.4.1); this is the one place
    /// that crosses into a display timezone, matching the GUI boundary the
    /// design notes draw around naive-UTC search state.
    pub fn get_journey_details(&self, path: &[PathNode], tz: Tz) -> Result<Vec<JourneyStep>> {
        let session = self.store.open_session();
        let steps = steps::hydrate(&session, path)?;
        Ok(steps.into_iter().map(|step| localize_step(step, tz)).collect())
    }

    pub fn get_journey_geometry(&self, steps: &[JourneyStep]) -> Result<Vec<LatLon>> {
        let session = self.store.open_session();
        geometry::journey_geometry(&session, steps)
    }
}

fn localize(naive_utc: chrono::NaiveDateTime, tz: Tz) -> chrono::NaiveDateTime {
    Utc.from_utc_datetime(&naive_utc).with_timezone(&tz).naive_local()
}

fn localize_step(step: JourneyStep, tz: Tz) -> JourneyStep {
    match step {
        JourneyStep::Ride(mut ride) => {
            ride.departure = localize(ride.departure, tz);
            ride.arrival = localize(ride.arrival, tz);
            JourneyStep::Ride(ride)
        }
        JourneyStep::Transfer(mut transfer) => {
            transfer.departure = localize(transfer.departure, tz);
            transfer.arrival = localize(transfer.arrival, tz);
            JourneyStep::Transfer(transfer)
        }
    }
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
        ).unwrap();
        conn.execute(
            "INSERT INTO trips (trip_id, route_id, service_id) VALUES ('T1', 'R1', 'S')",
            [],
        ).unwrap();
        for (stop_id, name, lat, lon) in [("A", "Alpha", 48.85, 2.35), ("B", "Beta", 48.86, 2.36)] {
            conn.execute(
                "INSERT INTO stops (stop_id, stop_name, stop_lat, stop_lon) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![stop_id, name, lat, lon],
            ).unwrap();
        }
        conn.execute(
            "INSERT INTO routes (route_id, route_type) VALUES ('R1', 3)",
            [],
        ).unwrap();
        for (stop_id, seq, arr, dep) in [("A", 1, "08:00:00", "08:00:00"), ("B", 2, "08:10:00", "08:10:00")] {
            conn.execute(
                "INSERT INTO stop_times (trip_id, arrival_time, departure_time, stop_id, stop_sequence)
                 VALUES ('T1', ?1, ?2, ?3, ?4)",
                rusqlite::params![arr, dep, stop_id, seq],
            ).unwrap();
        }
        (store, dir)
    }

    #[test]
    fn end_to_end_search_hydrate_and_geometry() {
        let (store, _dir) = store();
        let planner = Planner::new(&store);
        let t = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let (result, _elapsed) = planner.journey_search("A", "B", t, Mode::Fastest, None).unwrap();
        let itinerary = result.unwrap();

        let steps = planner.get_journey_details(&itinerary.path, chrono_tz::Europe::Paris).unwrap();
        assert_eq!(steps.len(), 1);

        let geometry = planner.get_journey_geometry(&steps).unwrap();
        assert_eq!(geometry.len(), 2);

        let text = summary::summarize(&steps);
        assert!(text.contains("Alpha"));
    }

    #[test]
    fn stop_search_finds_inserted_stops() {
        let (store, _dir) = store();
        let planner = Planner::new(&store);
        let results = planner.search_stop("Alpha", 5).unwrap();
        assert_eq!(results, vec![("A".to_string(), "Alpha".to_string())]);
    }
}
