//! The A* itinerary search, §4.4.5. The heuristic is deliberately
//! inadmissible — it trades optimality for ride-count and transfer-time
//! convenience — so the weights live in `SearchParams`, not as literals
//! here, and must be reproduced exactly for itineraries to stay reproducible.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::error::{PlannerError, Result};
use crate::neighbors::{ride_neighbors, transfer_neighbors};
use crate::params::{Mode, SearchParams};
use crate::service::ServiceValidityCache;
use gtfs_store::{Store, StoreError};
use transfer_builder::geo::haversine_meters;

#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub stop_id: String,
    pub arrival: NaiveDateTime,
    /// `Some(trip_id)` for a ride step, `None` for a transfer step. The
    /// origin node (first element) is always `None`.
    pub trip_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub path: Vec<PathNode>,
}

impl Itinerary {
    pub fn arrival(&self) -> NaiveDateTime {
        self.path.last().expect("itinerary always has at least one node").arrival
    }
}

#[derive(Debug, Clone)]
struct QueueItem {
    f_cost: f64,
    stop_id: String,
    arrival: NaiveDateTime,
    ride_count: u32,
    accumulated_transfer: i64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `BinaryHeap` is a max-heap; every field is compared with `other` before
/// `self` so that the smallest `(f, stop_id, arrival, ride_count,
/// accumulated_transfer)` tuple is the one popped first, matching the
/// tie-break order in §4.4.5.
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.stop_id.cmp(&self.stop_id))
            .then_with(|| other.arrival.cmp(&self.arrival))
            .then_with(|| other.ride_count.cmp(&self.ride_count))
            .then_with(|| other.accumulated_transfer.cmp(&self.accumulated_transfer))
    }
}

fn stop_latlon(conn: &Connection, stop_id: &str) -> Result<(f64, f64)> {
    conn.query_row(
        "SELECT stop_lat, stop_lon FROM stops WHERE stop_id = ?1",
        [stop_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => {
            PlannerError::Inconsistency(format!("stop {} referenced but not present", stop_id))
        }
        other => PlannerError::Sql(other),
    })
}

fn convenience_seconds(params: &SearchParams, ride_count: u32, accumulated_transfer_seconds: i64) -> f64 {
    let ride_term = ride_count as f64 * params.ride_penalty_seconds(ride_count);
    let transfer_term = accumulated_transfer_seconds as f64 * params.p_transfer_multiplier;
    ride_term + transfer_term
}

fn heuristic_seconds(
    conn: &Connection,
    params: &SearchParams,
    stop_id: &str,
    goal_lat: f64,
    goal_lon: f64,
    ride_count: u32,
    accumulated_transfer_seconds: i64,
) -> Result<f64> {
    let (lat, lon) = stop_latlon(conn, stop_id)?;
    let distance_km = haversine_meters(lat, lon, goal_lat, goal_lon) / 1000.0;
    let travel_seconds = distance_km / params.v_assumed_kmh * 3600.0;
    Ok(travel_seconds + convenience_seconds(params, ride_count, accumulated_transfer_seconds))
}

fn require_stop_exists(conn: &Connection, stop_id: &str) -> Result<()> {
    let exists: bool = conn
        .query_row("SELECT 1 FROM stops WHERE stop_id = ?1", [stop_id], |_| Ok(()))
        .map(|_| true)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(StoreError::from(other)),
        })?;
    if exists {
        Ok(())
    } else {
        Err(PlannerError::InvalidInput(format!("unknown stop id: {}", stop_id)))
    }
}

/// Walks `predecessor` from `goal_key` back to the origin (its own
/// predecessor) and reverses the result. Each node records the trip that
/// was *boarded to reach it*, so the origin node always carries `None`.
fn reconstruct(
    predecessor: &HashMap<(String, NaiveDateTime), (String, NaiveDateTime, Option<String>)>,
    goal_key: &(String, NaiveDateTime),
) -> Itinerary {
    let mut nodes = Vec::new();
    let mut current = goal_key.clone();
    loop {
        let (prev_stop, prev_arrival, trip_id) = predecessor
            .get(&current)
            .cloned()
            .expect("every visited state has a recorded predecessor");
        nodes.push(PathNode {
            stop_id: current.0.clone(),
            arrival: current.1,
            trip_id,
        });
        let prev_key = (prev_stop, prev_arrival);
        if prev_key == current {
            break;
        }
        current = prev_key;
    }
    nodes.reverse();
    Itinerary { path: nodes }
}

/// Runs the best-first search from `from_stop_id` to `to_stop_id` starting
/// at `departure_utc`. Returns `(None, elapsed_seconds)` for "no path" and
/// for a budget overrun — §7 treats both as an absence, not an error.
pub fn journey_search(
    store: &Store,
    from_stop_id: &str,
    to_stop_id: &str,
    departure_utc: NaiveDateTime,
    mode: Mode,
    max_execution_time_seconds: Option<u64>,
) -> Result<(Option<Itinerary>, f64)> {
    let started = Instant::now();
    let mut params = SearchParams::for_mode(mode);
    if let Some(budget) = max_execution_time_seconds {
        params.max_execution_time_seconds = budget;
    }

    let session = store.open_session();
    let conn = session.connection();
    require_stop_exists(conn, from_stop_id)?;
    require_stop_exists(conn, to_stop_id)?;

    if from_stop_id == to_stop_id {
        let itinerary = Itinerary {
            path: vec![PathNode {
                stop_id: from_stop_id.to_string(),
                arrival: departure_utc,
                trip_id: None,
            }],
        };
        return Ok((Some(itinerary), started.elapsed().as_secs_f64()));
    }

    let (goal_lat, goal_lon) = stop_latlon(conn, to_stop_id)?;
    let mut service_cache = ServiceValidityCache::new();

    let mut heap = BinaryHeap::new();
    let mut earliest_arrival: HashMap<String, NaiveDateTime> = HashMap::new();
    let mut best_cost: HashMap<String, f64> = HashMap::new();
    let mut predecessor: HashMap<(String, NaiveDateTime), (String, NaiveDateTime, Option<String>)> =
        HashMap::new();
    let mut visited: HashSet<(String, NaiveDateTime)> = HashSet::new();

    let origin_key = (from_stop_id.to_string(), departure_utc);
    predecessor.insert(origin_key.clone(), (from_stop_id.to_string(), departure_utc, None));
    earliest_arrival.insert(from_stop_id.to_string(), departure_utc);
    let h0 = heuristic_seconds(conn, &params, from_stop_id, goal_lat, goal_lon, 0, 0)?;
    best_cost.insert(from_stop_id.to_string(), h0);
    heap.push(QueueItem {
        f_cost: h0,
        stop_id: from_stop_id.to_string(),
        arrival: departure_utc,
        ride_count: 0,
        accumulated_transfer: 0,
    });

    let mut pops: u64 = 0;
    while let Some(item) = heap.pop() {
        pops += 1;
        if pops % 1000 == 0 && started.elapsed().as_secs() >= params.max_execution_time_seconds {
            return Ok((None, started.elapsed().as_secs_f64()));
        }

        let key = (item.stop_id.clone(), item.arrival);
        if visited.contains(&key) {
            continue;
        }
        if let Some(&recorded) = best_cost.get(&item.stop_id) {
            if item.f_cost > recorded {
                continue;
            }
        }
        visited.insert(key.clone());

        if item.stop_id == to_stop_id {
            return Ok((Some(reconstruct(&predecessor, &key)), started.elapsed().as_secs_f64()));
        }

        for ride in ride_neighbors(conn, &mut service_cache, &item.stop_id, item.arrival, params.search_window_seconds)? {
            let new_ride_count = item.ride_count + 1;
            if new_ride_count > params.max_rides + 1 {
                continue;
            }
            let improves = earliest_arrival
                .get(&ride.stop_id)
                .map(|&existing| ride.arrival < existing)
                .unwrap_or(true);
            if !improves {
                continue;
            }
            earliest_arrival.insert(ride.stop_id.clone(), ride.arrival);

            let g = (ride.arrival - departure_utc).num_seconds() as f64;
            let h = heuristic_seconds(
                conn,
                &params,
                &ride.stop_id,
                goal_lat,
                goal_lon,
                new_ride_count,
                item.accumulated_transfer,
            )?;
            let f = g + h;
            let better_cost = best_cost.get(&ride.stop_id).map(|&c| f < c).unwrap_or(true);
            if better_cost {
                best_cost.insert(ride.stop_id.clone(), f);
                predecessor.insert(
                    (ride.stop_id.clone(), ride.arrival),
                    (item.stop_id.clone(), item.arrival, Some(ride.trip_id.clone())),
                );
                heap.push(QueueItem {
                    f_cost: f,
                    stop_id: ride.stop_id,
                    arrival: ride.arrival,
                    ride_count: new_ride_count,
                    accumulated_transfer: item.accumulated_transfer,
                });
            }
        }

        for transfer in transfer_neighbors(conn, &item.stop_id, item.arrival)? {
            let new_accumulated = item.accumulated_transfer + transfer.duration_seconds;
            let improves = earliest_arrival
                .get(&transfer.stop_id)
                .map(|&existing| transfer.arrival < existing)
                .unwrap_or(true);
            if !improves {
                continue;
            }
            earliest_arrival.insert(transfer.stop_id.clone(), transfer.arrival);

            let g = (transfer.arrival - departure_utc).num_seconds() as f64;
            let h = heuristic_seconds(
                conn,
                &params,
                &transfer.stop_id,
                goal_lat,
                goal_lon,
                item.ride_count,
                new_accumulated,
            )?;
            let f = g + h;
            let better_cost = best_cost.get(&transfer.stop_id).map(|&c| f < c).unwrap_or(true);
            if better_cost {
                best_cost.insert(transfer.stop_id.clone(), f);
                predecessor.insert(
                    (transfer.stop_id.clone(), transfer.arrival),
                    (item.stop_id.clone(), item.arrival, None),
                );
                heap.push(QueueItem {
                    f_cost: f,
                    stop_id: transfer.stop_id,
                    arrival: transfer.arrival,
                    ride_count: item.ride_count,
                    accumulated_transfer: new_accumulated,
                });
            }
        }
    }

    Ok((None, started.elapsed().as_secs_f64()))
}
