//! Step hydration (§4.4.6): turning a bare path of `(stop, arrival, trip?)`
//! triples into steps a caller can actually render — route names, agency,
//! headsign, and the stop-sequence span geometry needs.

use chrono::NaiveDateTime;
use gtfs_store::{Session, Stop};

use crate::error::{PlannerError, Result};
use crate::search::PathNode;
use crate::time::parse_gtfs_time;

#[derive(Debug, Clone, PartialEq)]
pub enum JourneyStep {
    Ride(RideStep),
    Transfer(TransferStep),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RideStep {
    pub trip_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub trip_headsign: Option<String>,
    pub agency_name: Option<String>,
    pub from_stop_id: String,
    pub from_stop_name: String,
    pub to_stop_id: String,
    pub to_stop_name: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub from_sequence: i64,
    pub to_sequence: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferStep {
    pub from_stop_id: String,
    pub from_stop_name: String,
    pub to_stop_id: String,
    pub to_stop_name: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
}

impl JourneyStep {
    fn from_name(&self) -> &str {
        match self {
            JourneyStep::Ride(r) => &r.from_stop_name,
            JourneyStep::Transfer(t) => &t.from_stop_name,
        }
    }

    fn to_name(&self) -> &str {
        match self {
            JourneyStep::Ride(r) => &r.to_stop_name,
            JourneyStep::Transfer(t) => &t.to_stop_name,
        }
    }

    fn is_degenerate(&self) -> bool {
        self.from_name() == self.to_name()
    }
}

fn hydrate_ride(
    session: &Session,
    from: &Stop,
    board_reference: NaiveDateTime,
    to_stop_id: &str,
    arrival: NaiveDateTime,
    trip_id: &str,
) -> Result<RideStep> {
    let to = session.get_stop(to_stop_id)?;
    let trip = session.get_trip(trip_id)?;
    let route = session.get_route(&trip.route_id)?;
    let agency_name = match &route.agency_id {
        Some(agency_id) => session.get_agency(agency_id).ok().map(|a| a.agency_name),
        None => None,
    };
    let (from_sequence, to_sequence) = session.get_stop_sequences(trip_id, &from.stop_id, to_stop_id)?;

    // The reference day for this trip's times is the boarding state's date
    // (the search's `service_date`, §4.4.2), not the alighting date: an
    // overnight trip's arrival can already have rolled onto the next day.
    let departure_raw = departure_time_at(session, trip_id, from_sequence)?;
    let departure = parse_gtfs_time(board_reference.date(), &departure_raw).ok_or_else(|| {
        PlannerError::Inconsistency(format!("unparsable departure_time on trip {}", trip_id))
    })?;

    Ok(RideStep {
        trip_id: trip_id.to_string(),
        route_short_name: route.route_short_name,
        route_long_name: route.route_long_name,
        trip_headsign: trip.trip_headsign,
        agency_name,
        from_stop_id: from.stop_id.clone(),
        from_stop_name: from.stop_name.clone(),
        to_stop_id: to.stop_id,
        to_stop_name: to.stop_name,
        departure,
        arrival,
        from_sequence,
        to_sequence,
    })
}

fn departure_time_at(session: &Session, trip_id: &str, sequence: i64) -> Result<String> {
    session
        .connection()
        .query_row(
            "SELECT departure_time FROM stop_times WHERE trip_id = ?1 AND stop_sequence = ?2",
            rusqlite::params![trip_id, sequence],
            |row| row.get(0),
        )
        .map_err(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => PlannerError::Inconsistency(format!(
                "trip {} has no stop_times row at sequence {}",
                trip_id, sequence
            )),
            other => PlannerError::Sql(other),
        })
}

/// Hydrates a reconstructed path into display-ready steps, then drops any
/// leading/trailing steps whose endpoints share a display name — different
/// feeds often mint separate ids for what is physically one station.
pub fn hydrate(session: &Session, path: &[PathNode]) -> Result<Vec<JourneyStep>> {
    let mut steps = Vec::new();
    for window in path.windows(2) {
        let (prev, curr) = (&window[0], &window[1]);
        let from = session.get_stop(&prev.stop_id)?;
        let step = match &curr.trip_id {
            Some(trip_id) => JourneyStep::Ride(hydrate_ride(
                session,
                &from,
                prev.arrival,
                &curr.stop_id,
                curr.arrival,
                trip_id,
            )?),
            None => {
                let to = session.get_stop(&curr.stop_id)?;
                JourneyStep::Transfer(TransferStep {
                    from_stop_id: from.stop_id,
                    from_stop_name: from.stop_name,
                    to_stop_id: to.stop_id,
                    to_stop_name: to.stop_name,
                    departure: prev.arrival,
                    arrival: curr.arrival,
                })
            }
        };
        steps.push(step);
    }

    while steps.first().map(JourneyStep::is_degenerate).unwrap_or(false) {
        steps.remove(0);
    }
    while steps.last().map(JourneyStep::is_degenerate).unwrap_or(false) {
        steps.pop();
    }
    Ok(steps)
}
