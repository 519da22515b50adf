//! GTFS entity records.
//!
//! Every identifier is a `String` carrying the `"{feed_index:02}/{raw_id}"`
//! namespace prefix applied by the ingestor (see `gtfs_ingest::prefix_id`).
//! Fields beyond those the Planner actually reads are kept `Option` so the
//! store's wide, permissive column set (anything a real-world feed throws
//! at it) has somewhere to land without the Planner needing to know about it.

#[derive(Debug, Clone, PartialEq)]
pub struct Agency {
    pub agency_id: String,
    pub agency_name: String,
    pub agency_url: String,
    pub agency_timezone: String,
    pub agency_lang: Option<String>,
    pub agency_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub stop_code: Option<String>,
    pub zone_id: Option<String>,
    pub parent_station: Option<String>,
    pub location_type: Option<i64>,
    pub wheelchair_boarding: Option<i64>,
    pub platform_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: String,
    pub agency_id: Option<String>,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i64,
    pub route_color: Option<String>,
    pub route_text_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub trip_headsign: Option<String>,
    pub trip_short_name: Option<String>,
    pub direction_id: Option<i64>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Option<i64>,
    pub bikes_allowed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: i64,
    pub stop_headsign: Option<String>,
    pub pickup_type: Option<i64>,
    pub drop_off_type: Option<i64>,
    pub shape_dist_traveled: Option<f64>,
}

/// Base weekly service pattern. `monday..sunday` are `1` if the service
/// runs that weekday within `[start_date, end_date]`, else `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRule {
    pub service_id: String,
    pub monday: i64,
    pub tuesday: i64,
    pub wednesday: i64,
    pub thursday: i64,
    pub friday: i64,
    pub saturday: i64,
    pub sunday: i64,
    pub start_date: String,
    pub end_date: String,
}

impl CalendarRule {
    /// `weekday` per `chrono::Weekday::num_days_from_monday()` (0 = Monday).
    pub fn runs_on_weekday(&self, weekday: u32) -> bool {
        let flag = match weekday {
            0 => self.monday,
            1 => self.tuesday,
            2 => self.wednesday,
            3 => self.thursday,
            4 => self.friday,
            5 => self.saturday,
            _ => self.sunday,
        };
        flag != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarException {
    Added,
    Removed,
}

impl CalendarException {
    pub fn from_exception_type(exception_type: i64) -> Option<CalendarException> {
        match exception_type {
            1 => Some(CalendarException::Added),
            2 => Some(CalendarException::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_type: i64,
    pub min_transfer_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedInfo {
    pub feed_publisher_name: Option<String>,
    pub feed_publisher_url: Option<String>,
    pub feed_lang: Option<String>,
    pub feed_version: Option<String>,
}
