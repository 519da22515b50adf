use rusqlite::Connection;

use crate::error::Result;

/// Creates every table and index the store needs, idempotently.
///
/// Table shapes follow the original GTFS importer's `create_gtfs_tables`
/// (a permissive, wide column set with only the join keys as `NOT NULL`);
/// the index list additionally carries the three indices that importer
/// never created (`stop_times(trip_id, stop_sequence)`,
/// `stop_times(stop_sequence)`, `calendar(start_date, end_date)`) plus the
/// stop spatial index table used by the transfer builder.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS agency (
            agency_id TEXT PRIMARY KEY,
            agency_name TEXT NOT NULL,
            agency_url TEXT,
            agency_timezone TEXT,
            agency_lang TEXT,
            agency_phone TEXT
        );

        CREATE TABLE IF NOT EXISTS stops (
            stop_id TEXT PRIMARY KEY,
            stop_name TEXT NOT NULL,
            stop_lat REAL NOT NULL,
            stop_lon REAL NOT NULL,
            stop_code TEXT,
            zone_id TEXT,
            parent_station TEXT,
            location_type INTEGER,
            wheelchair_boarding INTEGER,
            platform_code TEXT,
            stop_idx INTEGER
        );

        CREATE TABLE IF NOT EXISTS routes (
            route_id TEXT PRIMARY KEY,
            agency_id TEXT,
            route_short_name TEXT,
            route_long_name TEXT,
            route_type INTEGER NOT NULL,
            route_color TEXT,
            route_text_color TEXT
        );

        CREATE TABLE IF NOT EXISTS trips (
            trip_id TEXT PRIMARY KEY,
            route_id TEXT NOT NULL,
            service_id TEXT NOT NULL,
            trip_headsign TEXT,
            trip_short_name TEXT,
            direction_id INTEGER,
            block_id TEXT,
            shape_id TEXT,
            wheelchair_accessible INTEGER,
            bikes_allowed INTEGER
        );

        CREATE TABLE IF NOT EXISTS stop_times (
            trip_id TEXT NOT NULL,
            arrival_time TEXT NOT NULL,
            departure_time TEXT NOT NULL,
            stop_id TEXT NOT NULL,
            stop_sequence INTEGER NOT NULL,
            stop_headsign TEXT,
            pickup_type INTEGER,
            drop_off_type INTEGER,
            shape_dist_traveled REAL,
            PRIMARY KEY (trip_id, stop_id, stop_sequence)
        );

        CREATE TABLE IF NOT EXISTS calendar (
            service_id TEXT PRIMARY KEY,
            monday INTEGER NOT NULL,
            tuesday INTEGER NOT NULL,
            wednesday INTEGER NOT NULL,
            thursday INTEGER NOT NULL,
            friday INTEGER NOT NULL,
            saturday INTEGER NOT NULL,
            sunday INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS calendar_dates (
            service_id TEXT NOT NULL,
            date TEXT NOT NULL,
            exception_type INTEGER NOT NULL,
            PRIMARY KEY (service_id, date)
        );

        CREATE TABLE IF NOT EXISTS shapes (
            shape_id TEXT NOT NULL,
            shape_pt_lat REAL NOT NULL,
            shape_pt_lon REAL NOT NULL,
            shape_pt_sequence INTEGER NOT NULL,
            PRIMARY KEY (shape_id, shape_pt_sequence)
        );

        CREATE TABLE IF NOT EXISTS transfers (
            from_stop_id TEXT NOT NULL,
            to_stop_id TEXT NOT NULL,
            transfer_type INTEGER NOT NULL,
            min_transfer_time INTEGER,
            PRIMARY KEY (from_stop_id, to_stop_id)
        );

        CREATE TABLE IF NOT EXISTS feed_info (
            feed_publisher_name TEXT,
            feed_publisher_url TEXT,
            feed_lang TEXT,
            feed_version TEXT
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS stop_index USING rtree(
            id, min_lat, max_lat, min_lon, max_lon
        );

        CREATE INDEX IF NOT EXISTS idx_stop_times_stop_id_arrival ON stop_times(stop_id, arrival_time);
        CREATE INDEX IF NOT EXISTS idx_stop_times_trip_id_sequence ON stop_times(trip_id, stop_sequence);
        CREATE INDEX IF NOT EXISTS idx_stop_times_sequence ON stop_times(stop_sequence);
        CREATE INDEX IF NOT EXISTS idx_trips_service_id ON trips(service_id);
        CREATE INDEX IF NOT EXISTS idx_trips_route_id ON trips(route_id);
        CREATE INDEX IF NOT EXISTS idx_routes_agency_id ON routes(agency_id);
        CREATE INDEX IF NOT EXISTS idx_calendar_service_id ON calendar(service_id);
        CREATE INDEX IF NOT EXISTS idx_calendar_dates_range ON calendar(start_date, end_date);
        CREATE INDEX IF NOT EXISTS idx_calendar_dates_service_date ON calendar_dates(service_id, date);
        CREATE INDEX IF NOT EXISTS idx_calendar_dates_date_exception ON calendar_dates(date, exception_type);
        CREATE INDEX IF NOT EXISTS idx_stops_stop_name ON stops(stop_name);
        CREATE INDEX IF NOT EXISTS idx_stops_lat_lon ON stops(stop_lat, stop_lon);
        CREATE INDEX IF NOT EXISTS idx_transfers_from_stop_id ON transfers(from_stop_id);
        CREATE INDEX IF NOT EXISTS idx_transfers_to_stop_id ON transfers(to_stop_id);
        CREATE INDEX IF NOT EXISTS idx_shapes_shape_id ON shapes(shape_id);
        ",
    )?;
    Ok(())
}

/// Deletes all persistent state but keeps the schema, so `ensure_schema`
/// after a `reset` is always a no-op in terms of structure.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS agency;
        DROP TABLE IF EXISTS stops;
        DROP TABLE IF EXISTS routes;
        DROP TABLE IF EXISTS trips;
        DROP TABLE IF EXISTS stop_times;
        DROP TABLE IF EXISTS calendar;
        DROP TABLE IF EXISTS calendar_dates;
        DROP TABLE IF EXISTS shapes;
        DROP TABLE IF EXISTS transfers;
        DROP TABLE IF EXISTS feed_info;
        DROP TABLE IF EXISTS metadata;
        DROP TABLE IF EXISTS stop_index;
        ",
    )?;
    Ok(())
}
