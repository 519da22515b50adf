/// Describes how one GTFS CSV file maps onto one store table.
///
/// `columns` is the full set of columns the schema is willing to accept for
/// this table, in no particular order — a feed's header is intersected
/// against this list so only recognised columns are ever bound, which is
/// the "statically validated column list" called for in place of fully
/// dynamic attribute access.
pub struct TableSpec {
    pub filename: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        filename: "agency.txt",
        table: "agency",
        columns: &[
            "agency_id",
            "agency_name",
            "agency_url",
            "agency_timezone",
            "agency_lang",
            "agency_phone",
        ],
    },
    TableSpec {
        filename: "stops.txt",
        table: "stops",
        columns: &[
            "stop_id",
            "stop_name",
            "stop_lat",
            "stop_lon",
            "stop_code",
            "zone_id",
            "parent_station",
            "location_type",
            "wheelchair_boarding",
            "platform_code",
        ],
    },
    TableSpec {
        filename: "routes.txt",
        table: "routes",
        columns: &[
            "route_id",
            "agency_id",
            "route_short_name",
            "route_long_name",
            "route_type",
            "route_color",
            "route_text_color",
        ],
    },
    TableSpec {
        filename: "trips.txt",
        table: "trips",
        columns: &[
            "trip_id",
            "route_id",
            "service_id",
            "trip_headsign",
            "trip_short_name",
            "direction_id",
            "block_id",
            "shape_id",
            "wheelchair_accessible",
            "bikes_allowed",
        ],
    },
    TableSpec {
        filename: "stop_times.txt",
        table: "stop_times",
        columns: &[
            "trip_id",
            "arrival_time",
            "departure_time",
            "stop_id",
            "stop_sequence",
            "stop_headsign",
            "pickup_type",
            "drop_off_type",
            "shape_dist_traveled",
        ],
    },
    TableSpec {
        filename: "calendar.txt",
        table: "calendar",
        columns: &[
            "service_id",
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
            "start_date",
            "end_date",
        ],
    },
    TableSpec {
        filename: "calendar_dates.txt",
        table: "calendar_dates",
        columns: &["service_id", "date", "exception_type"],
    },
    TableSpec {
        filename: "shapes.txt",
        table: "shapes",
        columns: &[
            "shape_id",
            "shape_pt_lat",
            "shape_pt_lon",
            "shape_pt_sequence",
        ],
    },
    TableSpec {
        filename: "transfers.txt",
        table: "transfers",
        columns: &[
            "from_stop_id",
            "to_stop_id",
            "transfer_type",
            "min_transfer_time",
        ],
    },
    TableSpec {
        filename: "feed_info.txt",
        table: "feed_info",
        columns: &[
            "feed_publisher_name",
            "feed_publisher_url",
            "feed_lang",
            "feed_version",
        ],
    },
];
