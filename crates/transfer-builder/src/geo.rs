/// Great-circle distance on a sphere of radius 6371 km.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Local bounding-box half-widths (in degrees) for a square of the given
/// half-side length in metres, centred on `lat`.
pub fn bbox_delta(lat: f64, distance_m: f64) -> (f64, f64) {
    let delta_lat = distance_m / 111_320.0;
    let delta_lon = distance_m / (40_075_000.0 * (lat.to_radians().cos()) / 360.0);
    (delta_lat, delta_lon)
}
