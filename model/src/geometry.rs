use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A position in degrees, WGS84.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in km, assuming a spherical Earth.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Parses "7+500" or "7.5" into km. Anything unparseable is 0. Results are not clamped
/// to the route; that's the caller's job.
pub fn parse_chainage(input: &str) -> f64 {
    let input = input.trim();
    if let Some((km, meters)) = input.split_once('+') {
        let km: f64 = km.trim().parse().unwrap_or(0.0);
        let meters: f64 = meters.trim().parse().unwrap_or(0.0);
        km + meters / 1000.0
    } else {
        input.parse().unwrap_or(0.0)
    }
}

/// 7.5 -> "7+500". Meters are rounded and carry into the next km rather than ever
/// printing "+1000".
pub fn format_chainage(km: f64) -> String {
    let mut whole = km.floor() as i64;
    let mut meters = ((km - km.floor()) * 1000.0).round() as i64;
    if meters == 1000 {
        whole += 1;
        meters = 0;
    }
    format!("{}+{:03}", whole, meters)
}

/// Axis-aligned bounding box in degrees.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn new() -> Self {
        Self {
            min_lat: f64::MAX,
            max_lat: f64::MIN,
            min_lon: f64::MAX,
            max_lon: f64::MIN,
        }
    }

    pub fn update(&mut self, pt: GeoPoint) {
        self.min_lat = self.min_lat.min(pt.lat);
        self.max_lat = self.max_lat.max(pt.lat);
        self.min_lon = self.min_lon.min(pt.lon);
        self.max_lon = self.max_lon.max(pt.lon);
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Spans are floored at 0.001 degrees, so normalizing a single point or a perfectly
    /// straight north-south line never divides by zero.
    pub fn lat_span(&self) -> f64 {
        (self.max_lat - self.min_lat).max(0.001)
    }

    pub fn lon_span(&self) -> f64 {
        (self.max_lon - self.min_lon).max(0.001)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::new()
    }
}
