use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Average courier speed assumed when estimating travel time.
const AVERAGE_SPEED_KMH: f64 = 30.0;
/// Fixed pickup/handover overhead in minutes.
const HANDLING_MINUTES: u32 = 10;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Rough door-to-door travel time for a given great-circle distance.
pub fn estimate_travel_minutes(distance_km: f64) -> u32 {
    let riding = (distance_km.max(0.0) / AVERAGE_SPEED_KMH) * 60.0;
    HANDLING_MINUTES + riding.ceil() as u32
}

/// The fixed bounding box the service operates in. Used to bound
/// external search requests and to validate any coordinate-bearing
/// result before it is surfaced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OperatingRegion {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl OperatingRegion {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lng >= self.min_lng
            && point.lng <= self.max_lng
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    /// Provider `viewbox` parameter: `min-lon,min-lat,max-lon,max-lat`.
    pub fn viewbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}
