use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

/// One entry of a nearest-location ranking. Built per query, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestLocationResult {
    pub location_id: Uuid,
    pub name: String,
    pub district: String,
    pub distance_km: f64,
    pub fee: i64,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryFeeResult {
    pub zone_name: String,
    pub fee: i64,
    pub estimated_minutes: u32,
    /// Distance the zone decision was based on.
    pub distance_km: f64,
}

/// Where a search result came from. External results are enrichment
/// only and are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultProvenance {
    Local,
    ExternalGeocoder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalGeocodeResult {
    pub name: String,
    pub address: String,
    pub position: GeoPoint,
    pub category: String,
    pub source: ResultProvenance,
}
