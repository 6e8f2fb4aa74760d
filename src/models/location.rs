use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneType {
    Commercial,
    Residential,
    Industrial,
    Village,
    PublicPlace,
    Neighborhood,
}

/// A named, geocoded reference point in the coverage area used for
/// fee and ETA lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub id: Uuid,
    pub name: String,
    pub district: String,
    pub zone_type: ZoneType,
    pub position: GeoPoint,
    pub postal_code: Option<String>,
    /// Delivery fee in currency minor units.
    pub delivery_fee: i64,
    pub estimated_minutes: u32,
    pub is_active: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandmarkType {
    Restaurant,
    Hotel,
    Bank,
    Pharmacy,
    Hospital,
    School,
    Church,
    Mosque,
    Market,
    FuelStation,
    Office,
    Other,
}

/// A point of interest attached to a delivery location, used to help
/// customers describe a drop-off point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub id: Uuid,
    pub name: String,
    pub landmark_type: LandmarkType,
    pub address: Option<String>,
    pub position: GeoPoint,
    pub location_id: Uuid,
    pub description: Option<String>,
}

/// A landmark joined to its owning location's name and district.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkMatch {
    pub landmark: Landmark,
    pub location_name: String,
    pub location_district: String,
}

/// A fee/ETA tier keyed by a maximum distance radius from a reference
/// point. Active zones are evaluated in ascending base-fee order; the
/// first zone whose radius covers the distance wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: Uuid,
    pub name: String,
    pub base_fee: i64,
    pub max_distance_km: f64,
    pub estimated_minutes: u32,
    pub color: String,
    pub is_active: bool,
}
