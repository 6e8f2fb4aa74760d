use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

/// Last-known state of a driver's position.
///
/// The tracking aggregator caches one snapshot per driver for change
/// detection; subscribers always receive owned copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPositionSnapshot {
    pub driver_id: Uuid,
    pub name: String,
    pub position: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
    pub is_available: bool,
    pub is_active: bool,
}
