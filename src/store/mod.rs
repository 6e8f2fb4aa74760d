pub mod memory;

use std::future::Future;

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::GeoPoint;
use crate::models::driver::DriverPositionSnapshot;
use crate::models::location::{
    DeliveryLocation, DeliveryZone, LandmarkMatch, LandmarkType, ZoneType,
};
use crate::models::results::{DeliveryFeeResult, NearestLocationResult};

/// Read access to persisted delivery locations, landmarks and zones.
///
/// Implemented by the surrounding application over whatever storage it
/// owns. The nearest-neighbor and fee queries are optional server-side
/// helpers: the default bodies report [`StoreError::Unsupported`], which
/// makes the resolver take its documented in-memory fallback.
pub trait LocationStore: Send + Sync {
    fn search_locations(
        &self,
        text: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DeliveryLocation>, StoreError>> + Send;

    fn locations_by_district(
        &self,
        district: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DeliveryLocation>, StoreError>> + Send;

    fn locations_by_zone_type(
        &self,
        zone_type: ZoneType,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DeliveryLocation>, StoreError>> + Send;

    /// Bulk fetch of active locations, capped by the caller.
    fn active_locations(
        &self,
        cap: usize,
    ) -> impl Future<Output = Result<Vec<DeliveryLocation>, StoreError>> + Send;

    fn search_landmarks(
        &self,
        text: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LandmarkMatch>, StoreError>> + Send;

    fn landmarks_by_type(
        &self,
        landmark_type: LandmarkType,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LandmarkMatch>, StoreError>> + Send;

    /// Active zones in ascending base-fee order.
    fn active_zones(&self)
    -> impl Future<Output = Result<Vec<DeliveryZone>, StoreError>> + Send;

    fn count_locations(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn count_landmarks(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn count_zones(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Optional server-side nearest-neighbor query.
    fn nearest_locations(
        &self,
        point: &GeoPoint,
        max_distance_km: f64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<NearestLocationResult>, StoreError>> + Send {
        let _ = (point, max_distance_km, limit);
        async { Err(StoreError::Unsupported("nearest_locations")) }
    }

    /// Optional server-side fee query.
    fn delivery_fee(
        &self,
        point: &GeoPoint,
    ) -> impl Future<Output = Result<DeliveryFeeResult, StoreError>> + Send {
        let _ = point;
        async { Err(StoreError::Unsupported("delivery_fee")) }
    }
}

/// Read access to driver positions.
pub trait DriverPositionStore: Send + Sync {
    /// Active drivers that have a known last position.
    fn active_drivers_with_position(
        &self,
    ) -> impl Future<Output = Result<Vec<DriverPositionSnapshot>, StoreError>> + Send;

    fn driver_by_id(
        &self,
        driver_id: Uuid,
    ) -> impl Future<Output = Result<Option<DriverPositionSnapshot>, StoreError>> + Send;
}
