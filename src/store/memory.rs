use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::driver::DriverPositionSnapshot;
use crate::models::location::{
    DeliveryLocation, DeliveryZone, Landmark, LandmarkMatch, LandmarkType, ZoneType,
};
use crate::store::{DriverPositionStore, LocationStore};

/// In-memory [`LocationStore`] used by the tests and by deployments that
/// load their reference data at startup. Does not implement the optional
/// server-side queries, so the resolver exercises its fallback paths.
#[derive(Default)]
pub struct InMemoryLocationStore {
    locations: DashMap<Uuid, DeliveryLocation>,
    landmarks: DashMap<Uuid, Landmark>,
    zones: DashMap<Uuid, DeliveryZone>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_location(&self, location: DeliveryLocation) {
        self.locations.insert(location.id, location);
    }

    pub fn insert_landmark(&self, landmark: Landmark) {
        self.landmarks.insert(landmark.id, landmark);
    }

    pub fn insert_zone(&self, zone: DeliveryZone) {
        self.zones.insert(zone.id, zone);
    }

    fn filtered_locations<F>(&self, limit: usize, keep: F) -> Vec<DeliveryLocation>
    where
        F: Fn(&DeliveryLocation) -> bool,
    {
        let mut matched: Vec<DeliveryLocation> = self
            .locations
            .iter()
            .filter(|entry| entry.value().is_active && keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; sort for a stable listing.
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        matched.truncate(limit);
        matched
    }

    fn joined_landmarks<F>(&self, limit: usize, keep: F) -> Vec<LandmarkMatch>
    where
        F: Fn(&Landmark) -> bool,
    {
        let mut matched: Vec<LandmarkMatch> = self
            .landmarks
            .iter()
            .filter(|entry| keep(entry.value()))
            .filter_map(|entry| {
                let landmark = entry.value();
                let owner = self.locations.get(&landmark.location_id)?;
                Some(LandmarkMatch {
                    landmark: landmark.clone(),
                    location_name: owner.name.clone(),
                    location_district: owner.district.clone(),
                })
            })
            .collect();
        matched.sort_by(|a, b| a.landmark.name.cmp(&b.landmark.name));
        matched.truncate(limit);
        matched
    }
}

impl LocationStore for InMemoryLocationStore {
    async fn search_locations(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<DeliveryLocation>, StoreError> {
        let needle = text.to_lowercase();
        Ok(self.filtered_locations(limit, |location| {
            location.name.to_lowercase().contains(&needle)
                || location.district.to_lowercase().contains(&needle)
        }))
    }

    async fn locations_by_district(
        &self,
        district: &str,
        limit: usize,
    ) -> Result<Vec<DeliveryLocation>, StoreError> {
        Ok(self.filtered_locations(limit, |location| {
            location.district.eq_ignore_ascii_case(district)
        }))
    }

    async fn locations_by_zone_type(
        &self,
        zone_type: ZoneType,
        limit: usize,
    ) -> Result<Vec<DeliveryLocation>, StoreError> {
        Ok(self.filtered_locations(limit, |location| location.zone_type == zone_type))
    }

    async fn active_locations(&self, cap: usize) -> Result<Vec<DeliveryLocation>, StoreError> {
        Ok(self.filtered_locations(cap, |_| true))
    }

    async fn search_landmarks(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<LandmarkMatch>, StoreError> {
        let needle = text.to_lowercase();
        Ok(self.joined_landmarks(limit, |landmark| {
            landmark.name.to_lowercase().contains(&needle)
        }))
    }

    async fn landmarks_by_type(
        &self,
        landmark_type: LandmarkType,
        limit: usize,
    ) -> Result<Vec<LandmarkMatch>, StoreError> {
        Ok(self.joined_landmarks(limit, |landmark| landmark.landmark_type == landmark_type))
    }

    async fn active_zones(&self) -> Result<Vec<DeliveryZone>, StoreError> {
        let mut zones: Vec<DeliveryZone> = self
            .zones
            .iter()
            .filter(|entry| entry.value().is_active)
            .map(|entry| entry.value().clone())
            .collect();
        // Base fee first; name as a deterministic tie-break.
        zones.sort_by(|a, b| a.base_fee.cmp(&b.base_fee).then_with(|| a.name.cmp(&b.name)));
        Ok(zones)
    }

    async fn count_locations(&self) -> Result<u64, StoreError> {
        Ok(self.locations.len() as u64)
    }

    async fn count_landmarks(&self) -> Result<u64, StoreError> {
        Ok(self.landmarks.len() as u64)
    }

    async fn count_zones(&self) -> Result<u64, StoreError> {
        Ok(self.zones.len() as u64)
    }
}

/// In-memory [`DriverPositionStore`].
#[derive(Default)]
pub struct InMemoryDriverStore {
    drivers: DashMap<Uuid, DriverPositionSnapshot>,
}

impl InMemoryDriverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_driver(&self, driver: DriverPositionSnapshot) {
        self.drivers.insert(driver.driver_id, driver);
    }

    pub fn remove_driver(&self, driver_id: Uuid) {
        self.drivers.remove(&driver_id);
    }
}

impl DriverPositionStore for InMemoryDriverStore {
    async fn active_drivers_with_position(
        &self,
    ) -> Result<Vec<DriverPositionSnapshot>, StoreError> {
        let mut drivers: Vec<DriverPositionSnapshot> = self
            .drivers
            .iter()
            .filter(|entry| entry.value().is_active && entry.value().position.is_some())
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    async fn driver_by_id(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<DriverPositionSnapshot>, StoreError> {
        Ok(self.drivers.get(&driver_id).map(|entry| entry.value().clone()))
    }
}
