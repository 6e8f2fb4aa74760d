use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::geo::haversine_km;
use crate::geocoding::{GeocodingClient, SearchOptions, to_external_result};
use crate::models::GeoPoint;
use crate::models::location::{DeliveryLocation, LandmarkMatch, LandmarkType, ZoneType};
use crate::models::results::{DeliveryFeeResult, ExternalGeocodeResult, NearestLocationResult};
use crate::observability::metrics::Metrics;
use crate::store::LocationStore;

/// Cap on the bulk fetch used when ranking locations without a
/// server-side nearest-neighbor query.
const FALLBACK_LOCATION_CAP: usize = 100;
/// Radius searched for a reference location when deciding a fee.
const FEE_SEARCH_RADIUS_KM: f64 = 5.0;

/// Local and external search results, kept as separate labeled groups.
/// Presentation order is the caller's decision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SmartSearchResults {
    pub locations: Vec<DeliveryLocation>,
    pub landmarks: Vec<LandmarkMatch>,
    pub external: Vec<ExternalGeocodeResult>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationStats {
    pub locations: u64,
    pub landmarks: u64,
    pub zones: u64,
}

/// Answers "what is near this point" and "what does delivery cost here"
/// from local reference data, with external geocoding as enrichment and
/// a deterministic in-memory path when a server-side query is missing.
///
/// Every store or provider failure degrades to an empty result. Placing
/// an order must never fail because this enrichment did.
pub struct LocationResolver<S> {
    store: Arc<S>,
    geocoder: Arc<GeocodingClient>,
    config: Config,
    metrics: Metrics,
}

impl<S: LocationStore> LocationResolver<S> {
    pub fn new(
        store: Arc<S>,
        geocoder: Arc<GeocodingClient>,
        config: Config,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            geocoder,
            config,
            metrics,
        }
    }

    pub async fn search_locations(&self, text: &str, limit: usize) -> Vec<DeliveryLocation> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.store
            .search_locations(text, limit)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "location search failed");
                Vec::new()
            })
    }

    pub async fn search_landmarks(&self, text: &str, limit: usize) -> Vec<LandmarkMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.store
            .search_landmarks(text, limit)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "landmark search failed");
                Vec::new()
            })
    }

    pub async fn by_district(&self, district: &str, limit: usize) -> Vec<DeliveryLocation> {
        self.store
            .locations_by_district(district, limit)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, district, "district listing failed");
                Vec::new()
            })
    }

    pub async fn by_zone_type(&self, zone_type: ZoneType, limit: usize) -> Vec<DeliveryLocation> {
        self.store
            .locations_by_zone_type(zone_type, limit)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "zone type listing failed");
                Vec::new()
            })
    }

    pub async fn landmarks_by_type(
        &self,
        landmark_type: LandmarkType,
        limit: usize,
    ) -> Vec<LandmarkMatch> {
        self.store
            .landmarks_by_type(landmark_type, limit)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "landmark type listing failed");
                Vec::new()
            })
    }

    /// Nearest known locations to a point, closest first.
    ///
    /// Delegates to the store's nearest-neighbor query when it has one;
    /// otherwise ranks up to [`FALLBACK_LOCATION_CAP`] active locations
    /// by great-circle distance locally. Both paths produce the same
    /// ranking for the same data.
    pub async fn find_nearest_locations(
        &self,
        point: &GeoPoint,
        max_distance_km: f64,
        limit: usize,
    ) -> Vec<NearestLocationResult> {
        match self.store.nearest_locations(point, max_distance_km, limit).await {
            Ok(results) => results,
            Err(StoreError::Unsupported(query)) => {
                debug!(query, "server-side nearest query unavailable; ranking locally");
                self.record_fallback("nearest_locations");
                self.rank_nearest(point, max_distance_km, limit).await
            }
            Err(err) => {
                warn!(error = %err, "server-side nearest query failed; ranking locally");
                self.record_fallback("nearest_locations");
                self.rank_nearest(point, max_distance_km, limit).await
            }
        }
    }

    async fn rank_nearest(
        &self,
        point: &GeoPoint,
        max_distance_km: f64,
        limit: usize,
    ) -> Vec<NearestLocationResult> {
        let locations = match self.store.active_locations(FALLBACK_LOCATION_CAP).await {
            Ok(locations) => locations,
            Err(err) => {
                warn!(error = %err, "active location fetch failed");
                return Vec::new();
            }
        };

        let mut ranked: Vec<NearestLocationResult> = locations
            .into_iter()
            .map(|location| {
                let distance_km = haversine_km(point, &location.position);
                NearestLocationResult {
                    location_id: location.id,
                    name: location.name,
                    district: location.district,
                    distance_km,
                    fee: location.delivery_fee,
                    estimated_minutes: location.estimated_minutes,
                }
            })
            .filter(|result| result.distance_km <= max_distance_km)
            .collect();

        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        ranked.truncate(limit);
        ranked
    }

    /// Fee and ETA applicable at a point.
    pub async fn delivery_fee(&self, point: &GeoPoint) -> DeliveryFeeResult {
        match self.store.delivery_fee(point).await {
            Ok(result) => result,
            Err(StoreError::Unsupported(query)) => {
                debug!(query, "server-side fee query unavailable; deciding locally");
                self.record_fallback("delivery_fee");
                self.decide_fee(point).await
            }
            Err(err) => {
                warn!(error = %err, "server-side fee query failed; deciding locally");
                self.record_fallback("delivery_fee");
                self.decide_fee(point).await
            }
        }
    }

    async fn decide_fee(&self, point: &GeoPoint) -> DeliveryFeeResult {
        let zones = self.store.active_zones().await.unwrap_or_else(|err| {
            warn!(error = %err, "zone fetch failed");
            Vec::new()
        });

        // No zones configured at all: the operating default applies.
        let Some(cheapest) = zones.first() else {
            return DeliveryFeeResult {
                zone_name: self.config.default_zone_name.clone(),
                fee: self.config.default_fee,
                estimated_minutes: self.config.default_eta_minutes,
                distance_km: 0.0,
            };
        };

        let nearest = self
            .find_nearest_locations(point, FEE_SEARCH_RADIUS_KM, 1)
            .await;

        let Some(nearest) = nearest.first() else {
            // Nothing known nearby: charge the cheapest tier.
            return DeliveryFeeResult {
                zone_name: cheapest.name.clone(),
                fee: cheapest.base_fee,
                estimated_minutes: cheapest.estimated_minutes,
                distance_km: 0.0,
            };
        };

        let zone = zones
            .iter()
            .find(|zone| zone.max_distance_km >= nearest.distance_km)
            .unwrap_or(cheapest);

        DeliveryFeeResult {
            zone_name: zone.name.clone(),
            fee: zone.base_fee,
            estimated_minutes: zone.estimated_minutes,
            distance_km: nearest.distance_km,
        }
    }

    /// One query against local reference data and the external provider
    /// at the same time. External hits outside the operating region are
    /// discarded before they reach the caller.
    pub async fn smart_search(&self, query: &str, limit: usize) -> SmartSearchResults {
        if query.trim().is_empty() {
            return SmartSearchResults::default();
        }

        let local_cap = (limit / 2).max(1);
        let options = SearchOptions {
            limit,
            viewbox: Some(self.config.region),
            bounded: true,
            ..SearchOptions::default()
        };

        let (locations, landmarks, places) = futures::join!(
            self.search_locations(query, local_cap),
            self.search_landmarks(query, local_cap),
            self.geocoder.search(query, &options),
        );

        let external = places
            .iter()
            .filter(|place| self.config.region.contains(&place.position))
            .map(to_external_result)
            .collect();

        SmartSearchResults {
            locations,
            landmarks,
            external,
        }
    }

    pub fn is_valid_gps_coordinates(&self, lat: f64, lng: f64) -> bool {
        self.config.region.contains(&GeoPoint { lat, lng })
    }

    /// Aggregate catalog counts, read concurrently.
    pub async fn location_stats(&self) -> LocationStats {
        let (locations, landmarks, zones) = futures::join!(
            self.store.count_locations(),
            self.store.count_landmarks(),
            self.store.count_zones(),
        );

        LocationStats {
            locations: locations.unwrap_or_else(|err| {
                warn!(error = %err, "location count failed");
                0
            }),
            landmarks: landmarks.unwrap_or_else(|err| {
                warn!(error = %err, "landmark count failed");
                0
            }),
            zones: zones.unwrap_or_else(|err| {
                warn!(error = %err, "zone count failed");
                0
            }),
        }
    }

    fn record_fallback(&self, operation: &str) {
        self.metrics
            .resolver_fallbacks_total
            .with_label_values(&[operation])
            .inc();
    }
}
