use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uuid::Uuid;

use delivery_geo_core::config::Config;
use delivery_geo_core::geocoding::{GeocodingClient, SearchOptions};
use delivery_geo_core::models::GeoPoint;
use delivery_geo_core::models::location::{DeliveryLocation, ZoneType};
use delivery_geo_core::models::results::ResultProvenance;
use delivery_geo_core::observability::metrics::Metrics;
use delivery_geo_core::resolver::LocationResolver;
use delivery_geo_core::store::memory::InMemoryLocationStore;

fn config_for(server: &MockServer) -> Config {
    Config {
        geocoder_base_url: server.uri(),
        geocoder_min_interval_ms: 10,
        ..Config::default()
    }
}

fn client_for(server: &MockServer) -> GeocodingClient {
    GeocodingClient::new(&config_for(server), Metrics::new()).expect("geocoding client")
}

fn place(id: u64, name: &str, lat: f64, lng: f64, kind: &str) -> serde_json::Value {
    json!({
        "place_id": id,
        "licence": "Data © OpenStreetMap contributors",
        "osm_type": "node",
        "osm_id": id,
        "boundingbox": ["5.0", "5.4", "-3.9", "-3.5"],
        "lat": lat.to_string(),
        "lon": lng.to_string(),
        "display_name": name,
        "class": "amenity",
        "type": kind,
        "importance": 0.41
    })
}

#[tokio::test]
async fn search_normalizes_records_in_provider_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place(1, "Pharmacie du Plateau, Avenue Chardy, Abidjan", 5.32, -3.71, "pharmacy"),
            place(2, "Pharmacie Sainte Marie, Cocody, Abidjan", 5.35, -3.74, "pharmacy"),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client.search("pharmacie", &SearchOptions::default()).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].place_id, 1);
    assert_eq!(results[1].place_id, 2);
    assert!((results[0].position.lat - 5.32).abs() < 1e-9);
    assert!((results[0].position.lng + 3.71).abs() < 1e-9);
    assert_eq!(results[0].kind.as_deref(), Some("pharmacy"));
}

#[tokio::test]
async fn search_recovers_from_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.search("plateau", &SearchOptions::default()).await.is_empty());
}

#[tokio::test]
async fn search_recovers_from_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.search("plateau", &SearchOptions::default()).await.is_empty());
}

#[tokio::test]
async fn search_drops_records_with_unparseable_coordinates() {
    let server = MockServer::start().await;
    let mut bad = place(2, "Broken", 0.0, 0.0, "residential");
    bad["lat"] = json!("not-a-number");

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place(1, "Rue des Jardins, Cocody", 5.34, -3.73, "residential"),
            bad,
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client.search("jardins", &SearchOptions::default()).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].place_id, 1);
}

#[tokio::test]
async fn blank_query_never_reaches_the_provider() {
    let server = MockServer::start().await;
    // No mock mounted: a request would 404 and be logged, but the
    // short-circuit means wiremock must see zero requests.
    let client = client_for(&server);
    assert!(client.search("   ", &SearchOptions::default()).await.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn reverse_returns_best_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "5.32"))
        .and(query_param("lon", "-3.71"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(place(7, "Avenue Chardy, Plateau, Abidjan", 5.32, -3.71, "road")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.reverse(5.32, -3.71).await.expect("a match");
    assert_eq!(result.place_id, 7);
    assert_eq!(result.display_name, "Avenue Chardy, Plateau, Abidjan");
}

#[tokio::test]
async fn reverse_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Unable to geocode"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.reverse(0.0, 0.0).await.is_none());
}

#[tokio::test]
async fn reverse_provider_failure_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.reverse(5.32, -3.71).await.is_none());
}

#[tokio::test]
async fn consecutive_requests_are_spaced_by_the_minimum_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = Config {
        geocoder_base_url: server.uri(),
        geocoder_min_interval_ms: 100,
        ..Config::default()
    };
    let client = GeocodingClient::new(&config, Metrics::new()).expect("geocoding client");

    let started = Instant::now();
    client.search("a", &SearchOptions::default()).await;
    client.search("b", &SearchOptions::default()).await;
    client.search("c", &SearchOptions::default()).await;

    // Three requests cannot complete faster than two full intervals.
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn smart_search_keeps_only_external_results_inside_the_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("bounded", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place(1, "Pharmacie du Plateau, Abidjan", 5.32, -3.71, "pharmacy"),
            place(2, "Pharmacie de Cocody, Abidjan", 5.35, -3.74, "pharmacy"),
            place(3, "Pharmacie de Treichville, Abidjan", 5.29, -3.72, "pharmacy"),
            place(4, "Pharmacie de Paris", 48.85, 2.35, "pharmacy"),
        ])))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryLocationStore::new());
    let config = config_for(&server);
    let geocoder = Arc::new(GeocodingClient::new(&config, Metrics::new()).expect("client"));
    let resolver = LocationResolver::new(store, geocoder, config, Metrics::new());

    let results = resolver.smart_search("pharmacie", 10).await;

    assert!(results.locations.is_empty());
    assert!(results.landmarks.is_empty());
    assert_eq!(results.external.len(), 3);
    for result in &results.external {
        assert_eq!(result.source, ResultProvenance::ExternalGeocoder);
        assert_eq!(result.name.split(',').count(), 1);
    }
}

#[tokio::test]
async fn smart_search_returns_labeled_groups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place(1, "Pharmacie centrale, Marcory, Abidjan", 5.30, -3.73, "pharmacy"),
        ])))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryLocationStore::new());
    store.insert_location(DeliveryLocation {
        id: Uuid::from_u128(1),
        name: "Pharmacie quartier".to_string(),
        district: "Marcory".to_string(),
        zone_type: ZoneType::Commercial,
        position: GeoPoint {
            lat: 5.30,
            lng: -3.73,
        },
        postal_code: None,
        delivery_fee: 700,
        estimated_minutes: 20,
        is_active: true,
        description: None,
    });

    let config = config_for(&server);
    let geocoder = Arc::new(GeocodingClient::new(&config, Metrics::new()).expect("client"));
    let resolver = LocationResolver::new(store, geocoder, config, Metrics::new());

    let results = resolver.smart_search("pharmacie", 10).await;

    assert_eq!(results.locations.len(), 1);
    assert_eq!(results.locations[0].name, "Pharmacie quartier");
    assert_eq!(results.external.len(), 1);
    assert_eq!(results.external[0].name, "Pharmacie centrale");
}
