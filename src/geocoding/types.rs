use serde::Deserialize;

use crate::error::GeocodeError;
use crate::geo::OperatingRegion;
use crate::models::GeoPoint;
use crate::models::results::{ExternalGeocodeResult, ResultProvenance};

/// Provider record types treated as points of interest when shortening
/// display names.
const POI_KINDS: &[&str] = &["restaurant", "pharmacy", "hotel", "bank", "school"];

/// Options for a place search, mirroring the provider's query string.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// ISO country code restriction, e.g. `ci`.
    pub country_codes: Option<String>,
    pub viewbox: Option<OperatingRegion>,
    /// Restrict results to the viewbox instead of merely biasing them.
    pub bounded: bool,
    pub address_details: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            country_codes: None,
            viewbox: None,
            bounded: false,
            address_details: false,
        }
    }
}

/// Raw provider record. Coordinates arrive as strings and the type pair
/// comes as `class`/`type`; the licence, OSM id and bounding-box fields
/// of the payload are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderPlace {
    pub place_id: u64,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub importance: Option<f64>,
}

/// Reverse lookups answer with either a place or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReverseResponse {
    Place(Box<ProviderPlace>),
    NotFound { error: String },
}

/// A provider record normalized into the domain: parsed coordinates,
/// provider relevance order preserved by the caller.
#[derive(Debug, Clone)]
pub struct GeocodePlace {
    pub place_id: u64,
    pub position: GeoPoint,
    pub display_name: String,
    pub class: Option<String>,
    pub kind: Option<String>,
    pub importance: Option<f64>,
}

impl GeocodePlace {
    pub(crate) fn from_provider(raw: ProviderPlace) -> Result<Self, GeocodeError> {
        let lat: f64 = raw
            .lat
            .parse()
            .map_err(|_| GeocodeError::InvalidCoordinate(raw.lat.clone()))?;
        let lng: f64 = raw
            .lon
            .parse()
            .map_err(|_| GeocodeError::InvalidCoordinate(raw.lon.clone()))?;

        Ok(Self {
            place_id: raw.place_id,
            position: GeoPoint { lat, lng },
            display_name: raw.display_name,
            class: raw.class,
            kind: raw.kind,
            importance: raw.importance,
        })
    }
}

/// Maps a normalized provider place onto the domain result shape.
///
/// The short name keeps the first two comma-separated segments of the
/// provider's full address, or only the first for recognized
/// point-of-interest categories.
pub fn to_external_result(place: &GeocodePlace) -> ExternalGeocodeResult {
    let kind = place.kind.as_deref().unwrap_or("");
    let keep = if POI_KINDS.contains(&kind) { 1 } else { 2 };

    let name = place
        .display_name
        .split(',')
        .map(str::trim)
        .take(keep)
        .collect::<Vec<_>>()
        .join(", ");

    let category = place
        .kind
        .clone()
        .or_else(|| place.class.clone())
        .unwrap_or_else(|| "unknown".to_string());

    ExternalGeocodeResult {
        name,
        address: place.display_name.clone(),
        position: place.position,
        category,
        source: ResultProvenance::ExternalGeocoder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(display_name: &str, kind: Option<&str>) -> GeocodePlace {
        GeocodePlace {
            place_id: 1,
            position: GeoPoint {
                lat: 5.32,
                lng: -3.98,
            },
            display_name: display_name.to_string(),
            class: Some("amenity".to_string()),
            kind: kind.map(str::to_string),
            importance: Some(0.4),
        }
    }

    #[test]
    fn generic_result_keeps_two_segments() {
        let result = to_external_result(&place(
            "Rue des Jardins, Cocody, Abidjan, Côte d'Ivoire",
            Some("residential"),
        ));
        assert_eq!(result.name, "Rue des Jardins, Cocody");
        assert_eq!(result.category, "residential");
        assert_eq!(result.source, ResultProvenance::ExternalGeocoder);
    }

    #[test]
    fn poi_result_keeps_only_first_segment() {
        let result = to_external_result(&place(
            "Pharmacie du Plateau, Avenue Chardy, Abidjan",
            Some("pharmacy"),
        ));
        assert_eq!(result.name, "Pharmacie du Plateau");
    }

    #[test]
    fn missing_kind_falls_back_to_class() {
        let result = to_external_result(&place("Quartier Biafra, Treichville", None));
        assert_eq!(result.category, "amenity");
        assert_eq!(result.name, "Quartier Biafra, Treichville");
    }

    #[test]
    fn provider_coordinates_parse_to_floats() {
        let raw = ProviderPlace {
            place_id: 7,
            lat: "5.3200".to_string(),
            lon: "-3.9800".to_string(),
            display_name: "somewhere".to_string(),
            class: None,
            kind: None,
            importance: None,
        };
        let normalized = GeocodePlace::from_provider(raw).unwrap();
        assert!((normalized.position.lat - 5.32).abs() < 1e-9);
        assert!((normalized.position.lng + 3.98).abs() < 1e-9);
    }

    #[test]
    fn unparseable_coordinates_are_rejected() {
        let raw = ProviderPlace {
            place_id: 7,
            lat: "not-a-number".to_string(),
            lon: "-3.98".to_string(),
            display_name: "somewhere".to_string(),
            class: None,
            kind: None,
            importance: None,
        };
        assert!(GeocodePlace::from_provider(raw).is_err());
    }

    #[test]
    fn reverse_error_payload_deserializes_as_not_found() {
        let parsed: ReverseResponse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(matches!(parsed, ReverseResponse::NotFound { .. }));
    }
}
