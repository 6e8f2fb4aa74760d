mod types;

pub use types::{GeocodePlace, SearchOptions, to_external_result};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GeocodeError;
use crate::observability::metrics::Metrics;
use types::{ProviderPlace, ReverseResponse};

const ACCEPT_LANGUAGE: &str = "fr";

/// Enforces the provider's minimum spacing between outbound requests.
///
/// Callers that arrive before the spacing has elapsed park on the fair
/// mutex and proceed strictly in arrival order. Holding the lock across
/// the sleep is what serializes them.
struct RequestGate {
    min_interval: Duration,
    last_send: Mutex<Option<Instant>>,
}

impl RequestGate {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_send: Mutex::new(None),
        }
    }

    async fn admit(&self) {
        let mut last_send = self.last_send.lock().await;
        if let Some(previous) = *last_send {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_send = Some(Instant::now());
    }
}

/// Client for the external place-search provider.
///
/// Public operations never fail: provider errors degrade to empty
/// results and a log line, since geocoding is enrichment rather than a
/// required step of any caller's flow.
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
    gate: RequestGate,
    metrics: Metrics,
}

impl GeocodingClient {
    pub fn new(config: &Config, metrics: Metrics) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.geocoder_user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
            gate: RequestGate::new(config.geocoder_min_interval()),
            metrics,
        })
    }

    /// Text search against the provider, in provider relevance order.
    /// Blank queries and provider failures both yield no results.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Vec<GeocodePlace> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let url = self.search_url(query, options);
        match self.request_json::<Vec<ProviderPlace>>(&url).await {
            Ok(records) => records
                .into_iter()
                .filter_map(|record| match GeocodePlace::from_provider(record) {
                    Ok(place) => Some(place),
                    Err(err) => {
                        warn!(error = %err, "dropping provider record");
                        None
                    }
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, query, "place search failed");
                Vec::new()
            }
        }
    }

    /// Coordinate to address lookup. Returns the best match, or `None`
    /// when the provider has nothing or is unreachable.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Option<GeocodePlace> {
        let url = format!(
            "{}/reverse?lat={lat}&lon={lng}&format=json&addressdetails=1&accept-language={ACCEPT_LANGUAGE}",
            self.base_url
        );

        match self.request_json::<ReverseResponse>(&url).await {
            Ok(ReverseResponse::Place(record)) => match GeocodePlace::from_provider(*record) {
                Ok(place) => Some(place),
                Err(err) => {
                    warn!(error = %err, "reverse result had bad coordinates");
                    None
                }
            },
            Ok(ReverseResponse::NotFound { error }) => {
                debug!(reason = %error, lat, lng, "reverse lookup found nothing");
                None
            }
            Err(err) => {
                warn!(error = %err, lat, lng, "reverse lookup failed");
                None
            }
        }
    }

    async fn request_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GeocodeError> {
        self.gate.admit().await;

        let started = std::time::Instant::now();
        let result = self.send_request(url).await;
        let outcome = if result.is_ok() { "success" } else { "error" };

        self.metrics
            .geocode_requests_total
            .with_label_values(&[outcome])
            .inc();
        self.metrics
            .geocode_request_seconds
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn send_request<T: DeserializeOwned>(&self, url: &str) -> Result<T, GeocodeError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| GeocodeError::Deserialize(err.to_string()))
    }

    fn search_url(&self, query: &str, options: &SearchOptions) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&limit={}",
            self.base_url,
            urlencoding::encode(query),
            options.limit
        );

        if let Some(codes) = &options.country_codes {
            url.push_str("&countrycodes=");
            url.push_str(codes);
        }
        if let Some(viewbox) = &options.viewbox {
            url.push_str("&viewbox=");
            url.push_str(&viewbox.viewbox_param());
            if options.bounded {
                url.push_str("&bounded=1");
            }
        }
        if options.address_details {
            url.push_str("&addressdetails=1");
        }
        url.push_str("&accept-language=");
        url.push_str(ACCEPT_LANGUAGE);

        url
    }
}
