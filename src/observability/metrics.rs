use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub geocode_requests_total: IntCounterVec,
    pub geocode_request_seconds: HistogramVec,
    pub resolver_fallbacks_total: IntCounterVec,
    pub tracking_cycles_total: IntCounterVec,
    pub driver_updates_published_total: IntCounter,
    pub tracking_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let geocode_requests_total = IntCounterVec::new(
            Opts::new(
                "geocode_requests_total",
                "Outbound geocoding requests by outcome",
            ),
            &["outcome"],
        )
        .expect("valid geocode_requests_total metric");

        let geocode_request_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "geocode_request_seconds",
                "Latency of geocoding requests in seconds",
            ),
            &["outcome"],
        )
        .expect("valid geocode_request_seconds metric");

        let resolver_fallbacks_total = IntCounterVec::new(
            Opts::new(
                "resolver_fallbacks_total",
                "Resolver fallback activations by operation",
            ),
            &["operation"],
        )
        .expect("valid resolver_fallbacks_total metric");

        let tracking_cycles_total = IntCounterVec::new(
            Opts::new(
                "tracking_cycles_total",
                "Driver sampling cycles by outcome",
            ),
            &["outcome"],
        )
        .expect("valid tracking_cycles_total metric");

        let driver_updates_published_total = IntCounter::new(
            "driver_updates_published_total",
            "Driver position changes delivered to subscribers",
        )
        .expect("valid driver_updates_published_total metric");

        let tracking_subscribers = IntGauge::new(
            "tracking_subscribers",
            "Currently registered tracking subscribers",
        )
        .expect("valid tracking_subscribers metric");

        registry
            .register(Box::new(geocode_requests_total.clone()))
            .expect("register geocode_requests_total");
        registry
            .register(Box::new(geocode_request_seconds.clone()))
            .expect("register geocode_request_seconds");
        registry
            .register(Box::new(resolver_fallbacks_total.clone()))
            .expect("register resolver_fallbacks_total");
        registry
            .register(Box::new(tracking_cycles_total.clone()))
            .expect("register tracking_cycles_total");
        registry
            .register(Box::new(driver_updates_published_total.clone()))
            .expect("register driver_updates_published_total");
        registry
            .register(Box::new(tracking_subscribers.clone()))
            .expect("register tracking_subscribers");

        Self {
            registry,
            geocode_requests_total,
            geocode_request_seconds,
            resolver_fallbacks_total,
            tracking_cycles_total,
            driver_updates_published_total,
            tracking_subscribers,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
