use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub delivery_quotes_total: IntCounterVec,
    pub quote_latency_seconds: HistogramVec,
    pub distance_lookups_total: IntCounterVec,
    pub mixed_cart_group_errors_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let delivery_quotes_total = IntCounterVec::new(
            Opts::new("delivery_quotes_total", "Delivery quotes by tier and outcome"),
            &["tier", "outcome"],
        )
        .expect("valid delivery_quotes_total metric");

        let quote_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "quote_latency_seconds",
                "Latency of delivery quote resolution in seconds",
            ),
            &["tier"],
        )
        .expect("valid quote_latency_seconds metric");

        let distance_lookups_total = IntCounterVec::new(
            Opts::new("distance_lookups_total", "Distance lookups by resolution method"),
            &["method"],
        )
        .expect("valid distance_lookups_total metric");

        let mixed_cart_group_errors_total = IntCounter::new(
            "mixed_cart_group_errors_total",
            "Warehouse groups that failed inside mixed-cart quotes",
        )
        .expect("valid mixed_cart_group_errors_total metric");

        registry
            .register(Box::new(delivery_quotes_total.clone()))
            .expect("register delivery_quotes_total");
        registry
            .register(Box::new(quote_latency_seconds.clone()))
            .expect("register quote_latency_seconds");
        registry
            .register(Box::new(distance_lookups_total.clone()))
            .expect("register distance_lookups_total");
        registry
            .register(Box::new(mixed_cart_group_errors_total.clone()))
            .expect("register mixed_cart_group_errors_total");

        Self {
            registry,
            delivery_quotes_total,
            quote_latency_seconds,
            distance_lookups_total,
            mixed_cart_group_errors_total,
        }
    }

    pub fn record_quote(&self, tier: &str, outcome: &str, elapsed_secs: f64) {
        self.delivery_quotes_total
            .with_label_values(&[tier, outcome])
            .inc();
        self.quote_latency_seconds
            .with_label_values(&[tier])
            .observe(elapsed_secs);
    }

    pub fn record_distance(&self, method: &str) {
        self.distance_lookups_total.with_label_values(&[method]).inc();
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
