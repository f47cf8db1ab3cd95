use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub pool_entries_created_total: IntCounter,
    pub pool_entries_expired_total: IntCounter,
    pub offers_total: IntCounterVec,
    pub order_transitions_total: IntCounterVec,
    pub capacity_rejections_total: IntCounter,
    pub chat_failures_total: IntCounter,
    pub negotiation_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let pool_entries_created_total = IntCounter::new(
            "pool_entries_created_total",
            "Pool entries created by eligibility fan-out",
        )
        .expect("valid pool_entries_created_total metric");

        let pool_entries_expired_total = IntCounter::new(
            "pool_entries_expired_total",
            "Pending pool entries expired by the sweep",
        )
        .expect("valid pool_entries_expired_total metric");

        let offers_total = IntCounterVec::new(
            Opts::new("offers_total", "Offer state changes by outcome"),
            &["outcome"],
        )
        .expect("valid offers_total metric");

        let order_transitions_total = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions by target status"),
            &["status"],
        )
        .expect("valid order_transitions_total metric");

        let capacity_rejections_total = IntCounter::new(
            "capacity_rejections_total",
            "Pool acceptances refused by the capacity ceiling",
        )
        .expect("valid capacity_rejections_total metric");

        let chat_failures_total = IntCounter::new(
            "chat_failures_total",
            "Best-effort chat membership changes that failed",
        )
        .expect("valid chat_failures_total metric");

        let negotiation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "negotiation_latency_seconds",
                "Latency of negotiation operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid negotiation_latency_seconds metric");

        registry
            .register(Box::new(pool_entries_created_total.clone()))
            .expect("register pool_entries_created_total");
        registry
            .register(Box::new(pool_entries_expired_total.clone()))
            .expect("register pool_entries_expired_total");
        registry
            .register(Box::new(offers_total.clone()))
            .expect("register offers_total");
        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(capacity_rejections_total.clone()))
            .expect("register capacity_rejections_total");
        registry
            .register(Box::new(chat_failures_total.clone()))
            .expect("register chat_failures_total");
        registry
            .register(Box::new(negotiation_latency_seconds.clone()))
            .expect("register negotiation_latency_seconds");

        Self {
            registry,
            pool_entries_created_total,
            pool_entries_expired_total,
            offers_total,
            order_transitions_total,
            capacity_rejections_total,
            chat_failures_total,
            negotiation_latency_seconds,
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
