use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ENVELOPES_SENT_TOTAL: Counter = Counter::with_opts(Opts::new(
        "worker_envelopes_sent_total",
        "Total envelopes accepted by the EMS endpoint"
    ))
    .unwrap();
    pub static ref ENVELOPES_FAILED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "worker_envelopes_failed_total",
        "Total envelopes rejected or lost in transit"
    ))
    .unwrap();
    pub static ref SEND_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "worker_send_latency_seconds",
            "Time taken to post one envelope"
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .unwrap();
    pub static ref BATCH_IN_FLIGHT: Gauge = Gauge::with_opts(Opts::new(
        "worker_batch_in_flight",
        "Envelopes currently being sent in the active batch"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY
        .register(Box::new(ENVELOPES_SENT_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(ENVELOPES_FAILED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SEND_LATENCY_SECONDS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(BATCH_IN_FLIGHT.clone())).unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
