use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref POLLS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_polls_total",
        "Total fetch attempts started"
    ))
    .expect("valid metric opts");
    pub static ref POLL_SUCCESSES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_poll_successes_total",
        "Total fetches that replaced the snapshot"
    ))
    .expect("valid metric opts");
    pub static ref POLL_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_poll_failures_total",
        "Total fetches that failed (network, status or payload)"
    ))
    .expect("valid metric opts");
    pub static ref POLL_OVERLAPS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "dashboard_poll_overlaps_total",
        "Fetches started while an earlier fetch was still in flight"
    ))
    .expect("valid metric opts");
    pub static ref POLL_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "dashboard_poll_latency_seconds",
            "Time taken to fetch and decode the reading list"
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .expect("valid metric opts");
    pub static ref READINGS_IN_SNAPSHOT: Gauge = Gauge::with_opts(Opts::new(
        "dashboard_readings",
        "Readings in the current snapshot"
    ))
    .expect("valid metric opts");
}

/// Registers every collector; calling it again is a no-op.
pub fn init_metrics() -> prometheus::Result<()> {
    register(Box::new(POLLS_TOTAL.clone()))?;
    register(Box::new(POLL_SUCCESSES_TOTAL.clone()))?;
    register(Box::new(POLL_FAILURES_TOTAL.clone()))?;
    register(Box::new(POLL_OVERLAPS_TOTAL.clone()))?;
    register(Box::new(POLL_LATENCY_SECONDS.clone()))?;
    register(Box::new(READINGS_IN_SNAPSHOT.clone()))?;
    Ok(())
}

fn register(collector: Box<dyn Collector>) -> prometheus::Result<()> {
    match REGISTRY.register(collector) {
        Err(prometheus::Error::AlreadyReg) => Ok(()),
        other => other,
    }
}

pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
