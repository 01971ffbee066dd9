use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

lazy_static::lazy_static! {
    pub static ref READINESS_CHECKS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "shared_readiness_checks_total",
            "Total number of dependency readiness probes"
        ),
        &["dependency", "result"]
    )
    .unwrap();

    pub static ref READINESS_CHECK_DURATION: HistogramVec = prometheus::register_histogram_vec!(
        HistogramOpts::new(
            "shared_readiness_check_duration_seconds",
            "Duration of dependency readiness probes in seconds"
        ),
        &["dependency"]
    )
    .unwrap();
}

pub fn observe_readiness_check(dependency: &str, result: &str, duration_secs: f64) {
    READINESS_CHECKS_TOTAL
        .with_label_values(&[dependency, result])
        .inc();
    READINESS_CHECK_DURATION
        .with_label_values(&[dependency])
        .observe(duration_secs);
}

/// Render every registered metric in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = prometheus::TextEncoder::new();
    encoder.encode_to_string(&prometheus::gather())
}
