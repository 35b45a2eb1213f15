//! Telemetry setup: structured logging and the Prometheus metrics recorder
//!
//! Mirrors the shape of the solver's `Cli::configure_telemetry`: one function
//! the binary calls once at startup to wire up tracing and metrics, except the
//! metrics backend here is a locally-scraped Prometheus recorder rather than a
//! push-based OTLP/statsd exporter, since the gateway's `/metrics` route has to
//! serve an exposition-format snapshot on demand (see DESIGN.md).

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use warp::Filter;

/// The `rfqs_total` counter name
pub const RFQS_TOTAL: &str = "rfqs_total";
/// The `rfqs_waiting` gauge name
pub const RFQS_WAITING: &str = "rfqs_waiting";

/// Status label values for `rfqs_total`
pub mod status {
    /// A quote was produced and enqueued for delivery
    pub const QUOTE_SENT: &str = "QUOTE_SENT";
    /// The base token is not known to Market State
    pub const UNSUPPORTED_BT: &str = "UNSUPPORTED_BT";
    /// The quote token is not known to Market State
    pub const UNSUPPORTED_QT: &str = "UNSUPPORTED_QT";
    /// Inventory of the quote token is exhausted
    pub const LOW_QT_BALANCE: &str = "LOW_QT_BALANCE";
    /// An unhandled error occurred while quoting
    pub const QUOTER_UNHANDLED_EXC: &str = "QUOTER_UNHANDLED_EXC";
}

/// Configure tracing from the given log level directive
///
/// Follows the `LOG_LEVEL` env-driven convention of this lineage rather than a
/// bespoke logging config file.
pub fn configure_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Install the Prometheus metrics recorder and return a handle that renders
/// the current snapshot as Prometheus exposition text
pub fn install_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new().install_recorder().expect("failed to install metrics recorder")
}

/// Build the `/metrics` warp route, serving the Prometheus exposition text
pub fn metrics_route(
    handle: PrometheusHandle,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("metrics").and(warp::get()).map(move || handle.render())
}

/// Custom tracing filter that creates spans for requests at info level,
/// matching the solver's `with_tracing` helper
pub fn with_tracing() -> warp::trace::Trace<impl Fn(warp::trace::Info) -> tracing::Span + Clone> {
    warp::trace(|info| {
        tracing::info_span!(
            target: "mm_gateway::request",
            "handle_request",
            method = %info.method(),
            path = %info.path(),
        )
    })
}
