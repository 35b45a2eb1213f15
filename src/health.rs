//! Health surface: a boolean per named checker, backed by `warp`
//!
//! Generalizes the solver's static `ping_handler` (always `{"message":
//! "PONG"}`) into a dynamic per-checker map, per §4.7.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde_json::json;
use warp::http::StatusCode;
use warp::Filter;

/// Default window within which at least one `QUOTE_SENT` sample must have
/// been observed for the checker to consider itself healthy
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// A counter-based checker: healthy iff the watched counter has strictly
/// increased within the last `window`
pub struct CounterHealthChecker {
    name: String,
    count: AtomicU64,
    last_increase: ArcSwap<Instant>,
    window: Duration,
}

impl CounterHealthChecker {
    /// Build a checker with the default 60s window, starting unhealthy until
    /// the first sample arrives
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_window(name, DEFAULT_WINDOW)
    }

    /// Build a checker with an explicit window
    pub fn with_window(name: impl Into<String>, window: Duration) -> Self {
        Self {
            name: name.into(),
            count: AtomicU64::new(0),
            // start far enough in the past that the checker is unhealthy until the first sample
            last_increase: ArcSwap::from_pointee(Instant::now() - window - Duration::from_secs(1)),
            window,
        }
    }

    /// Record one observation of the watched counter strictly increasing
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.last_increase.store(Arc::new(Instant::now()));
    }

    /// True iff a sample was recorded within the last `window`
    pub fn is_healthy(&self) -> bool {
        self.last_increase.load().elapsed() < self.window
    }

    /// The checker's name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The set of named checkers the `/health` route reports on
#[derive(Clone, Default)]
pub struct HealthRegistry {
    checkers: Vec<Arc<CounterHealthChecker>>,
}

impl HealthRegistry {
    /// Build an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checker
    pub fn register(&mut self, checker: Arc<CounterHealthChecker>) {
        self.checkers.push(checker);
    }

    /// Evaluate every checker into a `name -> healthy` map
    fn evaluate(&self) -> serde_json::Map<String, serde_json::Value> {
        self.checkers.iter().map(|c| (c.name().to_string(), json!(c.is_healthy()))).collect()
    }
}

/// Build the `/health` warp route: 200 iff every checker is healthy, else 503
pub fn health_route(
    registry: HealthRegistry,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("health").and(warp::get()).map(move || {
        let results = registry.evaluate();
        let all_healthy = results.values().all(|v| v.as_bool().unwrap_or(false));
        let code = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
        warp::reply::with_status(warp::reply::json(&serde_json::Value::Object(results)), code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_before_any_sample() {
        let checker = CounterHealthChecker::new("quote_flow");
        assert!(!checker.is_healthy());
    }

    #[test]
    fn healthy_immediately_after_a_sample() {
        let checker = CounterHealthChecker::new("quote_flow");
        checker.record();
        assert!(checker.is_healthy());
    }

    #[test]
    fn unhealthy_outside_a_short_window() {
        let checker = CounterHealthChecker::with_window("quote_flow", Duration::from_millis(10));
        checker.record();
        std::thread::sleep(Duration::from_millis(30));
        assert!(!checker.is_healthy());
    }

    #[test]
    fn registry_reports_all_healthy() {
        let mut registry = HealthRegistry::new();
        let checker = Arc::new(CounterHealthChecker::new("quote_flow"));
        checker.record();
        registry.register(checker);
        let results = registry.evaluate();
        assert_eq!(results.get("quote_flow").and_then(|v| v.as_bool()), Some(true));
    }
}
