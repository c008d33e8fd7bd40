//! Request metrics.
//!
//! Handlers never talk to Prometheus directly: the router records through a
//! [`MetricsSink`] built once at startup and stored in the server state.
//!
//! # Metrics
//!
//! - `http_requests_total{method,path,status}` (counter)
//! - `http_errors_total{method,path,status}` (counter, status >= 400)
//! - `http_request_duration_seconds{method,path}` (histogram)
//!
//! `path` is the matched route template (e.g. `/api/groups/{id}`), never the
//! raw URI.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

use crate::server::ServerState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    HttpRequests,
    HttpErrors,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Histogram {
    HttpRequestDuration,
}

/// Destination for counters and histograms.
///
/// Label values are positional and follow the metric's label names:
/// `[method, path, status]` for counters, `[method, path]` for the duration
/// histogram.
pub trait MetricsSink: Send + Sync {
    fn inc_counter(&self, counter: Counter, labels: &[&str]);

    fn observe_histogram(&self, histogram: Histogram, labels: &[&str], value: f64);

    /// Text exposition of everything recorded, `None` when nothing is exported.
    fn encode(&self) -> Option<String>;
}

/// Discards every observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc_counter(&self, _counter: Counter, _labels: &[&str]) {}

    fn observe_histogram(&self, _histogram: Histogram, _labels: &[&str], _value: f64) {}

    fn encode(&self) -> Option<String> {
        None
    }
}

/// Prometheus-backed sink with its own registry.
pub struct PrometheusMetrics {
    registry: Registry,
    requests_total: CounterVec,
    errors_total: CounterVec,
    request_duration: HistogramVec,
}

impl PrometheusMetrics {
    /// Creates the metrics and registers them with a private registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created or registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        let errors_total = CounterVec::new(
            Opts::new("http_errors_total", "Total HTTP responses with status >= 400"),
            &["method", "path", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            request_duration,
        })
    }
}

impl MetricsSink for PrometheusMetrics {
    fn inc_counter(&self, counter: Counter, labels: &[&str]) {
        let vec = match counter {
            Counter::HttpRequests => &self.requests_total,
            Counter::HttpErrors => &self.errors_total,
        };
        match vec.get_metric_with_label_values(labels) {
            Ok(metric) => metric.inc(),
            Err(err) => tracing::warn!(?counter, "dropping counter sample: {err}"),
        }
    }

    fn observe_histogram(&self, histogram: Histogram, labels: &[&str], value: f64) {
        let vec = match histogram {
            Histogram::HttpRequestDuration => &self.request_duration,
        };
        match vec.get_metric_with_label_values(labels) {
            Ok(metric) => metric.observe(value),
            Err(err) => tracing::warn!(?histogram, "dropping histogram sample: {err}"),
        }
    }

    fn encode(&self) -> Option<String> {
        let mut buffer = Vec::new();
        if let Err(err) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("failed to encode metrics: {err}");
            return None;
        }
        String::from_utf8(buffer).ok()
    }
}

/// Records count, errors and latency of every routed request.
pub(crate) async fn track(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status();
    let status_label = status.as_u16().to_string();
    let sink = state.metrics.as_ref();
    sink.inc_counter(
        Counter::HttpRequests,
        &[method.as_str(), path.as_str(), status_label.as_str()],
    );
    if status.is_client_error() || status.is_server_error() {
        sink.inc_counter(
            Counter::HttpErrors,
            &[method.as_str(), path.as_str(), status_label.as_str()],
        );
    }
    sink.observe_histogram(
        Histogram::HttpRequestDuration,
        &[method.as_str(), path.as_str()],
        elapsed,
    );

    response
}

/// `GET /metrics`
pub(crate) async fn export(State(state): State<ServerState>) -> Response {
    match state.metrics.encode() {
        Some(body) => (
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_sink_counts_requests() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.inc_counter(Counter::HttpRequests, &["GET", "/health", "200"]);
        metrics.inc_counter(Counter::HttpRequests, &["GET", "/health", "200"]);

        let counter = metrics
            .requests_total
            .with_label_values(&["GET", "/health", "200"]);
        assert_eq!(counter.get() as u64, 2);
    }

    #[test]
    fn prometheus_sink_encodes_text_exposition() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.inc_counter(Counter::HttpErrors, &["POST", "/api/settle", "422"]);
        metrics.observe_histogram(Histogram::HttpRequestDuration, &["POST", "/api/settle"], 0.02);

        let text = metrics.encode().unwrap();
        assert!(text.contains("http_errors_total"));
        assert!(text.contains("http_request_duration_seconds_bucket"));
        assert!(text.contains("path=\"/api/settle\""));
    }

    #[test]
    fn wrong_label_count_is_ignored() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.inc_counter(Counter::HttpRequests, &["GET"]);
        let text = metrics.encode().unwrap();
        assert!(!text.contains("method=\"GET\""));
    }

    #[test]
    fn noop_sink_exports_nothing() {
        let metrics = NoopMetrics;
        metrics.inc_counter(Counter::HttpRequests, &["GET", "/", "200"]);
        assert_eq!(metrics.encode(), None);
    }
}
