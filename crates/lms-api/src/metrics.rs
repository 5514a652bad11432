//! Prometheus metrics: HTTP traffic plus ordering, graph and gamification counters.

use std::{sync::LazyLock, time::Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid regex")
});
static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric regex"));

/// Install the Prometheus recorder and return the handle that renders `/metrics`.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Middleware recording request count, latency and in-flight requests.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let in_flight = gauge!(
        "http_requests_in_flight",
        "method" => method.clone(),
        "path" => path.clone()
    );
    in_flight.increment(1.0);

    let response = next.run(req).await;

    in_flight.decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Replace ids in a path with `:id` to keep label cardinality bounded.
fn normalize_path(path: &str) -> String {
    let without_uuids = UUID_SEGMENT.replace_all(path, ":id");
    NUMERIC_SEGMENT
        .replace_all(&without_uuids, "/:id$1")
        .into_owned()
}

pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

const fn status_label(success: bool) -> &'static str {
    if success { "success" } else { "error" }
}

/// A reorder, append, delete or move on an ordered sibling set
pub fn record_ordering_operation(entity: &'static str, operation: &'static str, success: bool) {
    counter!(
        "ordering_operations_total",
        "entity" => entity,
        "operation" => operation,
        "status" => status_label(success)
    )
    .increment(1);
}

/// A prerequisite or relation edge refused by a graph guard
pub fn record_graph_rejection(kind: &'static str, reason: &'static str) {
    counter!("graph_edges_rejected_total", "kind" => kind, "reason" => reason).increment(1);
}

pub fn record_xp_awarded(reason: &'static str, amount: i64) {
    if let Ok(amount) = u64::try_from(amount) {
        counter!("xp_awarded_total", "reason" => reason).increment(amount);
    }
}

pub fn record_badges_awarded(count: usize) {
    counter!("badges_awarded_total").increment(count as u64);
}
