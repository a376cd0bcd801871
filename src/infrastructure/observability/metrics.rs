//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;

static SESSION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"sess-[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid regex")
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").expect("valid regex")
});

static OBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[0-9a-fA-F]{24}(/|$)").expect("valid regex"));

/// `/api/tune/{task_id}` carries an opaque task id in the last segment
static TUNE_TASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/tune/[^/]+$").expect("valid regex"));

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the Prometheus recorder; `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("exo_classifier_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// One classification call, labelled by model kind and outcome
pub fn record_prediction(target: &str, success: bool, duration: Duration) {
    let labels = [
        ("target", target.to_string()),
        ("status", outcome(success).to_string()),
    ];

    counter!("predictions_total", &labels).increment(1);
    histogram!("prediction_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_batch_run(rows: usize, success: bool, duration: Duration) {
    let labels = [("status", outcome(success).to_string())];

    counter!("batch_runs_total", &labels).increment(1);
    counter!("batch_rows_total", &labels).increment(rows as u64);
    histogram!("batch_run_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_tuning_submission(model: &str, queued: bool) {
    let mode = if queued { "queued" } else { "completed" };
    counter!("tuning_submissions_total", "model" => model.to_string(), "mode" => mode)
        .increment(1);
}

pub fn record_llm_request(params: LlmRequestMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("model", params.model.to_string()),
        ("purpose", params.purpose.to_string()),
        ("status", outcome(params.success).to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(params.duration.as_secs_f64());

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }
}

pub struct LlmRequestMetricParams<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    /// `explain` or `generate`
    pub purpose: &'a str,
    pub duration: Duration,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

fn outcome(success: bool) -> &'static str {
    if success { "success" } else { "error" }
}

/// Replace IDs in a path so labels stay low-cardinality
fn sanitize_path(path: &str) -> String {
    if TUNE_TASK.is_match(path) {
        return "/api/tune/{id}".to_string();
    }

    let path = SESSION_ID.replace_all(path, "{id}");
    let path = UUID.replace_all(&path, "{id}");
    let path = OBJECT_ID.replace_all(&path, "/{id}$1");

    path.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_session_path() {
        let path = "/api/sessions/sess-550e8400-e29b-41d4-a716-446655440000/schema";
        assert_eq!(sanitize_path(path), "/api/sessions/{id}/schema");
    }

    #[test]
    fn test_sanitize_batch_and_model_ids() {
        assert_eq!(
            sanitize_path("/api/batch/550e8400-e29b-41d4-a716-446655440000/export"),
            "/api/batch/{id}/export"
        );
        assert_eq!(
            sanitize_path("/api/models/64f1a2b3c4d5e6f708192a3b"),
            "/api/models/{id}"
        );
        assert_eq!(sanitize_path("/api/tune/celery-task-42"), "/api/tune/{id}");
    }

    #[test]
    fn test_sanitize_path_keeps_static_routes() {
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/api/tune"), "/api/tune");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert!(sanitize_path(path).len() <= 50);
    }
}
