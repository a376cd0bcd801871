//! Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_batch_run, record_http_request,
    record_llm_request, record_prediction, record_tuning_submission, LlmRequestMetricParams,
    PrometheusMetrics,
};
