//! Tuning service - submits grid searches and polls background tasks

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn, Instrument};

use super::TunedModelService;
use crate::domain::{
    ClassifierBackend, DomainError, HyperparameterGrid, Schema, TuneResponse, TuningRequest,
    TuningStatus, TuningTask, TuningTaskId,
};
use crate::infrastructure::observability::record_tuning_submission;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Owns a background poll loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct TuningPollHandle {
    task_id: TuningTaskId,
    task: Option<JoinHandle<Result<TuningTask, DomainError>>>,
    updates: watch::Receiver<TuningTask>,
}

impl TuningPollHandle {
    pub fn task_id(&self) -> &TuningTaskId {
        &self.task_id
    }

    /// Latest observed state
    pub fn latest(&self) -> TuningTask {
        self.updates.borrow().clone()
    }

    /// Wait for the next observed state; `None` once polling has ended
    pub async fn changed(&mut self) -> Option<TuningTask> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }

    /// Wait until the task reaches SUCCESS or FAILURE, or a poll fails
    pub async fn wait(mut self) -> Result<TuningTask, DomainError> {
        let Some(task) = self.task.take() else {
            return Err(DomainError::internal("Poll loop already consumed"));
        };

        task.await
            .map_err(|e| DomainError::internal(format!("Poll loop ended abnormally: {}", e)))?
    }

    /// Stop polling now; no further status requests are made
    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            debug!(task_id = %self.task_id, "Tuning poll loop cancelled");
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

impl Drop for TuningPollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!(task_id = %self.task_id, "Stopping tuning poll loop");
            }
            task.abort();
        }
    }
}

/// Polls `GET /tuning_status/{id}` every `period` until the task is terminal.
/// The first request is made one period after the start.
pub fn spawn_poller(
    backend: Arc<dyn ClassifierBackend>,
    task_id: TuningTaskId,
    period: Duration,
) -> TuningPollHandle {
    let (tx, rx) = watch::channel(TuningTask::pending(task_id.clone()));
    let id = task_id.clone();
    let span = tracing::info_span!("tuning_poll", task_id = %task_id);

    let task = tokio::spawn(
        async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let response = match backend.tuning_status(&id).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(error = %e, "Tuning status poll failed");
                        return Err(e);
                    }
                };

                let task = TuningTask::from_status(id.clone(), response);
                debug!(status = %task.status, "Tuning status polled");
                tx.send_replace(task.clone());

                if task.is_terminal() {
                    info!(status = %task.status, "Tuning task finished");
                    return Ok(task);
                }
            }
        }
        .instrument(span),
    );

    TuningPollHandle {
        task_id,
        task: Some(task),
        updates: rx,
    }
}

pub struct TuningService {
    backend: Arc<dyn ClassifierBackend>,
    tuned_models: Arc<TunedModelService>,
    poll_interval: Duration,
}

impl std::fmt::Debug for TuningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuningService")
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl TuningService {
    pub fn new(backend: Arc<dyn ClassifierBackend>, tuned_models: Arc<TunedModelService>) -> Self {
        Self {
            backend,
            tuned_models,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Validate the grid and submit it. The backend either finishes inline or
    /// hands back a task id to poll.
    #[instrument(skip(self, grid), fields(params = grid.params().len(), combinations = grid.combinations()))]
    pub async fn submit(
        &self,
        schema: Schema,
        grid: HyperparameterGrid,
    ) -> Result<TuneResponse, DomainError> {
        let request = TuningRequest::new(schema, grid)?;
        let response = self.backend.tune(&request).await?;

        match &response {
            TuneResponse::Queued { task_id } => {
                info!(%task_id, "Tuning task queued");
                record_tuning_submission(schema.model_name(), true);
            }
            TuneResponse::Completed(result) => {
                info!(accuracy = result.accuracy, "Tuning finished inline");
                record_tuning_submission(schema.model_name(), false);
                self.tuned_models.record_tuning_success().await;
            }
        }

        Ok(response)
    }

    /// One status request
    #[instrument(skip(self))]
    pub async fn status(&self, task_id: &str) -> Result<TuningTask, DomainError> {
        let task_id = TuningTaskId::new(task_id)?;
        let response = self.backend.tuning_status(&task_id).await?;
        let task = TuningTask::from_status(task_id, response);

        if task.status == TuningStatus::Success {
            self.tuned_models.record_tuning_success().await;
        }

        Ok(task)
    }

    /// Start polling a queued task on the configured interval
    pub fn poll(&self, task_id: TuningTaskId) -> TuningPollHandle {
        spawn_poller(self.backend.clone(), task_id, self.poll_interval)
    }

    /// Poll until terminal and mirror the new model on success
    pub async fn wait_for(&self, task_id: TuningTaskId) -> Result<TuningTask, DomainError> {
        let task = self.poll(task_id).wait().await?;

        if task.status == TuningStatus::Success {
            self.tuned_models.record_tuning_success().await;
        }

        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::domain::classifier::MockClassifierBackend;
    use crate::domain::{HyperparameterValue, TuningStatusResponse};
    use crate::infrastructure::storage::InMemoryStore;

    const TICK: Duration = Duration::from_millis(10);

    fn status(value: serde_json::Value) -> TuningStatusResponse {
        serde_json::from_value(value).unwrap()
    }

    fn tuned_models(backend: Arc<dyn ClassifierBackend>) -> Arc<TunedModelService> {
        Arc::new(TunedModelService::new(backend, Arc::new(InMemoryStore::new())))
    }

    fn grid() -> HyperparameterGrid {
        HyperparameterGrid::new().with_param(
            "classifier__rf__n_estimators",
            [HyperparameterValue::Integer(100), HyperparameterValue::Integer(200)],
        )
    }

    #[tokio::test]
    async fn test_poll_stops_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut backend = MockClassifierBackend::new();
        backend.expect_tuning_status().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok(status(json!({"status": "PENDING"})))
            } else {
                Ok(status(json!({
                    "status": "SUCCESS",
                    "result": {
                        "model_name": "tess",
                        "best_params": {},
                        "accuracy": 0.87,
                        "model_id": "64f1a2b3c4d5e6f708192a3b"
                    }
                })))
            }
        });

        let handle = spawn_poller(Arc::new(backend), TuningTaskId::new("t-1").unwrap(), TICK);
        assert_eq!(handle.latest().status, TuningStatus::Pending);

        let task = handle.wait().await.unwrap();
        assert_eq!(task.status, TuningStatus::Success);
        assert_eq!(task.result.unwrap().accuracy, 0.87);

        tokio::time::sleep(TICK * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let mut backend = MockClassifierBackend::new();
        backend
            .expect_tuning_status()
            .times(1)
            .returning(|_| Ok(status(json!({"status": "FAILURE", "error": "bad grid"}))));

        let handle = spawn_poller(Arc::new(backend), TuningTaskId::new("t-2").unwrap(), TICK);
        let task = handle.wait().await.unwrap();

        assert_eq!(task.status, TuningStatus::Failure);
        assert_eq!(task.error.as_deref(), Some("bad grid"));
    }

    #[tokio::test]
    async fn test_pending_task_polls_until_handle_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut backend = MockClassifierBackend::new();
        backend.expect_tuning_status().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(status(json!({"status": "PENDING"})))
        });

        let mut handle = spawn_poller(Arc::new(backend), TuningTaskId::new("t-3").unwrap(), TICK);
        let update = handle.changed().await.unwrap();
        assert_eq!(update.status, TuningStatus::Pending);
        tokio::time::sleep(TICK * 4).await;
        assert!(!handle.is_finished());

        drop(handle);
        tokio::time::sleep(TICK * 2).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_cancel_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut backend = MockClassifierBackend::new();
        backend.expect_tuning_status().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(status(json!({"status": "PENDING"})))
        });

        let mut handle = spawn_poller(Arc::new(backend), TuningTaskId::new("t-5").unwrap(), TICK);
        handle.changed().await.unwrap();

        handle.cancel();
        tokio::time::sleep(TICK * 2).await;
        let after_cancel = calls.load(Ordering::SeqCst);
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn test_poll_error_ends_polling() {
        let mut backend = MockClassifierBackend::new();
        backend
            .expect_tuning_status()
            .times(1)
            .returning(|_| Err(DomainError::backend("connection reset")));

        let handle = spawn_poller(Arc::new(backend), TuningTaskId::new("t-4").unwrap(), TICK);
        let err = handle.wait().await.unwrap_err();
        assert_eq!(err.user_message(), "connection reset");
    }

    #[tokio::test]
    async fn test_submit_validates_grid_before_calling_backend() {
        let mut backend = MockClassifierBackend::new();
        backend.expect_tune().times(0);
        let backend: Arc<dyn ClassifierBackend> = Arc::new(backend);
        let service = TuningService::new(backend.clone(), tuned_models(backend));

        let result = service.submit(Schema::Kepler, HyperparameterGrid::new()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_inline_result_refreshes_models() {
        let mut backend = MockClassifierBackend::new();
        backend.expect_tune().times(1).returning(|request| {
            assert_eq!(request.model, "kepler");
            Ok(serde_json::from_value(json!({
                "message": "Model tuned and saved successfully",
                "model_name": "kepler",
                "best_params": {"classifier__rf__n_estimators": 200},
                "accuracy": 0.9,
                "model_id": "64f1a2b3c4d5e6f708192a3b"
            }))
            .unwrap())
        });
        backend
            .expect_tuned_models()
            .times(1)
            .returning(|| Ok(Vec::new()));
        let backend: Arc<dyn ClassifierBackend> = Arc::new(backend);
        let service = TuningService::new(backend.clone(), tuned_models(backend));

        let response = service.submit(Schema::Kepler, grid()).await.unwrap();
        assert!(matches!(response, TuneResponse::Completed(ref r) if r.accuracy == 0.9));
    }

    #[tokio::test]
    async fn test_status_rejects_malformed_task_id() {
        let mut backend = MockClassifierBackend::new();
        backend.expect_tuning_status().times(0);
        let backend: Arc<dyn ClassifierBackend> = Arc::new(backend);
        let service = TuningService::new(backend.clone(), tuned_models(backend));

        assert!(matches!(
            service.status("../etc/passwd").await,
            Err(DomainError::InvalidId { .. })
        ));
    }
}
