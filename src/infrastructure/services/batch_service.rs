//! Batch service - background batch jobs with progress tracking

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, Instrument};
use uuid::Uuid;

use crate::domain::{
    BatchError, BatchOutcome, BatchProgress, BatchRunner, BatchTable, DomainError,
    PredictionTarget, Schema,
};
use crate::infrastructure::observability::record_batch_run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchJobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
struct BatchJob {
    id: Uuid,
    schema: Schema,
    target: String,
    file_name: Option<String>,
    status: BatchJobStatus,
    progress: BatchProgress,
    error: Option<String>,
    outcome: Option<Arc<BatchOutcome>>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Client view of a batch job
#[derive(Debug, Clone, Serialize)]
pub struct BatchJobView {
    pub id: Uuid,
    pub schema: Schema,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub status: BatchJobStatus,
    pub processed_rows: usize,
    pub total_rows: usize,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Output columns, once the run has completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_counts: Option<Vec<(String, usize)>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&BatchJob> for BatchJobView {
    fn from(job: &BatchJob) -> Self {
        Self {
            id: job.id,
            schema: job.schema,
            target: job.target.clone(),
            file_name: job.file_name.clone(),
            status: job.status,
            processed_rows: job.progress.processed_rows,
            total_rows: job.progress.total_rows,
            completed_chunks: job.progress.completed_chunks,
            total_chunks: job.progress.total_chunks,
            percent: job.progress.percent(),
            error: job.error.clone(),
            columns: job.outcome.as_ref().map(|o| o.columns()),
            class_counts: job.outcome.as_ref().map(|o| o.class_counts()),
            created_at: job.created_at,
            finished_at: job.finished_at,
        }
    }
}

type JobMap = Arc<RwLock<HashMap<Uuid, BatchJob>>>;

#[derive(Debug)]
pub struct BatchService {
    runner: Arc<BatchRunner>,
    jobs: JobMap,
    retention: Duration,
}

const DEFAULT_BATCH_RETENTION: Duration = Duration::from_secs(3600);

fn lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::internal(format!("Batch job registry poisoned: {}", e))
}

fn update_job(jobs: &JobMap, id: Uuid, apply: impl FnOnce(&mut BatchJob)) {
    if let Ok(mut jobs) = jobs.write() {
        if let Some(job) = jobs.get_mut(&id) {
            apply(job);
        }
    }
}

impl BatchService {
    pub fn new(runner: Arc<BatchRunner>) -> Self {
        Self {
            runner,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention: DEFAULT_BATCH_RETENTION,
        }
    }

    /// Keep finished jobs for `retention` after they finish
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Drop finished jobs older than the retention window; running jobs stay
    pub fn cleanup_old(&self) -> Result<usize, DomainError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.retention).unwrap_or_else(|_| chrono::Duration::hours(1));

        let mut jobs = self.jobs.write().map_err(lock_error)?;
        let before = jobs.len();
        jobs.retain(|_, job| job.finished_at.is_none_or(|finished| finished > cutoff));
        let removed = before - jobs.len();

        if removed > 0 {
            info!(removed, "Cleaned up old batch jobs");
        }

        Ok(removed)
    }

    pub fn chunk_size(&self) -> usize {
        self.runner.chunk_size()
    }

    /// Parse and check an upload, then start predicting it in the background.
    /// File-format problems are returned here, before the job exists.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn submit(
        &self,
        schema: Schema,
        target: PredictionTarget,
        file_name: Option<String>,
        bytes: &[u8],
    ) -> Result<BatchJobView, DomainError> {
        let table = BatchTable::from_bytes(bytes)?;
        table.prepare(schema)?;
        self.cleanup_old()?;

        let id = Uuid::new_v4();
        let job = BatchJob {
            id,
            schema,
            target: target.to_string(),
            file_name,
            status: BatchJobStatus::Running,
            progress: BatchProgress::start(table.len(), self.runner.chunk_size()),
            error: None,
            outcome: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        let view = BatchJobView::from(&job);

        self.jobs.write().map_err(lock_error)?.insert(id, job);
        info!(job_id = %id, rows = table.len(), "Batch job started");

        let runner = self.runner.clone();
        let jobs = self.jobs.clone();
        let span = tracing::info_span!("batch_job", job_id = %id);

        tokio::spawn(
            async move {
                let started = Instant::now();
                let rows = table.len();
                let progress_jobs = jobs.clone();

                let result = runner
                    .run(schema, &target, table, move |progress| {
                        update_job(&progress_jobs, id, |job| job.progress = progress);
                    })
                    .await;

                record_batch_run(rows, result.is_ok(), started.elapsed());

                match result {
                    Ok(outcome) => {
                        info!(rows = outcome.len(), "Batch job completed");
                        update_job(&jobs, id, |job| {
                            job.status = BatchJobStatus::Completed;
                            job.outcome = Some(Arc::new(outcome));
                            job.finished_at = Some(Utc::now());
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Batch job failed");
                        update_job(&jobs, id, |job| {
                            job.status = BatchJobStatus::Failed;
                            job.error = Some(e.to_string());
                            job.finished_at = Some(Utc::now());
                        });
                    }
                }
            }
            .instrument(span),
        );

        Ok(view)
    }

    /// Run a table to completion in the caller's task
    pub async fn run<F>(
        &self,
        schema: Schema,
        target: &PredictionTarget,
        table: BatchTable,
        on_progress: F,
    ) -> Result<BatchOutcome, BatchError>
    where
        F: Fn(BatchProgress) + Send + Sync,
    {
        let started = Instant::now();
        let rows = table.len();
        let result = self.runner.run(schema, target, table, on_progress).await;
        record_batch_run(rows, result.is_ok(), started.elapsed());
        result
    }

    fn job(&self, id: &str) -> Result<BatchJob, DomainError> {
        let uuid = Uuid::parse_str(id)
            .map_err(|_| DomainError::invalid_id(format!("Invalid batch job ID '{}'", id)))?;

        self.jobs
            .read()
            .map_err(lock_error)?
            .get(&uuid)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Batch job '{}' not found", id)))
    }

    pub fn get(&self, id: &str) -> Result<BatchJobView, DomainError> {
        Ok(BatchJobView::from(&self.job(id)?))
    }

    pub fn list(&self) -> Result<Vec<BatchJobView>, DomainError> {
        self.cleanup_old()?;
        let jobs = self.jobs.read().map_err(lock_error)?;
        let mut views: Vec<BatchJobView> = jobs.values().map(BatchJobView::from).collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    /// CSV of a completed job: every column, or only `columns` in that order
    pub fn export(&self, id: &str, columns: Option<&[String]>) -> Result<Vec<u8>, DomainError> {
        let job = self.job(id)?;

        match (job.status, job.outcome) {
            (BatchJobStatus::Completed, Some(outcome)) => Ok(outcome.to_csv(columns)?),
            (BatchJobStatus::Failed, _) => Err(DomainError::conflict(format!(
                "Batch job '{}' failed: {}",
                id,
                job.error.unwrap_or_default()
            ))),
            _ => Err(DomainError::conflict(format!(
                "Batch job '{}' is still running ({}%)",
                id,
                job.progress.percent()
            ))),
        }
    }
}
