//! Sequential chunked batch prediction

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::{BatchError, BatchOutcome, BatchProgress, BatchTable};
use crate::domain::classifier::ClassifierBackend;
use crate::domain::prediction::PredictionTarget;
use crate::domain::schema::Schema;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Runs every row of a table through the classifier, one chunk at a time.
/// Rows of a chunk are sent together and all answers are awaited before the
/// next chunk starts; the first failure stops the run.
pub struct BatchRunner {
    backend: Arc<dyn ClassifierBackend>,
    chunk_size: usize,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl BatchRunner {
    pub fn new(backend: Arc<dyn ClassifierBackend>) -> Self {
        Self::with_chunk_size(backend, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(backend: Arc<dyn ClassifierBackend>, chunk_size: usize) -> Self {
        Self {
            backend,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Validate `table` against `schema`, then predict every row. `on_progress`
    /// is called once before the first chunk and once after each chunk.
    #[instrument(skip(self, table, on_progress), fields(target = %target, rows = table.len()))]
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
        let vectors = table.prepare(schema)?;

        let mut progress = BatchProgress::start(vectors.len(), self.chunk_size);
        on_progress(progress);

        info!(
            rows = vectors.len(),
            chunks = progress.total_chunks,
            "Starting batch prediction"
        );

        let mut predictions = Vec::with_capacity(vectors.len());

        for (chunk_idx, chunk) in vectors.chunks(self.chunk_size).enumerate() {
            let offset = chunk_idx * self.chunk_size;

            let results = join_all(
                chunk
                    .iter()
                    .map(|features| self.backend.predict(target, features)),
            )
            .await;

            for result in results {
                match result {
                    Ok(prediction) => predictions.push(prediction),
                    Err(e) => {
                        warn!(offset, error = %e, "Batch chunk failed, aborting run");
                        return Err(BatchError::ChunkFailed {
                            offset,
                            message: e.user_message(),
                        });
                    }
                }
            }

            progress = progress.chunk_done(chunk.len());
            debug!(
                offset,
                percent = progress.percent(),
                "Batch chunk completed"
            );
            on_progress(progress);
        }

        info!(rows = predictions.len(), "Batch prediction finished");

        Ok(BatchOutcome::new(table, predictions))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::batch::table::tests::tess_csv;
    use crate::domain::classifier::MockClassifierBackend;
    use crate::domain::prediction::PredictionResult;
    use crate::domain::DomainError;

    fn table(rows: usize) -> BatchTable {
        BatchTable::from_bytes(tess_csv(rows).as_bytes()).unwrap()
    }

    fn counting_backend(calls: Arc<AtomicUsize>, fail_on: Option<f64>) -> MockClassifierBackend {
        let mut backend = MockClassifierBackend::new();
        backend.expect_predict().returning(move |_, features| {
            calls.fetch_add(1, Ordering::SeqCst);
            if Some(features.values()[0]) == fail_on {
                return Err(DomainError::backend_status(500, "model file missing"));
            }
            Ok(PredictionResult::new("PC", 0.75))
        });
        backend
    }

    #[tokio::test]
    async fn test_processes_rows_in_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = BatchRunner::new(Arc::new(counting_backend(calls.clone(), None)));
        let seen = Mutex::new(Vec::new());

        let outcome = runner
            .run(
                Schema::Tess,
                &PredictionTarget::Base(Schema::Tess),
                table(25),
                |p| seen.lock().unwrap().push(p),
            )
            .await
            .unwrap();

        assert_eq!(outcome.len(), 25);
        assert_eq!(calls.load(Ordering::SeqCst), 25);

        let seen = seen.into_inner().unwrap();
        let percents: Vec<u8> = seen.iter().map(|p| p.percent()).collect();
        assert_eq!(percents, vec![0, 40, 80, 100]);
        assert_eq!(seen.last().unwrap().completed_chunks, 3);
        assert_eq!(seen.last().unwrap().total_chunks, 3);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        // row 12 carries pl_orbper = 13.5
        let runner = BatchRunner::new(Arc::new(counting_backend(calls.clone(), Some(13.5))));
        let seen = Mutex::new(Vec::new());

        let err = runner
            .run(
                Schema::Tess,
                &PredictionTarget::Base(Schema::Tess),
                table(35),
                |p| seen.lock().unwrap().push(p),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BatchError::ChunkFailed {
                offset: 10,
                message: "model file missing".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert!(seen.lock().unwrap().iter().all(|p| p.percent() < 100));
    }

    #[tokio::test]
    async fn test_missing_column_makes_no_calls() {
        let mut backend = MockClassifierBackend::new();
        backend.expect_predict().times(0);
        let runner = BatchRunner::new(Arc::new(backend));

        let result = runner
            .run(
                Schema::Kepler,
                &PredictionTarget::Base(Schema::Kepler),
                table(5),
                |_| {},
            )
            .await;

        assert!(matches!(result, Err(BatchError::MissingColumns { .. })));
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let runner = BatchRunner::with_chunk_size(Arc::new(MockClassifierBackend::new()), 0);
        assert_eq!(runner.chunk_size(), 1);
    }
}
