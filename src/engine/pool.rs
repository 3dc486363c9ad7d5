use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::available_parallelism;

use tokio::spawn;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::engine::batch;
use crate::engine::errors::BatchError;
use crate::engine::pipeline::ErrorFlag;
use crate::engine::sink::SinkWriter;
use crate::models::RawRow;

/// Upper bound on concurrent batch workers regardless of host parallelism.
pub const MAX_WORKERS: usize = 4;

/// Admitted-but-waiting batches per worker, the pool's bounded queue.
const QUEUE_FACTOR: usize = 2;

/// Fixed-size worker pool executing batch tasks.
///
/// `workers` gates execution, `admission` bounds execution plus a queue of
/// `QUEUE_FACTOR` batches per worker. The admission bound is what gives the
/// read loop its backpressure: once it is exhausted, submission degrades to
/// running the batch on the calling task.
pub struct WorkerPool {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_size(default_pool_size())
    }

    pub fn with_size(size: usize) -> Self {
        let size = size.max(1);

        Self {
            workers: Arc::new(Semaphore::new(size)),
            admission: Arc::new(Semaphore::new(size * (1 + QUEUE_FACTOR)))
        }
    }

    /// Submits a batch for processing.
    ///
    /// When the pool still has admission capacity the batch is spawned and a
    /// handle returned. When pool and queue are both saturated, the batch
    /// runs inline on the submitting task (caller-runs), throttling row
    /// reading to worker availability instead of queuing without bound.
    pub async fn submit(&self, rows: Vec<RawRow>, sink: SinkWriter, errors: ErrorFlag) -> Submission {
        match Arc::clone(&self.admission).try_acquire_owned() {
            Ok(ticket) => {
                let workers = Arc::clone(&self.workers);

                Submission::Spawned(spawn(async move {
                    let _ticket = ticket;

                    match workers.acquire_owned().await {
                        Ok(_worker) => batch::process_batch(&rows, &sink, &errors).await,
                        Err(_) => {
                            errors.set();
                            Err(BatchError::task_failed("Worker pool closed before the batch could run"))
                        }
                    }
                }))
            }
            Err(_) => Submission::Completed(batch::process_batch(&rows, &sink, &errors).await)
        }
    }
}

fn default_pool_size() -> usize {
    available_parallelism().map_or(1, NonZeroUsize::get).min(MAX_WORKERS)
}

/// The outcome handle for one submitted batch: either a spawned task to
/// await or a result already produced by a caller-runs submission.
pub enum Submission {
    Spawned(JoinHandle<Result<(), BatchError>>),
    Completed(Result<(), BatchError>)
}

impl Submission {
    pub async fn finish(self) -> Result<(), BatchError> {
        match self {
            Self::Completed(result) => result,
            Self::Spawned(handle) => match handle.await {
                Ok(result) => result,
                Err(error) => Err(BatchError::task_failed(error))
            }
        }
    }
}
