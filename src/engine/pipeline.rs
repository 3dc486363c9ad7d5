use std::io::{BufReader, Read};
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use csv::{ReaderBuilder, StringRecord};
use futures::future::join_all;
use tokio::spawn;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, spawn_blocking};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::engine::batch::BATCH_SIZE;
use crate::engine::errors::PipelineError;
use crate::engine::pool::{Submission, WorkerPool};
use crate::engine::sink::{self, AugmentedStream, SinkWriter};
use crate::models::{REQUIRED_FIELDS, RawRow};

const COMPLETION_DEADLINE: Duration = Duration::from_secs(30);

/// Bound on rows in flight between the blocking CSV reader and the batching
/// loop; a slow pipeline stalls the reader here.
const ROW_BACKPRESSURE: usize = 256;

/// Set-once failure marker shared by the orchestrator and every in-flight
/// batch of one pipeline run.
#[derive(Clone, Default)]
pub struct ErrorFlag(Arc<AtomicBool>);

impl ErrorFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Streaming transform engine: turns a raw transaction CSV stream into the
/// same stream augmented with a per-row content hash.
pub struct StreamEngine {
    pool: Arc<WorkerPool>,
    batch_size: usize,
    deadline: Duration
}

impl StreamEngine {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(WorkerPool::new()),
            batch_size: BATCH_SIZE,
            deadline: COMPLETION_DEADLINE
        }
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool = Arc::new(WorkerPool::with_size(size));
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Starts processing and returns the augmented byte stream immediately,
    /// while reading, batching, and hashing continue in the background.
    ///
    /// The stream ends when the channel closes; a fatal condition arrives as
    /// a typed error item after whatever output was already produced.
    pub fn process<R: Read + Send + 'static>(&self, input: R) -> AugmentedStream {
        let (sink, stream) = sink::byte_pipe();
        let pool = Arc::clone(&self.pool);
        let batch_size = self.batch_size;
        let deadline = self.deadline;

        spawn(async move {
            if let Err(error) = drive(input, &sink, pool, batch_size, deadline).await {
                error!("Pipeline failed: {error}");
                sink.fail(error).await;
            }
        });

        stream
    }
}

/// Runs one pipeline end to end: header, batched body rows, completion wait.
async fn drive<R: Read + Send + 'static>(
    input: R,
    sink: &SinkWriter,
    pool: Arc<WorkerPool>,
    batch_size: usize,
    deadline: Duration
) -> Result<(), PipelineError> {
    let (header_sender, header_receiver) = oneshot::channel();
    let (row_sender, mut rows) = mpsc::channel(ROW_BACKPRESSURE);
    let reader = spawn_csv_reader(input, header_sender, row_sender);

    let header = match header_receiver.await {
        Ok(result) => result?,
        Err(_) => return Err(PipelineError::source_read("Source reader terminated unexpectedly"))
    };

    if header.len() < REQUIRED_FIELDS {
        return Err(PipelineError::invalid_header(header.len()));
    }

    let mut header_line = header.join(",");
    header_line.push_str(",hash\n");
    sink.write(header_line.into_bytes()).await.map_err(|_| PipelineError::ConsumerGone)?;

    let errors = ErrorFlag::default();
    let mut batch: Vec<RawRow> = Vec::with_capacity(batch_size);
    let mut submissions: Vec<Submission> = Vec::new();

    while let Some(event) = rows.recv().await {
        match event {
            Ok(row) => {
                batch.push(row);

                if batch.len() >= batch_size {
                    let full = mem::replace(&mut batch, Vec::with_capacity(batch_size));
                    submissions.push(pool.submit(full, sink.clone(), errors.clone()).await);
                }
            }
            Err(message) => {
                errors.set();
                return Err(PipelineError::SourceRead(message));
            }
        }
    }

    if !batch.is_empty() {
        submissions.push(pool.submit(batch, sink.clone(), errors.clone()).await);
    }

    debug!("Dispatched {} batches, awaiting completion", submissions.len());

    let completions = join_all(submissions.into_iter().map(Submission::finish));
    let results = timeout(deadline, completions)
        .await
        .map_err(|_| PipelineError::DeadlineExceeded(deadline))?;

    for result in results {
        if let Err(batch_error) = result {
            error!("Batch failed: {batch_error}");
            errors.set();
        }
    }

    if let Err(join_error) = reader.await {
        error!("CSV ingestion task failed: {join_error}");
        errors.set();
    }

    if errors.is_set() {
        return Err(PipelineError::ProcessingFailed);
    }

    Ok(())
}

/// Reads the source CSV on a blocking task: the first record goes out as the
/// header, every following record as a body row. Fields are not trimmed here
/// — the fallback path must see them verbatim.
fn spawn_csv_reader<R: Read + Send + 'static>(
    input: R,
    header: oneshot::Sender<Result<Vec<String>, PipelineError>>,
    rows: mpsc::Sender<Result<RawRow, String>>
) -> JoinHandle<()> {
    spawn_blocking(move || {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(input));
        let mut records = reader.into_records();

        let first = match records.next() {
            Some(Ok(record)) => Ok(to_fields(&record)),
            Some(Err(error)) => Err(PipelineError::source_read(error)),
            None => Err(PipelineError::EmptySource)
        };

        let failed = first.is_err();

        if header.send(first).is_err() || failed {
            return;
        }

        for result in records {
            let event = match result {
                Ok(record) => Ok(to_fields(&record)),
                Err(error) => Err(error.to_string())
            };
            let stop = event.is_err();

            if rows.blocking_send(event).is_err() || stop {
                break;
            }
        }
    })
}

fn to_fields(record: &StringRecord) -> Vec<String> {
    record.iter().map(|field| field.to_string()).collect()
}
