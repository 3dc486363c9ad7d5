use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::errors::{BatchError, PipelineError};

/// Flush threshold for batch output; writers hand the sink whole-line chunks
/// of roughly this size.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// In-flight chunk bound. Together with `CHUNK_SIZE` this caps the pipe at
/// ~64 KiB, so a slow consumer stalls the producer side instead of growing
/// the buffer.
const PIPE_DEPTH: usize = 8;

type SinkEvent = Result<Vec<u8>, PipelineError>;

/// Creates the bounded byte pipe connecting the pipeline to its consumer.
pub fn byte_pipe() -> (SinkWriter, AugmentedStream) {
    let (sender, receiver) = mpsc::channel::<SinkEvent>(PIPE_DEPTH);

    (SinkWriter { sender }, AugmentedStream { receiver })
}

/// Producer half of the byte pipe, cloned into every batch task.
///
/// Each send enqueues one whole-line chunk, so concurrently running batches
/// can interleave only at line boundaries, and chunks from one writer are
/// delivered in the order they were written.
#[derive(Clone)]
pub struct SinkWriter {
    sender: mpsc::Sender<SinkEvent>
}

impl SinkWriter {
    /// Appends a chunk, waiting while the pipe is full.
    ///
    /// # Errors
    /// Returns `BatchError::SinkClosed` once the consumer has dropped the
    /// stream.
    pub async fn write(&self, chunk: Vec<u8>) -> Result<(), BatchError> {
        self.sender.send(Ok(chunk)).await.map_err(|_| BatchError::SinkClosed)
    }

    /// Delivers a fatal pipeline error as the stream's final item.
    pub async fn fail(&self, error: PipelineError) {
        if self.sender.send(Err(error)).await.is_err() {
            debug!("Consumer was gone before the failure could be delivered");
        }
    }
}

/// Consumer half of the byte pipe: the augmented CSV as it is produced.
///
/// Reads suspend until bytes are available; the channel closing marks clean
/// completion, and a pipeline failure arrives as a typed `Err` item rather
/// than a silent truncation.
pub struct AugmentedStream {
    receiver: mpsc::Receiver<SinkEvent>
}

impl AugmentedStream {
    /// Waits for the next chunk of augmented output. `None` means the
    /// stream completed cleanly.
    pub async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, PipelineError>> {
        self.receiver.recv().await
    }

    /// Drains the whole stream into memory. Partial output is discarded if
    /// the pipeline fails; callers that need the truncated bytes should
    /// drain with [`AugmentedStream::next_chunk`] instead.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>, PipelineError> {
        let mut output = Vec::new();

        while let Some(chunk) = self.receiver.recv().await {
            output.extend_from_slice(&chunk?);
        }

        Ok(output)
    }
}
