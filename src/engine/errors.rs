use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

use crate::models::REQUIRED_FIELDS;

/// Fatal conditions that terminate a pipeline run. Delivered to the consumer
/// as the final item of the augmented stream.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Source stream is empty: no CSV header present")]
    EmptySource,
    #[error("Invalid CSV header: expected at least {expected} columns, got {got}")]
    InvalidHeader {
        expected: usize,
        got: usize
    },
    #[error("Source read failed: {0}")]
    SourceRead(String),
    #[error("Batch processing did not finish within {0:?}")]
    DeadlineExceeded(Duration),
    #[error("Errors occurred during batch processing")]
    ProcessingFailed,
    #[error("Consumer disconnected before the stream completed")]
    ConsumerGone
}

impl PipelineError {
    pub fn invalid_header(got: usize) -> Self {
        Self::InvalidHeader {
            expected: REQUIRED_FIELDS,
            got
        }
    }

    pub fn source_read(error: impl Display) -> Self {
        Self::SourceRead(error.to_string())
    }
}

/// Unexpected (non-parse) failures inside one batch. Per-row validation
/// failures never surface here: they degrade to the raw-hash fallback.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Sink closed while writing batch output")]
    SinkClosed,
    #[error("Row serialization failed: {0}")]
    Serialize(String),
    #[error("Batch task failed: {0}")]
    TaskFailed(String)
}

impl BatchError {
    pub fn serialize(error: impl Display) -> Self {
        Self::Serialize(error.to_string())
    }

    pub fn task_failed(error: impl Display) -> Self {
        Self::TaskFailed(error.to_string())
    }
}
