use std::mem;

use tracing::debug;

use crate::engine::errors::BatchError;
use crate::engine::pipeline::ErrorFlag;
use crate::engine::sink::{CHUNK_SIZE, SinkWriter};
use crate::hashing;
use crate::models::{RawRow, TransactionRecord};

/// Maximum number of source rows one batch carries.
pub const BATCH_SIZE: usize = 5000;

/// Processes one batch of raw rows and appends their augmented lines to the
/// shared sink.
///
/// Rows are written in batch order, buffered into whole-line chunks so the
/// sink never sees a partial line. A row that fails structured decoding
/// degrades to the raw-hash fallback instead of failing the batch; only an
/// unexpected failure (the consumer dropping the stream, a serialization
/// error) is fatal, and it marks the shared error flag before propagating.
pub async fn process_batch(rows: &[RawRow], sink: &SinkWriter, errors: &ErrorFlag) -> Result<(), BatchError> {
    match write_rows(rows, sink).await {
        Ok(()) => Ok(()),
        Err(error) => {
            errors.set();
            Err(error)
        }
    }
}

async fn write_rows(rows: &[RawRow], sink: &SinkWriter) -> Result<(), BatchError> {
    let mut chunk: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);

    for row in rows {
        let line = augment_row(row)?;
        chunk.extend_from_slice(line.as_bytes());

        if chunk.len() >= CHUNK_SIZE {
            let full = mem::replace(&mut chunk, Vec::with_capacity(CHUNK_SIZE));
            sink.write(full).await?;
        }
    }

    if !chunk.is_empty() {
        sink.write(chunk).await?;
    }

    Ok(())
}

/// Maps one raw row to its augmented output line, terminated with `\n`.
fn augment_row(row: &RawRow) -> Result<String, BatchError> {
    match TransactionRecord::parse(row) {
        Ok(mut record) => {
            record.attach_hash();
            serialize_record(&record)
        }
        Err(error) => {
            debug!("Row failed structured decoding, taking the raw-hash fallback: {error}");
            Ok(fallback_line(row))
        }
    }
}

/// Degrade-gracefully path: the verbatim comma-joined row plus the digest of
/// that same joined form. One malformed row must never abort the stream.
fn fallback_line(row: &[String]) -> String {
    let mut line = row.join(",");
    line.push(',');
    line.push_str(&hashing::hash_fields(row));
    line.push('\n');
    line
}

fn serialize_record(record: &TransactionRecord) -> Result<String, BatchError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.serialize(record).map_err(BatchError::serialize)?;

    let buffer = writer.into_inner().map_err(BatchError::serialize)?;

    String::from_utf8(buffer).map_err(BatchError::serialize)
}
