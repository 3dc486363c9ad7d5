use thiserror::Error;

use crate::models::transaction::REQUIRED_FIELDS;

/// A row-level decoding failure. The caller treats the whole row as
/// unparsable and takes the raw-hash fallback path instead of failing the
/// batch.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Expected at least {expected} fields, got {got}")]
    TooFewFields {
        expected: usize,
        got: usize
    },
    #[error("Field [{name}] at position [{index}] has malformed content: {content:?}")]
    MalformedField {
        index: usize,
        name: &'static str,
        content: String
    }
}

impl ValidationError {
    pub fn too_few_fields(got: usize) -> Self {
        Self::TooFewFields {
            expected: REQUIRED_FIELDS,
            got
        }
    }

    pub fn malformed_field(index: usize, name: &'static str, content: &str) -> Self {
        Self::MalformedField {
            index,
            name,
            content: content.to_string()
        }
    }
}
