mod errors;
#[cfg(test)]
mod tests;
mod transaction;

pub use errors::ValidationError;
pub use transaction::{REQUIRED_FIELDS, TransactionRecord};

/// The unquoted, untrimmed fields extracted from one CSV line.
pub type RawRow = Vec<String>;
