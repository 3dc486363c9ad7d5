
use sha2::{Digest, Sha256};

/// Computes the content hash for an ordered sequence of field values.
///
/// The digest is SHA-256 over the UTF-8 bytes of the values joined with `,`
/// (an absent value contributes an empty string), rendered as 64 lowercase
/// hex characters. The same values always produce the same digest on every
/// platform, which is what lets consumers detect tampered or duplicated rows.
pub fn hash_fields<S: AsRef<str>>(values: &[S]) -> String {
    let mut hasher = Sha256::new();

    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            hasher.update(b",");
        }
        hasher.update(value.as_ref().as_bytes());
    }

    hex::encode(hasher.finalize())
}
