//! Fingerprints of collections and other serializable values.

use collmerge_core::model::Collection;
use serde::Serialize;

use crate::canonical_json::to_canonical_json_bytes;

/// Return lowercase hex SHA-256 of bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hash canonical JSON bytes using SHA-256 and return lowercase hex.
pub fn sha256_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Content fingerprint of a collection.
///
/// Equal for two collections that differ only in object key order or
/// whitespace; any change to a value or to array order changes it.
pub fn collection_fingerprint(collection: &Collection) -> Result<String, serde_json::Error> {
    sha256_canonical_json(collection)
}
