//! Cache key derivation.
//!
//! Two texts that normalize identically must map to the same entry, so
//! keys are derived from the normalized form. SHA-256 keeps keys stable
//! across processes — an external shared store can reuse them as-is.

use sha2::{Digest, Sha256};

/// Normalize text for key derivation.
///
/// Lowercases, trims, and collapses internal whitespace runs to a single
/// space. Pure and total: any string is valid input, and empty input
/// yields empty output. Normalization only ever affects the key, never
/// the cached value.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the cache key for a text.
///
/// Hex digest of SHA-256 over the normalized text.
pub fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    format!("{:x}", hasher.finalize())
}
