// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable content hashing for normalized text.

use sha2::{Digest, Sha256};

/// Normalize text before hashing or embedding: trim, collapse internal
/// whitespace runs to single spaces, lower-case.
///
/// Identical posts scraped with different surrounding whitespace must map to
/// the same hash, otherwise the cache and the dedup ledger both fragment.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SHA-256 of the normalized text, rendered as lowercase hex.
///
/// The key space is independent of embedding dimensionality: the same hash
/// identifies a post in the cache, the seen-posts ledger, and the diagnostic
/// samples.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_text(text).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_text("  Rust   is\t\tFast \n"),
            "rust is fast"
        );
    }

    #[test]
    fn identical_normalized_text_hashes_identically() {
        assert_eq!(
            content_hash("Hello   World"),
            content_hash("  hello world  ")
        );
    }

    #[test]
    fn distinct_text_hashes_differently() {
        assert_ne!(content_hash("hello world"), content_hash("hello worlds"));
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let h = content_hash("anything");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
