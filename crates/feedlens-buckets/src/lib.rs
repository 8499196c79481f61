// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily engagement aggregation for Feedlens.
//!
//! One [`DailyBucket`] per local calendar date accumulates engagement time,
//! domain/content-type/topic histograms, a per-post dedup ledger, and running
//! classifier-confidence statistics. [`BucketStore`] persists buckets through
//! the key/value contract with an explicit day index.

pub mod store;
pub mod types;

pub use store::BucketStore;
pub use types::{ConfidenceStat, DailyBucket, EmbeddingSample, SeenPost};
