// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Day rollover scheduling for Feedlens.
//!
//! A periodic tick drives [`RolloverScheduler`], which detects day
//! boundaries, selects the bucket to summarize, enforces the minimum-data
//! threshold, invokes recommendation generation at most once per qualifying
//! day through [`InvokerChain`], and retires stale buckets.

pub mod invoker;
pub mod rollover;

pub use invoker::InvokerChain;
pub use rollover::{RecommendationRecord, RolloverScheduler, MIN_SUMMARY_MS};
