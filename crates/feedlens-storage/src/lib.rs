// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Feedlens engine.
//!
//! Implements the key/value contract over a single `kv` table. All access
//! is serialized through tokio-rusqlite's single background thread; do NOT
//! create additional Connection instances for writes.

pub mod database;
pub mod kv;

pub use database::Database;
pub use kv::SqliteKv;
