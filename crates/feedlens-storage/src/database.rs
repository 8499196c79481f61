// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and schema.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. The `Database` struct IS the single writer; query code accepts
//! `&Database` and calls through `connection().call()`.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use feedlens_core::FeedlensError;

/// Map a tokio-rusqlite error into the storage error taxonomy.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> FeedlensError {
    FeedlensError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite connection.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply pragmas, and ensure
    /// the schema exists.
    pub async fn open(path: &Path) -> Result<Self, FeedlensError> {
        let connection = Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        connection
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;

                     CREATE TABLE IF NOT EXISTS kv (
                         key   TEXT PRIMARY KEY,
                         value TEXT NOT NULL
                     );",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(path = %path.display(), "database opened");
        Ok(Database { connection })
    }

    /// The underlying serialized connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Flush the WAL and close the connection.
    pub async fn close(self) -> Result<(), FeedlensError> {
        self.connection
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.connection.close().await.map_err(map_tr_err)
    }
}
