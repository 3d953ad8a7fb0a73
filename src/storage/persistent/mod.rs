//! Durable storage backend.
//!
//! This module provides durable, crash-safe storage with:
//! - An append-only, CRC32-framed record log as the single table
//! - Directory locking for single-process access
//! - In-memory indexes rebuilt by replaying the log on open
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │            PersistentTimeSeriesStore           │
//! ├────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌───────────────────────┐  │
//! │  │  RecordLog   │   │  in-memory indexes    │  │
//! │  │ (append-only)│──▶│ (by entity / by year) │  │
//! │  └──────┬───────┘   └───────────────────────┘  │
//! │         │                                      │
//! │  ┌──────▼───────┐                              │
//! │  │  StoreLock   │                              │
//! │  └──────────────┘                              │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Records are write-once and never deleted, so the log never needs
//! compaction: its length is bounded by the number of seeded batches.

mod codec;
mod lock;
mod log;
mod store;

pub use lock::StoreLock;
pub use log::{LogEntry, LogIterator, RawRecord, RecordLog};
pub use store::{PersistentTimeSeriesStore, LOG_FILE};

use std::path::Path;

use super::traits::StorageError;

/// Configuration for the durable backend.
#[derive(Debug, Clone, Copy)]
pub struct PersistentConfig {
    /// Whether to fsync after every append (slower but safer).
    pub sync_on_write: bool,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}

/// Open or create a durable population store at the given path.
///
/// # Arguments
/// * `path` - Directory to store the log and lock files
/// * `config` - Optional configuration (uses defaults if None)
///
/// # Errors
/// - If the path cannot be created or accessed
/// - If another process holds the lock
/// - If replay finds a record violating the non-negativity invariant
///
/// # Example
/// ```rust,ignore
/// use popsim::storage::open_store;
///
/// let store = open_store("./population.popsim", None)?;
/// let snapshot = store.snapshot_at(Year::new(2023))?;
/// ```
pub fn open_store(
    path: impl AsRef<Path>,
    config: Option<PersistentConfig>,
) -> Result<PersistentTimeSeriesStore, StorageError> {
    let cfg = config.unwrap_or_default();
    PersistentTimeSeriesStore::open(path.as_ref(), cfg)
}
