//! Append-only record log.
//!
//! Because population records are write-once and never mutated or deleted,
//! the log is not a recovery sidecar — it IS the table. Each appended entry
//! is one seeded batch, framed and checksummed as a unit, which is what
//! makes a batch atomic: a torn write fails the frame's CRC and the whole
//! batch is ignored on replay.
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [ENTRY 1: codec-encoded LogEntry]
//! [ENTRY 2: codec-encoded LogEntry]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Result as IoResult, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec;

/// One stored record as it appears on disk.
///
/// The wire type mirrors the original schema
/// (`entity TEXT, year INTEGER, population INTEGER`): population is a
/// signed integer so that a corrupt or hand-edited negative value can be
/// detected and rejected on replay instead of wrapping silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Entity identifier.
    pub entity: String,
    /// Year of the value.
    pub year: i32,
    /// Population count; must be non-negative to be accepted.
    pub population: i64,
}

/// A single entry in the record log: one atomically-seeded batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonically increasing sequence number.
    pub sequence: u64,
    /// When this entry was written.
    pub recorded_at: DateTime<Utc>,
    /// The records seeded together.
    pub batch: Vec<RawRecord>,
}

/// Append-only log of seeded record batches.
///
/// Thread-safe via internal mutex.
#[derive(Debug)]
pub struct RecordLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    current_sequence: Mutex<u64>,
    sync_on_write: bool,
}

impl RecordLog {
    /// Open or create a log file.
    ///
    /// If the file exists, reads the last sequence number. If it doesn't,
    /// creates it with the header.
    pub fn open(path: &Path, sync_on_write: bool) -> IoResult<Self> {
        let exists = path.exists();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let current_sequence = if exists && file.metadata()?.len() >= 5 {
            Self::find_last_sequence(path)?
        } else {
            // New file, write header
            let mut file = file;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
            0
        };

        // Reopen for appending
        let file = OpenOptions::new().append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            current_sequence: Mutex::new(current_sequence),
            sync_on_write,
        })
    }

    /// Append a batch to the log.
    ///
    /// Returns the sequence number assigned to the entry.
    pub fn append(&self, batch: Vec<RawRecord>) -> IoResult<u64> {
        let mut writer = self.writer.lock().unwrap();
        let mut seq_guard = self.current_sequence.lock().unwrap();

        let candidate = *seq_guard + 1;
        let entry = LogEntry {
            sequence: candidate,
            recorded_at: Utc::now(),
            batch,
        };

        let encoded = codec::encode(&entry)?;

        writer.write_all(&encoded)?;
        writer.flush()?;

        if self.sync_on_write {
            writer.get_ref().sync_all()?;
        }

        *seq_guard = candidate;

        Ok(candidate)
    }

    /// Iterate over all entries in the log.
    ///
    /// Used on open to rebuild the in-memory indexes.
    pub fn iter(&self) -> IoResult<LogIterator> {
        LogIterator::new(&self.path)
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> u64 {
        *self.current_sequence.lock().unwrap()
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn find_last_sequence(path: &Path) -> IoResult<u64> {
        let mut last_seq = 0;

        for entry_result in LogIterator::new(path)? {
            match entry_result {
                Ok(entry) => last_seq = entry.sequence,
                Err(e) => {
                    // Stop at the corruption point; everything before it
                    // still replays.
                    eprintln!(
                        "record log: corruption detected after sequence {last_seq}: {e}"
                    );
                    break;
                }
            }
        }

        Ok(last_seq)
    }
}

/// Iterator over log entries.
pub struct LogIterator {
    reader: BufReader<File>,
    file_size: u64,
}

impl LogIterator {
    fn new(path: &Path) -> IoResult<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        // Skip header
        let _version = codec::read_header(&mut reader)?;

        Ok(Self { reader, file_size })
    }

    fn at_eof(&mut self) -> IoResult<bool> {
        let pos = self.reader.stream_position()?;
        Ok(pos >= self.file_size)
    }
}

impl Iterator for LogIterator {
    type Item = IoResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.at_eof() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => return Some(Err(e)),
        }

        match codec::decode(&mut self.reader) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }
}
