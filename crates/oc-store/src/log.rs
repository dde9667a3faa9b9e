//! Append-only operation log backing [`FileBucketStore`](crate::FileBucketStore).
//!
//! On-disk format, one frame per operation:
//! ```text
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode-serialized LogRecord)]
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use oc_types::Bucket;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Flush/sync strategy for the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write.
    EveryWrite,
    /// Hand every write to the OS and let it decide when to sync.
    #[default]
    OsDefault,
}

/// A single store mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRecord {
    Put {
        bucket: Bucket,
        key: u64,
        value: Vec<u8>,
    },
    Delete {
        bucket: Bucket,
        key: u64,
    },
}

/// Writer half of the log. Callers serialize access to it.
///
/// Every append either lands as one whole frame or leaves the file as it
/// was. If a failed append cannot be cut back off, the writer refuses all
/// further appends.
pub(crate) struct LogWriter {
    file: File,
    offset: u64,
    sync_mode: SyncMode,
    broken: bool,
}

impl LogWriter {
    /// Open (or create) the log for appending.
    pub(crate) fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();
        Ok(Self {
            file,
            offset,
            sync_mode,
            broken: false,
        })
    }

    /// Append one record. Returns the byte offset of its frame.
    pub(crate) fn append(&mut self, record: &LogRecord) -> StoreResult<u64> {
        if self.broken {
            return Err(StoreError::LogBroken);
        }
        let frame = encode_frame(record)?;
        let entry_offset = self.offset;
        if let Err(e) = self.write_synced(&frame) {
            self.discard_tail();
            return Err(e);
        }
        self.offset += frame.len() as u64;
        debug!(offset = entry_offset, len = frame.len(), "log append");
        Ok(entry_offset)
    }

    /// Current end-of-log offset.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn flush(&mut self) -> StoreResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn write_synced(&mut self, frame: &[u8]) -> StoreResult<()> {
        self.file.write_all(frame)?;
        if self.sync_mode == SyncMode::EveryWrite {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Cut the file back to the end of the last complete frame.
    fn discard_tail(&mut self) {
        match self.file.set_len(self.offset) {
            Ok(()) => warn!(offset = self.offset, "failed append rolled back"),
            Err(e) => {
                warn!(offset = self.offset, error = %e, "cannot roll back failed append");
                self.broken = true;
            }
        }
    }
}

fn encode_frame(record: &LogRecord) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = payload.len() as u32;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Read every intact record from the log, front to back.
///
/// Frames failing the CRC check are skipped; a truncated or zero-length
/// frame ends recovery (it is a torn tail from an interrupted write).
pub(crate) fn replay(path: &Path) -> StoreResult<Vec<LogRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE as u64 <= file_len {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
            warn!(offset, length, file_len, "invalid log frame length; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        reader.read_exact(&mut payload)?;
        offset += HEADER_SIZE as u64 + length as u64;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping log frame"
            );
            continue;
        }

        match bincode::deserialize::<LogRecord>(&payload) {
            Ok(record) => records.push(record),
            Err(e) => warn!(offset, error = %e, "undecodable log frame; skipping"),
        }
    }

    debug!(recovered = records.len(), "log replay complete");
    Ok(records)
}

/// Atomically replace the log at `path` with exactly `records`.
///
/// The new log is written to a temporary file in the same directory and
/// renamed over the old one, so a crash leaves either the old or the new log.
pub(crate) fn rewrite<I>(path: &Path, records: I, sync_mode: SyncMode) -> StoreResult<LogWriter>
where
    I: IntoIterator<Item = LogRecord>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        for record in records {
            out.write_all(&encode_frame(&record)?)?;
        }
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    LogWriter::open(path, sync_mode)
}
