//! Result ledger - append-only, fixed-column CSV of per-epoch metrics
//!
//! **Append-Only Write Pattern**:
//! - The header row is written exactly once, when the file is absent (or empty)
//! - Every later call appends one data row and never touches earlier rows
//! - "Has a header been written" is derived from the file on disk, not from
//!   in-memory state, so a restarted process resumes appending correctly
//!
//! Column order is a compatibility contract for downstream plotting and
//! leaderboard tooling, which reads columns by position:
//!
//! ```text
//! epoch,val_loss,train_loss,val_accuracy,train_accuracy,val_score,train_score
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Result of one validation pass.
///
/// `epoch` is the 0-based epoch index; losses are non-negative and
/// accuracy/score lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// 0-based epoch index
    pub epoch: u64,
    /// Validation loss
    pub val_loss: f64,
    /// Training loss
    pub train_loss: f64,
    /// Validation accuracy
    pub val_accuracy: f64,
    /// Training accuracy
    pub train_accuracy: f64,
    /// Validation ranking score (ROC-AUC)
    pub val_score: f64,
    /// Training ranking score (ROC-AUC)
    pub train_score: f64,
}

impl MetricSnapshot {
    /// Check every field against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MetricComputation`] naming the first field that is
    /// non-finite, a negative loss, or a ratio outside `[0, 1]`.
    pub fn check(&self) -> Result<()> {
        check_loss("val_loss", self.val_loss)?;
        check_loss("train_loss", self.train_loss)?;
        check_unit("val_accuracy", self.val_accuracy)?;
        check_unit("train_accuracy", self.train_accuracy)?;
        check_unit("val_score", self.val_score)?;
        check_unit("train_score", self.train_score)?;
        Ok(())
    }
}

/// Reject a loss that is NaN, infinite or negative.
pub(crate) fn check_loss(metric: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::metric(metric, format!("non-finite value {value}")));
    }
    if value < 0.0 {
        return Err(Error::metric(metric, format!("negative loss {value}")));
    }
    Ok(value)
}

/// Reject a ratio outside `[0, 1]`.
pub(crate) fn check_unit(metric: &str, value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::metric(metric, format!("value {value} outside [0, 1]")));
    }
    Ok(value)
}

/// One ledger row: a flattened [`MetricSnapshot`] in fixed column order.
///
/// The `epoch` column is 1-based (the Nth completed epoch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// 1-based epoch number
    pub epoch: u64,
    /// Validation loss
    pub val_loss: f64,
    /// Training loss
    pub train_loss: f64,
    /// Validation accuracy
    pub val_accuracy: f64,
    /// Training accuracy
    pub train_accuracy: f64,
    /// Validation score
    pub val_score: f64,
    /// Training score
    pub train_score: f64,
}

impl LedgerEntry {
    /// Header row, in column order.
    pub const HEADER: [&'static str; 7] = [
        "epoch",
        "val_loss",
        "train_loss",
        "val_accuracy",
        "train_accuracy",
        "val_score",
        "train_score",
    ];
}

impl TryFrom<&MetricSnapshot> for LedgerEntry {
    type Error = Error;

    /// Flatten `snapshot`, converting its epoch index to a 1-based number.
    ///
    /// Fails with [`Error::InvalidInput`] for the index `u64::MAX`, which has
    /// no 1-based counterpart.
    fn try_from(snapshot: &MetricSnapshot) -> Result<Self> {
        let epoch = snapshot.epoch.checked_add(1).ok_or_else(|| {
            Error::InvalidInput(format!(
                "epoch index {} has no 1-based ledger number",
                snapshot.epoch
            ))
        })?;
        Ok(Self {
            epoch,
            val_loss: snapshot.val_loss,
            train_loss: snapshot.train_loss,
            val_accuracy: snapshot.val_accuracy,
            train_accuracy: snapshot.train_accuracy,
            val_score: snapshot.val_score,
            train_score: snapshot.train_score,
        })
    }
}

/// Append-only CSV ledger for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLedger {
    path: PathBuf,
}

impl ResultLedger {
    /// Ledger file name inside a run directory.
    pub const FILE_NAME: &'static str = "result.csv";

    /// Ledger stored as `result.csv` under `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(Self::FILE_NAME))
    }

    /// Ledger stored at an explicit path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the ledger file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one row, preceded by the header if the file is absent or empty.
    ///
    /// The header (when needed) and the row are encoded in memory first. If
    /// writing them fails part-way, the file is cut back to its previous
    /// length, so a row lands whole or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerWrite`] if the file cannot be opened or written.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;

        let before = file
            .metadata()
            .map_err(|source| self.write_error(source))?
            .len();
        let needs_header = before == 0;

        let bytes = encode_row(entry, needs_header)?;

        write_or_rewind(&mut file, before, &bytes).map_err(|source| {
            tracing::error!(path = %self.path.display(), epoch = entry.epoch, error = %source, "ledger append failed");
            self.write_error(source)
        })?;

        tracing::debug!(
            path = %self.path.display(),
            epoch = entry.epoch,
            header = needs_header,
            "appended ledger row"
        );
        Ok(())
    }

    /// Read every row back, in file order.
    ///
    /// A missing file reads as an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn read_entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let header = reader.headers()?.clone();
        if header.iter().ne(LedgerEntry::HEADER) {
            return Err(Error::Other(format!(
                "unexpected ledger header in {}: {:?}",
                self.path.display(),
                header
            )));
        }

        reader
            .deserialize::<LedgerEntry>()
            .map(|row| row.map_err(Error::from))
            .collect()
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::LedgerWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// A ledger destination that can be cut back to an earlier length.
trait Rewind: Write {
    fn rewind_to(&mut self, len: u64) -> io::Result<()>;
}

impl Rewind for File {
    fn rewind_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write `bytes` after `before` bytes of existing content, or leave exactly
/// those `before` bytes behind.
fn write_or_rewind<W: Rewind>(sink: &mut W, before: u64, bytes: &[u8]) -> io::Result<()> {
    let written = sink.write_all(bytes).and_then(|()| sink.flush());
    if written.is_err() {
        if let Err(rewind) = sink.rewind_to(before) {
            tracing::error!(error = %rewind, len = before, "could not remove partial ledger row");
        }
    }
    written
}

fn encode_row(entry: &LedgerEntry, with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        writer.write_record(LedgerEntry::HEADER)?;
    }
    writer.serialize(entry)?;
    writer
        .into_inner()
        .map_err(|e| Error::Other(format!("failed to encode ledger row: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(epoch: u64, val_loss: f64) -> LedgerEntry {
        LedgerEntry {
            epoch,
            val_loss,
            train_loss: 0.5,
            val_accuracy: 0.7,
            train_accuracy: 0.8,
            val_score: 0.6,
            train_score: 0.65,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(dir.path());

        for epoch in 1..=3 {
            ledger.append(&entry(epoch, 1.0)).unwrap();
        }

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "epoch,val_loss,train_loss,val_accuracy,train_accuracy,val_score,train_score"
        );
        assert_eq!(text.matches("epoch,").count(), 1);
        assert!(lines[1].starts_with("1,"));
        assert!(lines[3].starts_with("3,"));
    }

    #[test]
    fn test_existing_file_gets_no_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let first = ResultLedger::in_dir(dir.path());
        first.append(&entry(1, 1.0)).unwrap();

        // A fresh handle over the same file, as after a restart.
        let second = ResultLedger::in_dir(dir.path());
        second.append(&entry(2, 0.9)).unwrap();

        let text = std::fs::read_to_string(second.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.matches("val_loss").count(), 1);
    }

    #[test]
    fn test_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(dir.path());
        std::fs::write(ledger.path(), "").unwrap();

        ledger.append(&entry(1, 1.0)).unwrap();

        let entries = ledger.read_entries().unwrap();
        assert_eq!(entries, vec![entry(1, 1.0)]);
    }

    #[test]
    fn test_read_back_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(dir.path());
        let rows = vec![entry(1, 0.123_456_789), entry(2, 1e-9), entry(3, 42.0)];
        for row in &rows {
            ledger.append(row).unwrap();
        }
        assert_eq!(ledger.read_entries().unwrap(), rows);
    }

    #[test]
    fn test_missing_ledger_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(dir.path());
        assert!(!ledger.exists());
        assert!(ledger.read_entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(&dir.path().join("gone"));
        let err = ledger.append(&entry(1, 1.0)).unwrap_err();
        assert!(matches!(err, Error::LedgerWrite { .. }));
    }

    /// Accepts `capacity` bytes in total, then fails like a full disk.
    struct ShortWriter {
        data: Vec<u8>,
        capacity: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.data.len());
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
            }
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Rewind for ShortWriter {
        fn rewind_to(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(usize::try_from(len).unwrap());
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_partial_row() {
        let existing = encode_row(&entry(1, 1.0), true).unwrap();
        let row = encode_row(&entry(2, 0.123_456_789), false).unwrap();
        let mut sink = ShortWriter {
            data: existing.clone(),
            capacity: existing.len() + row.len() / 2,
        };

        let err = write_or_rewind(&mut sink, existing.len() as u64, &row).unwrap_err();

        assert_eq!(err.to_string(), "no space left on device");
        assert_eq!(sink.data, existing);
    }

    #[test]
    fn test_rewound_ledger_accepts_the_next_row_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ResultLedger::in_dir(dir.path());
        ledger.append(&entry(1, 1.0)).unwrap();
        let before = std::fs::metadata(ledger.path()).unwrap().len();

        // Simulate a torn row, then rewind it through the file handle.
        let mut file = OpenOptions::new().append(true).open(ledger.path()).unwrap();
        file.write_all(b"2,0.12").unwrap();
        file.rewind_to(before).unwrap();
        drop(file);

        ledger.append(&entry(2, 0.9)).unwrap();
        assert_eq!(ledger.read_entries().unwrap(), vec![entry(1, 1.0), entry(2, 0.9)]);
    }

    #[test]
    fn test_successful_write_keeps_existing_bytes() {
        let mut sink = ShortWriter {
            data: b"head\n".to_vec(),
            capacity: usize::MAX,
        };
        write_or_rewind(&mut sink, 5, b"row\n").unwrap();
        assert_eq!(sink.data, b"head\nrow\n");
    }

    #[test]
    fn test_entry_from_snapshot_is_one_based() {
        let snapshot = MetricSnapshot {
            epoch: 0,
            val_loss: 1.0,
            train_loss: 2.0,
            val_accuracy: 0.1,
            train_accuracy: 0.2,
            val_score: 0.3,
            train_score: 0.4,
        };
        let row = LedgerEntry::try_from(&snapshot).unwrap();
        assert_eq!(row.epoch, 1);
        assert!((row.train_score - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entry_from_last_epoch_index_is_rejected() {
        let snapshot = MetricSnapshot {
            epoch: u64::MAX,
            val_loss: 1.0,
            train_loss: 1.0,
            val_accuracy: 0.5,
            train_accuracy: 0.5,
            val_score: 0.5,
            train_score: 0.5,
        };
        assert!(matches!(
            LedgerEntry::try_from(&snapshot),
            Err(Error::InvalidInput(_))
        ));

        let previous = MetricSnapshot {
            epoch: u64::MAX - 1,
            ..snapshot
        };
        assert_eq!(LedgerEntry::try_from(&previous).unwrap().epoch, u64::MAX);
    }

    #[test]
    fn test_snapshot_check_rejects_out_of_range() {
        let ok = MetricSnapshot {
            epoch: 3,
            val_loss: 0.0,
            train_loss: 0.2,
            val_accuracy: 1.0,
            train_accuracy: 0.0,
            val_score: 0.5,
            train_score: 0.5,
        };
        assert!(ok.check().is_ok());

        let nan_loss = MetricSnapshot {
            val_loss: f64::NAN,
            ..ok
        };
        assert!(matches!(
            nan_loss.check(),
            Err(Error::MetricComputation { metric, .. }) if metric == "val_loss"
        ));

        let big_score = MetricSnapshot {
            train_score: 1.5,
            ..ok
        };
        assert!(matches!(
            big_score.check(),
            Err(Error::MetricComputation { metric, .. }) if metric == "train_score"
        ));

        let negative = MetricSnapshot {
            train_loss: -0.1,
            ..ok
        };
        assert!(negative.check().is_err());
    }
}
