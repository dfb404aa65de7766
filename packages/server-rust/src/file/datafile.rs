//! Fixed-record random-access file.
//!
//! Layout: a 4-byte big-endian header holding the record size, followed by
//! a dense array of equally sized records addressed by zero-based index.
//! Nothing prevents sparse writes; the filesystem zero-fills skipped
//! slots, which read back as records with an empty timestamp.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use pointdb_core::{Error, Result};
use tracing::debug;

const HEADER_LEN: u64 = 4;

/// Random-access file of fixed-size records.
#[derive(Debug)]
pub struct DataFile {
    path: PathBuf,
    rec_size: u32,
    file: Option<File>,
}

impl DataFile {
    /// Creates the file exclusively and writes the record-size header.
    /// Fails with [`Error::Conflict`] if the path already exists.
    pub fn open_new(path: impl AsRef<Path>, rec_size: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    Error::Conflict(format!("data file '{}' already exists", path.display()))
                } else {
                    Error::Io(e)
                }
            })?;
        file.write_all(&rec_size.to_be_bytes())?;
        file.sync_all()?;
        debug!(path = %path.display(), rec_size, "created data file");
        Ok(Self { path, rec_size, file: Some(file) })
    }

    /// Opens an existing file read/write, recovering the record size from
    /// the header. Fails if the file is missing or the header is short.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut header = [0u8; 4];
        file.read_exact(&mut header)?;
        let rec_size = u32::from_be_bytes(header);
        debug!(path = %path.display(), rec_size, "opened data file");
        Ok(Self { path, rec_size, file: Some(file) })
    }

    /// Size in bytes of every record slot.
    #[must_use]
    pub fn rec_size(&self) -> u32 {
        self.rec_size
    }

    /// Writes `bytes` into slot `idx` and syncs. The buffer must be
    /// exactly one record long.
    pub fn write(&mut self, idx: u32, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.rec_size as usize {
            return Err(Error::Invariant(format!(
                "record is {} bytes, file expects {}",
                bytes.len(),
                self.rec_size
            )));
        }
        let offset = self.offset(idx);
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        file.sync_data()?;
        Ok(())
    }

    /// Reads slot `idx`. A read past the written extent is an io error
    /// (short read).
    pub fn read(&mut self, idx: u32) -> Result<Vec<u8>> {
        let offset = self.offset(idx);
        let rec_size = self.rec_size as usize;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; rec_size];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Closes the file. Idempotent; any later read or write fails.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn offset(&self, idx: u32) -> u64 {
        HEADER_LEN + u64::from(idx) * u64::from(self.rec_size)
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            Error::Invariant(format!("data file '{}' is closed", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use pointdb_core::Point;

    use super::*;
    use crate::file::codec::PointCodec;

    fn sample(i: u32) -> Point {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 23, 1, 2).unwrap();
        Point::new(ts + Duration::minutes(i64::from(i)))
            .with_val("area", f64::from(i).sin())
            .with_val("temp", f64::from(i).cos())
            .with_attr("color", "red")
            .with_attr("shape", "square")
            .with_attr("animal", "pig")
    }

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn write_then_read_round_trips_through_codec() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = PointCodec::new();
        let rec_size = PointCodec::encoded_size(&sample(0)) as u32;

        let mut df = DataFile::open_new(temp_path(&dir, "points.db"), rec_size).unwrap();
        for i in 0..10 {
            df.write(i, &codec.encode(&sample(i))).unwrap();
        }
        for i in 0..10 {
            let p = codec.decode(&df.read(i).unwrap()).unwrap();
            assert!(p.equal(&sample(i)));
        }
    }

    #[test]
    fn reopen_recovers_record_size_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "points.db");
        let mut codec = PointCodec::new();
        let rec_size = PointCodec::encoded_size(&sample(0)) as u32;

        let mut df = DataFile::open_new(&path, rec_size).unwrap();
        for i in 0..5 {
            df.write(i, &codec.encode(&sample(i))).unwrap();
        }
        df.close().unwrap();

        let mut df = DataFile::open_existing(&path).unwrap();
        assert_eq!(df.rec_size(), rec_size);
        for i in (0..5).rev() {
            let p = codec.decode(&df.read(i).unwrap()).unwrap();
            assert!(p.equal(&sample(i)));
        }
    }

    #[test]
    fn open_new_refuses_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "points.db");
        DataFile::open_new(&path, 56).unwrap();

        let err = DataFile::open_new(&path, 56).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn open_existing_requires_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataFile::open_existing(temp_path(&dir, "missing.db")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn open_existing_rejects_short_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "stub.db");
        std::fs::write(&path, [1u8, 2]).unwrap();

        let err = DataFile::open_existing(&path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn write_rejects_wrong_record_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = DataFile::open_new(temp_path(&dir, "points.db"), 56).unwrap();

        let err = df.write(0, &[0u8; 55]).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn sparse_slots_read_as_empty_timestamp_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = PointCodec::new();
        let rec_size = PointCodec::encoded_size(&sample(0)) as u32;
        let mut df = DataFile::open_new(temp_path(&dir, "points.db"), rec_size).unwrap();

        // Slots 0 and 2 written; slot 1 is a hole.
        df.write(0, &codec.encode(&sample(0))).unwrap();
        df.write(2, &codec.encode(&sample(2))).unwrap();

        assert!(codec.decode(&df.read(0).unwrap()).unwrap().equal(&sample(0)));
        assert!(codec.decode(&df.read(2).unwrap()).unwrap().equal(&sample(2)));

        let hole = df.read(1).unwrap();
        assert!(matches!(codec.decode(&hole).unwrap_err(), Error::EmptyTimestamp));

        // Past the written extent: short read.
        assert!(matches!(df.read(3).unwrap_err(), Error::Io(_)));
        assert!(matches!(df.read(500).unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn close_is_idempotent_and_blocks_further_io() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = DataFile::open_new(temp_path(&dir, "points.db"), 56).unwrap();

        df.close().unwrap();
        df.close().unwrap();

        assert!(matches!(df.read(0).unwrap_err(), Error::Invariant(_)));
        assert!(matches!(df.write(0, &[0u8; 56]).unwrap_err(), Error::Invariant(_)));
    }
}
