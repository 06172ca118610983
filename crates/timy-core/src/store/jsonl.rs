//! JSON-lines store
//!
//! Appends one JSON object per split:
//!
//! ```text
//! {"time_measured":"00:00:10.82","order_number":7,"captured_at":"2024-05-01T09:12:44.120Z"}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::{SplitStore, StoreError, TimeRecord};

/// Append-only file store
pub struct JsonLinesStore {
    path: PathBuf,
    file: File,
}

impl JsonLinesStore {
    /// Open (or create) the file for appending
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// File receiving the records
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records back from a file.
    ///
    /// Blank lines are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<TimeRecord>, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl SplitStore for JsonLinesStore {
    fn save(&mut self, record: TimeRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.jsonl");

        let first = TimeRecord::new(Duration::from_millis(10_820), 7);
        let second = TimeRecord::new(Duration::from_millis(3_723_040), 12);

        {
            let mut store = JsonLinesStore::open(&path).unwrap();
            store.save(first.clone()).unwrap();
        }
        {
            // Reopening appends instead of truncating
            let mut store = JsonLinesStore::open(&path).unwrap();
            store.save(second.clone()).unwrap();
        }

        let loaded = JsonLinesStore::load(&path).unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_duration_written_as_split_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.jsonl");

        let mut store = JsonLinesStore::open(&path).unwrap();
        store
            .save(TimeRecord::new(Duration::from_millis(10_820), 7))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"time_measured\":\"00:00:10.82\""));
        assert!(text.contains("\"order_number\":7"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        assert!(matches!(
            JsonLinesStore::load(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
