//! A list of JSON records kept in one file. The file is read once when opened; afterwards the
//! in-memory copy is authoritative and every update is written straight back.
use crate::twoface::{DescribeErr, ExternalError, Fallible};
use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct RecordFile<T> {
    path: PathBuf,
    records: Mutex<Vec<T>>,
}

impl<T> RecordFile<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// A missing file opens as an empty list. So does an unreadable or corrupt one, after a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match load(&path) {
            Ok(Some(records)) => records,
            Ok(None) => {
                debug!(path = %path.display(), "no record file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "failed to load record file, starting empty");
                Vec::new()
            }
        };
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` against a copy of the records and persist the result. The in-memory records only
    /// change if the write succeeds. The lock is held throughout, so updates never interleave.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Fallible<R> {
        let mut records = self.lock();
        let mut draft = records.clone();
        let result = f(&mut draft);
        save(&self.path, &draft).describe_err(ExternalError::RECORDS_UNAVAILABLE)?;
        *records = draft;
        Ok(result)
    }

    /// Like `update`, but the change is kept in memory even if the write fails. The failure is
    /// logged and the records go to disk with the next successful update or flush.
    pub fn apply<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut records = self.lock();
        let result = f(&mut records);
        if let Err(e) = save(&self.path, &records) {
            warn!(path = %self.path.display(), error = %format!("{:#}", e), "failed to persist records, keeping them in memory");
        }
        result
    }

    /// Write the current records out again.
    pub fn flush(&self) -> Fallible<()> {
        let records = self.lock();
        save(&self.path, &records).describe_err(ExternalError::RECORDS_UNAVAILABLE)
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, anyhow::Error> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("couldn't read {}", path.display()))?;
    let records = serde_json::from_str(&contents)
        .with_context(|| format!("couldn't parse {}", path.display()))?;
    Ok(Some(records))
}

/// Write to a sibling temp file first so a crash mid-write leaves the old file intact.
fn save<T: Serialize>(path: &Path, records: &[T]) -> Result<(), anyhow::Error> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("couldn't create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("couldn't write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("couldn't replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twoface::Cause;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file: RecordFile<String> = RecordFile::open(dir.path().join("nothing.json"));
        assert!(file.read(|r| r.is_empty()));
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file: RecordFile<String> = RecordFile::open(&path);
        assert!(file.read(|r| r.is_empty()));
    }

    #[test]
    fn test_updates_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flags.json");
        let file: RecordFile<String> = RecordFile::open(&path);
        let len = file
            .update(|r| {
                r.push("a".to_owned());
                r.push("b".to_owned());
                r.len()
            })
            .unwrap();
        assert_eq!(len, 2);

        let reopened: RecordFile<String> = RecordFile::open(&path);
        assert_eq!(reopened.read(|r| r.to_vec()), vec!["a", "b"]);
    }

    #[test]
    fn test_failed_write_leaves_records_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join("blocked.json");
        std::fs::create_dir(&path).unwrap();
        let file: RecordFile<String> = RecordFile::open(&path);

        let err = file.update(|r| r.push("lost".to_owned())).unwrap_err();
        assert_eq!(err.external.cause, Cause::ServerError);
        assert!(file.read(|r| r.is_empty()));
    }

    #[test]
    fn test_apply_keeps_change_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocked.json");
        std::fs::create_dir(&path).unwrap();
        let file: RecordFile<String> = RecordFile::open(&path);

        let len = file.apply(|r| {
            r.push("kept".to_owned());
            r.len()
        });
        assert_eq!(len, 1);
        assert_eq!(file.read(|r| r.to_vec()), vec!["kept"]);

        // Once the path is writable the next flush persists it.
        std::fs::remove_dir(&path).unwrap();
        file.flush().unwrap();
        let reopened: RecordFile<String> = RecordFile::open(&path);
        assert_eq!(reopened.read(|r| r.to_vec()), vec!["kept"]);
    }
}
