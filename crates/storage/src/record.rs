//! One JSON record per reader under `users/<reader>/`, cached in memory.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use folio_core::ReaderId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressWriteError {
    #[error("write reader record {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encode reader record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProgressWriteError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

type Slot<T> = Arc<Mutex<Option<T>>>;

/// Per-reader records of one kind, read from disk once and then served from
/// memory. A slot's mutex also serializes read-modify-write cycles for that
/// reader. Anonymous readers have no record.
#[derive(Debug)]
pub(crate) struct ReaderRecords<T> {
    users_dir: PathBuf,
    file_name: &'static str,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> ReaderRecords<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub(crate) fn new(users_dir: PathBuf, file_name: &'static str) -> Self {
        Self {
            users_dir,
            file_name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn path(&self, reader: &ReaderId) -> Option<PathBuf> {
        reader
            .as_key()
            .map(|key| self.users_dir.join(key).join(self.file_name))
    }

    /// Runs `f` on the reader's record. Anonymous readers see an empty one.
    pub(crate) fn read<R>(&self, reader: &ReaderId, f: impl FnOnce(&T) -> R) -> R {
        let Some((path, slot)) = self.slot(reader) else {
            return f(&T::default());
        };
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*cached.get_or_insert_with(|| read_record(&path)))
    }

    /// Applies `f` to a copy of the record and writes it back when `f`
    /// reports a change. The cache only takes the new record once it is on
    /// disk. Returns whether anything was written.
    pub(crate) fn update(
        &self,
        reader: &ReaderId,
        f: impl FnOnce(&mut T) -> bool,
    ) -> Result<bool, ProgressWriteError> {
        let Some((path, slot)) = self.slot(reader) else {
            return Ok(false);
        };
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = cached.get_or_insert_with(|| read_record(&path)).clone();
        if !f(&mut record) {
            return Ok(false);
        }
        write_record(&path, &record)?;
        *cached = Some(record);
        Ok(true)
    }

    fn slot(&self, reader: &ReaderId) -> Option<(PathBuf, Slot<T>)> {
        let key = reader.as_key()?;
        let path = self.users_dir.join(key).join(self.file_name);
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = Arc::clone(slots.entry(key.to_string()).or_default());
        Some((path, slot))
    }
}

fn read_record<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return T::default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable reader record, starting empty");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "corrupt reader record, starting empty");
            T::default()
        }
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), ProgressWriteError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|err| ProgressWriteError::io(dir, err))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| ProgressWriteError::io(dir, err))?;
    serde_json::to_writer_pretty(&mut tmp, record)?;
    tmp.write_all(b"\n")
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| ProgressWriteError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| ProgressWriteError::io(path, err.error))?;
    Ok(())
}
