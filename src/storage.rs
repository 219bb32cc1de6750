//! Key-value media that the local calendar persists its tasks into

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::traits::KeyValueStore;

/// Slots that live in process memory.
///
/// Clones share the same slots, so that several calendars can be opened over the same storage,
/// the way a browser `localStorage` outlives the objects that use it.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock can not leave a half-written slot behind
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.slots().remove(key);
        Ok(())
    }
}


/// Slots stored as files in a folder, one `<key>.json` file per slot
#[derive(Clone, Debug, PartialEq)]
pub struct FileStorage {
    folder: PathBuf,
}

impl FileStorage {
    /// Use `folder` to store slots. It will be created on the first write if needed
    pub fn new(folder: &Path) -> Self {
        Self { folder: PathBuf::from(folder) }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The file that holds a given slot
    pub fn slot_path(&self, key: &str) -> PathBuf {
        let file_name = format!("{}.json", sanitize_filename::sanitize(key));
        self.folder.join(file_name)
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io{ path, source }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.folder)
            .map_err(|source| Error::Io{ path: self.folder.clone(), source })?;

        let path = self.slot_path(key);
        log::debug!("Writing slot {:?} to {:?}", key, path);
        std::fs::write(&path, value)
            .map_err(|source| Error::Io{ path, source })
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Io{ path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_slots() {
        let mut storage = MemoryStorage::new();
        let other = storage.clone();

        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "[]").unwrap();
        assert_eq!(other.get_item("k").unwrap(), Some("[]".to_string()));

        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(other.get_item("k").unwrap(), None);
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(&dir.path().join("not-created-yet"));

        assert_eq!(storage.get_item("calendar-data").unwrap(), None);
        storage.set_item("calendar-data", "[1]").unwrap();
        assert!(storage.slot_path("calendar-data").exists());
        assert_eq!(storage.get_item("calendar-data").unwrap(), Some("[1]".to_string()));

        let reopened = FileStorage::new(storage.folder());
        assert_eq!(reopened.get_item("calendar-data").unwrap(), Some("[1]".to_string()));

        storage.remove_item("calendar-data").unwrap();
        storage.remove_item("calendar-data").unwrap();
        assert_eq!(storage.get_item("calendar-data").unwrap(), None);
    }

    #[test]
    fn keys_can_not_escape_the_folder() {
        let storage = FileStorage::new(Path::new("/some/folder"));
        let path = storage.slot_path("../../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("/some/folder")));
    }
}
