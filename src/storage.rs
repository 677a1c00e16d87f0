use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preference file {path} is not a string map: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value preferences, handed to whoever needs to persist a setting.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Preferences kept in one JSON object on disk.
///
/// The file is read on every `get` and rewritten on every `set`, so a damaged
/// file surfaces as an error to the caller instead of at startup.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(data) => serde_json::from_slice(&data).map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Io { path: self.path.clone(), source }),
        }
    }

    fn sync(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(values).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, data).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = match self.load() {
            Ok(values) => values,
            Err(StorageError::Json { source, .. }) => {
                log::error!("Replacing damaged preference file {}: {}", self.path.display(), source);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());
        self.sync(&values)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store whose every read and write fails.
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
impl PreferenceStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(FailingStore::error())
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(FailingStore::error())
    }
}

#[cfg(test)]
impl FailingStore {
    fn error() -> StorageError {
        StorageError::Io {
            path: PathBuf::from("unwritable"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("stopwatch-{}-{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let path = scratch_path("missing");
        let store = FileStore::new(&path);
        assert_eq!(store.get("stopwatch-theme").unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let path = scratch_path("persist");
        {
            let mut store = FileStore::new(&path);
            store.set("stopwatch-theme", "dark").unwrap();
            store.set("other", "1").unwrap();
        }
        let store = FileStore::new(&path);
        assert_eq!(store.get("stopwatch-theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("other").unwrap().as_deref(), Some("1"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_garbage_fails_get() {
        let path = scratch_path("garbage");
        fs::write(&path, b"[1, 2, 3]").unwrap();
        let store = FileStore::new(&path);
        match store.get("stopwatch-theme") {
            Err(StorageError::Json { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
            Ok(v) => panic!("garbage accepted: {:?}", v),
        }
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_set_replaces_garbage() {
        let path = scratch_path("overwrite");
        fs::write(&path, b"not json").unwrap();
        let mut store = FileStore::new(&path);
        store.set("stopwatch-theme", "dark").unwrap();
        assert_eq!(store.get("stopwatch-theme").unwrap().as_deref(), Some("dark"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_empty_file_is_empty() {
        let path = scratch_path("empty");
        fs::write(&path, b"\n").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get("x").unwrap(), None);
        fs::remove_file(&path).unwrap();
    }
}
