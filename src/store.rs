// Snapshot store
// One slot per key; the latest save wins. The file store keeps the same
// `{ key: value | null }` object a browser extension's local storage holds.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

pub trait SnapshotStore {
    /// Replace the value under `key`; `None` stores an explicit null
    fn save(&mut self, key: &str, value: Option<Value>) -> Result<()>;

    /// The value under `key`; a missing key and a stored null are both `None`
    fn load(&self, key: &str) -> Result<Option<Value>>;
}

/// Serialize `value` into the slot `key`
pub fn put<T: Serialize>(store: &mut dyn SnapshotStore, key: &str, value: &T) -> Result<()> {
    store.save(key, Some(serde_json::to_value(value)?))
}

/// Deserialize the slot `key`
pub fn get<T: DeserializeOwned>(store: &dyn SnapshotStore, key: &str) -> Result<Option<T>> {
    match store.load(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        self.slots
            .insert(key.to_string(), value.unwrap_or(Value::Null));
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.slots.get(key).filter(|v| !v.is_null()).cloned())
    }
}

/// JSON file holding every slot
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

impl SnapshotStore for FileStore {
    fn save(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        let mut slots = self.read_all()?;
        slots.insert(key.to_string(), value.unwrap_or(Value::Null));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&slots)?;
        fs::write(&self.path, json)?;
        debug!("saved {key} to {}", self.path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut slots = self.read_all()?;
        Ok(slots.remove(key).filter(|v| !v.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Mode, StyleSnapshot};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("format-copier-{}-{name}", std::process::id()))
            .join("storage.json")
    }

    #[test]
    fn test_memory_store_null_is_absent() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load("k").unwrap(), None);
        store.save("k", None).unwrap();
        assert_eq!(store.load("k").unwrap(), None);
        store.save("k", Some(Value::from(3))).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(Value::from(3)));
    }

    #[test]
    fn test_typed_round_trip() {
        let mut store = MemoryStore::new();
        let snapshot = StyleSnapshot {
            color: "rgb(1, 2, 3)".into(),
            ..Default::default()
        };
        put(&mut store, Mode::Classic.storage_key(), &snapshot).unwrap();
        let loaded: Option<StyleSnapshot> = get(&store, Mode::Classic.storage_key()).unwrap();
        assert_eq!(loaded, Some(snapshot));
        let words: Option<StyleSnapshot> = get(&store, Mode::Words.storage_key()).unwrap();
        assert_eq!(words, None);
    }

    #[test]
    fn test_file_store_keeps_other_slots() {
        let path = temp_path("slots");
        let _ = fs::remove_dir_all(path.parent().unwrap());

        let mut store = FileStore::new(&path);
        assert_eq!(store.load("a").unwrap(), None);
        store.save("a", Some(Value::from("first"))).unwrap();
        store.save("b", Some(Value::from("second"))).unwrap();
        store.save("a", None).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.load("a").unwrap(), None);
        assert_eq!(reopened.load("b").unwrap(), Some(Value::from("second")));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"a\": null"));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(FileStore::new(&path).load("a").is_err());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
