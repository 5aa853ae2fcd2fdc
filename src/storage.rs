use crate::error::AdvisorError;
use std::fs;
use std::io;
use std::path::PathBuf;

/// String-keyed durable slots, the desktop stand-in for browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AdvisorError>;

    fn remove(&self, key: &str) -> Result<(), AdvisorError>;
}

/// One `<key>.json` file per slot under `root`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }

    fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    fn write_atomically(&self, key: &str, value: &str) -> io::Result<()> {
        self.ensure_root()?;
        let final_path = self.slot_path(key);
        let tmp_path = self.root.join(format!("{}.json.tmp", sanitize_key(key)));

        fs::write(&tmp_path, value)?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if final_path.exists() {
                    fs::remove_file(&final_path)?;
                    fs::rename(&tmp_path, &final_path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AdvisorError::Storage(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AdvisorError> {
        self.write_atomically(key, value).map_err(|err| {
            AdvisorError::Storage(format!(
                "failed to write {}: {err}",
                self.slot_path(key).display()
            ))
        })
    }

    fn remove(&self, key: &str) -> Result<(), AdvisorError> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AdvisorError::Storage(format!(
                "failed to remove {}: {err}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    slots: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, std::collections::HashMap<String, String>> {
        // A poisoned map still holds consistent strings.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError> {
        Ok(self.slots().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AdvisorError> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AdvisorError> {
        self.slots().remove(key);
        Ok(())
    }
}

fn sanitize_key(raw: &str) -> String {
    let out: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect();
    if out.is_empty() {
        "slot".to_string()
    } else {
        out
    }
}
