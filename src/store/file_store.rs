use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::debug;

use super::TokenStore;
use crate::config::FileStoreConfig;

/// Persists the token as one key of a small JSON document on disk.
///
/// Other keys in the document are preserved. Writes go through a temporary
/// file and a rename so a crash never leaves a half-written document. No
/// attempt is made to notice changes made by other processes.
pub struct FileStore {
    path: PathBuf,
    key: String,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        FileStore {
            path: PathBuf::from(&config.path),
            key: config.key.clone(),
            lock: Mutex::new(()),
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(format!("Error reading {}: {}", self.path.display(), e)),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(format!("{} is not a JSON object", self.path.display())),
            Err(e) => Err(format!("Error parsing {}: {}", self.path.display(), e)),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Error creating {}: {}", parent.display(), e))?;
        }
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|e| format!("Error serializing token document: {}", e))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialized)
            .map_err(|e| format!("Error writing {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Error replacing {}: {}", self.path.display(), e))
    }
}

impl TokenStore for FileStore {
    fn save(&self, token: &str) -> Result<(), String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| "file store mutex poisoned".to_string())?;
        // An unreadable document is replaced rather than blocking the login.
        let mut document = self.read_document().unwrap_or_default();
        document.insert(self.key.clone(), Value::from(token));
        self.write_document(&document)?;
        debug!("Saved token under key '{}' in {}", self.key, self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| "file store mutex poisoned".to_string())?;
        let document = self.read_document()?;
        Ok(document
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    fn clear(&self) -> Result<(), String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| "file store mutex poisoned".to_string())?;
        let mut document = match self.read_document() {
            Ok(document) => document,
            // Nothing trustworthy to keep; drop the whole file.
            Err(_) => {
                return match fs::remove_file(&self.path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(format!("Error removing {}: {}", self.path.display(), e)),
                };
            }
        };
        if document.remove(&self.key).is_none() {
            return Ok(());
        }
        self.write_document(&document)?;
        debug!("Cleared token key '{}' in {}", self.key, self.path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}
