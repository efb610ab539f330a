//! Named key/value preference scopes.
//!
//! A scope survives process restarts when backed by [`FilePreferences`]; the
//! [`MemoryPreferences`] variant keeps values for the life of the process only.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::core::error::LogmoError;

pub trait PreferenceStore: Send + Sync {
    fn scope(&self) -> &str;

    /// `None` when the key was never stored.
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), LogmoError>;

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), LogmoError> {
        self.set(key, Value::Bool(value))
    }

    fn get_strings(&self, key: &str) -> Option<Vec<String>> {
        serde_json::from_value(self.get(key)?).ok()
    }

    fn set_strings(&self, key: &str, values: &[String]) -> Result<(), LogmoError> {
        self.set(key, serde_json::to_value(values)?)
    }
}

pub struct MemoryPreferences {
    scope: String,
    values: Mutex<Map<String, Value>>,
}

impl MemoryPreferences {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            values: Mutex::new(Map::new()),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LogmoError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON object per scope, stored at `<dir>/<scope>.json` and rewritten on
/// every `set`.
pub struct FilePreferences {
    scope: String,
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FilePreferences {
    pub fn open(dir: impl AsRef<Path>, scope: impl Into<String>) -> Result<Self, LogmoError> {
        let scope = scope.into();
        let path = dir.as_ref().join(format!("{}.json", scope));

        let values = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| LogmoError::io(&path, e))?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(LogmoError::Preferences {
                        scope,
                        details: format!("{} does not hold a JSON object", path.display()),
                    });
                }
                Err(err) => {
                    return Err(LogmoError::Preferences {
                        scope,
                        details: err.to_string(),
                    });
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            scope,
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), LogmoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LogmoError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json).map_err(|e| LogmoError::io(&self.path, e))
    }
}

impl PreferenceStore for FilePreferences {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LogmoError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}
