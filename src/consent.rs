//! First-run disclaimer acknowledgement.
//!
//! `Pending` until the user acknowledges; the acknowledgement survives restarts
//! only when they ask to be remembered. There is no way back to `Pending` from
//! here: clearing the stored key is an external action.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Text shown while consent is pending.
pub const DISCLAIMER: &str = "This tool provides advice and trends based on the most upvoted \
public Reddit posts.\n\nAlways do your own research before making financial decisions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    Pending,
    Acknowledged,
}

/// Persistent boolean flags addressed by key.
pub trait PreferenceStore {
    /// `Ok(None)` when the key has never been written.
    fn load(&self, key: &str) -> Result<Option<bool>>;
    fn store(&self, key: &str, value: bool) -> Result<()>;
}

/// Flags kept in a small JSON object on disk: `{ "<key>": true }`.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let txt = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if txt.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&txt)
            .with_context(|| format!("parse {}", self.path.display()))?
        {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} is not a JSON object", self.path.display()),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.read_map()?.get(key).and_then(Value::as_bool))
    }

    fn store(&self, key: &str, value: bool) -> Result<()> {
        // A corrupt file is replaced rather than blocking the write.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), Value::Bool(value));

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(serde_json::to_string_pretty(&Value::Object(map))?.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

/// In-process store, for tests and for sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<bool>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference store poisoned"))?;
        Ok(values.get(key).copied())
    }

    fn store(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference store poisoned"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for &S {
    fn load(&self, key: &str) -> Result<Option<bool>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: bool) -> Result<()> {
        (**self).store(key, value)
    }
}

pub struct ConsentPreference<S: PreferenceStore> {
    store: S,
    key: String,
    state: ConsentState,
}

impl<S: PreferenceStore> ConsentPreference<S> {
    /// Read the stored flag once and pick the initial state from it.
    ///
    /// An unreadable store counts as "never acknowledged".
    pub fn new(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match store.load(&key) {
            Ok(Some(true)) => ConsentState::Acknowledged,
            Ok(_) => ConsentState::Pending,
            Err(e) => {
                log::warn!("could not read consent flag {key:?}: {e:#}");
                ConsentState::Pending
            }
        };
        Self { store, key, state }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn is_acknowledged(&self) -> bool {
        self.state == ConsentState::Acknowledged
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Acknowledge for this session; with `remember`, also for future ones.
    ///
    /// The session state changes even if persisting fails; the write error is returned.
    pub fn acknowledge(&mut self, remember: bool) -> Result<()> {
        self.state = ConsentState::Acknowledged;
        if remember {
            self.store
                .store(&self.key, true)
                .with_context(|| format!("persist consent flag {:?}", self.key))?;
            log::info!("consent remembered under {:?}", self.key);
        }
        Ok(())
    }
}
