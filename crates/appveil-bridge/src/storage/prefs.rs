//! File-backed preferences record.
//!
//! A record is a JSON object of `key -> value`, where a value is either a set
//! of strings or a single string. Reads come from an in-memory copy loaded at
//! open (or on [`PrefsFile::reload`]). Writes are staged in a [`PrefsEditor`]
//! and reach disk on [`PrefsEditor::commit`] through a temp file + rename, so
//! a reader never sees a half-written record.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use appveil_core::error::{AppVeilError, Result};
use appveil_core::protocol::PREFS_FILE_NAME;

/// Stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    StringSet(BTreeSet<String>),
    String(String),
}

#[derive(Debug)]
pub struct PrefsFile {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
}

impl PrefsFile {
    /// Open the record inside `dir`. A missing file is an empty record.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(PREFS_FILE_NAME);
        let values = load_values(&path)?;
        Ok(Self { path, values })
    }

    /// Open a record whose directory must be creatable by this process.
    /// Fails when the directory cannot be created.
    pub fn open_writable(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            AppVeilError::Storage(format!("create prefs dir failed ({}): {e}", dir.display()))
        })?;
        Self::open(dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the record exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Re-read the file, replacing the in-memory copy.
    pub fn reload(&mut self) -> Result<()> {
        self.values = load_values(&self.path)?;
        Ok(())
    }

    pub fn get_string_set(&self, key: &str) -> Option<BTreeSet<String>> {
        match self.values.get(key)? {
            PrefValue::StringSet(s) => Some(s.clone()),
            PrefValue::String(_) => {
                tracing::warn!(key, path = %self.path.display(), "pref has string value, expected set");
                None
            }
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            PrefValue::String(s) => Some(s.clone()),
            PrefValue::StringSet(_) => {
                tracing::warn!(key, path = %self.path.display(), "pref has set value, expected string");
                None
            }
        }
    }

    pub fn edit(&mut self) -> PrefsEditor<'_> {
        PrefsEditor {
            prefs: self,
            pending: BTreeMap::new(),
        }
    }

    fn write_values(&self, values: &BTreeMap<String, PrefValue>) -> Result<()> {
        let body = serde_json::to_string_pretty(values)
            .map_err(|e| AppVeilError::Storage(format!("serialize prefs failed: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppVeilError::Storage(format!("create prefs dir failed ({}): {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppVeilError::Storage(format!("write prefs failed ({}): {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppVeilError::Storage(format!("replace prefs failed ({}): {e}", self.path.display()))
        })
    }
}

/// Staged writes against a [`PrefsFile`].
pub struct PrefsEditor<'a> {
    prefs: &'a mut PrefsFile,
    pending: BTreeMap<String, PrefValue>,
}

impl PrefsEditor<'_> {
    pub fn put_string_set(&mut self, key: &str, value: BTreeSet<String>) -> &mut Self {
        self.pending.insert(key.to_string(), PrefValue::StringSet(value));
        self
    }

    pub fn put_string(&mut self, key: &str, value: String) -> &mut Self {
        self.pending.insert(key.to_string(), PrefValue::String(value));
        self
    }

    /// Write the merged record to disk. The in-memory copy only changes when
    /// the write succeeded.
    pub fn commit(self) -> Result<()> {
        let mut merged = self.prefs.values.clone();
        merged.extend(self.pending);
        self.prefs.write_values(&merged)?;
        self.prefs.values = merged;
        Ok(())
    }
}

fn load_values(path: &Path) -> Result<BTreeMap<String, PrefValue>> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(AppVeilError::Storage(format!(
                "read prefs failed ({}): {e}",
                path.display()
            )))
        }
    };

    match serde_json::from_str(&s) {
        Ok(values) => Ok(values),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "prefs file is corrupt, starting empty");
            Ok(BTreeMap::new())
        }
    }
}
