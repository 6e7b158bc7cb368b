use std::path::{Path, PathBuf};

use appveil_core::{PolicySnapshot, VisibilityRules};

use crate::storage::{self, PrefsFile};

/// Pull-based reader of the consumer record.
pub struct SnapshotReader {
    dir: PathBuf,
    rules: VisibilityRules,
}

impl SnapshotReader {
    /// Open and load once. A missing or unreadable record yields empty rules.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let mut reader = Self {
            dir: dir.as_ref().to_path_buf(),
            rules: VisibilityRules::default(),
        };
        reader.refresh();
        reader
    }

    /// Re-read the record. Returns whether a record was found and loaded.
    /// On failure the previous rules are kept.
    pub fn refresh(&mut self) -> bool {
        let prefs = match PrefsFile::open(&self.dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "synced policy unreadable, keeping cached rules");
                return false;
            }
        };
        if !prefs.exists() {
            tracing::warn!(dir = %self.dir.display(), "no synced policy found");
            return false;
        }

        let (snapshot, decoded) = storage::read_snapshot(&prefs);
        if decoded.is_recovered() {
            tracing::warn!("synced linked apps malformed, treating as empty");
        }
        tracing::debug!(
            blacklist = snapshot.blacklist.len(),
            whitelist = snapshot.whitelist.len(),
            "synced policy loaded"
        );
        self.rules = VisibilityRules::new(snapshot);
        true
    }

    pub fn snapshot(&self) -> &PolicySnapshot {
        self.rules.snapshot()
    }

    pub fn rules(&self) -> &VisibilityRules {
        &self.rules
    }

    pub fn should_hide(&self, caller: Option<&str>, target: Option<&str>) -> bool {
        self.rules.should_hide(caller, target)
    }
}
