//! Policy data model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AppVeilError, Result};

/// Opaque package identifier. Never parsed.
pub type Subject = String;

/// Ordered set of subjects.
pub type SubjectSet = BTreeSet<Subject>;

/// Whitelisted subject -> subjects it may see.
pub type LinkedApps = BTreeMap<Subject, SubjectSet>;

/// Full policy state at one instant; the unit of export to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Hidden from every other subject.
    #[serde(default)]
    pub blacklist: SubjectSet,
    /// Sandboxed: sees only its linked subjects.
    #[serde(default)]
    pub whitelist: SubjectSet,
    /// Visible-to sets, keyed by whitelisted subject.
    #[serde(default)]
    pub linked: LinkedApps,
}

impl PolicySnapshot {
    /// Full JSON export (`blacklist`, `whitelist`, `linked`).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AppVeilError::Codec(format!("export snapshot: {e}")))
    }

    /// Linked-apps entries whose key is not whitelisted.
    pub fn orphaned_links(&self) -> Vec<&Subject> {
        self.linked
            .keys()
            .filter(|k| !self.whitelist.contains(*k))
            .collect()
    }

    /// Subjects present in both lists. The consumer resolves these as blacklisted.
    pub fn overlapping(&self) -> Vec<&Subject> {
        self.blacklist.intersection(&self.whitelist).collect()
    }
}
