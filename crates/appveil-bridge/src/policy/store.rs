use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use appveil_core::error::{AppVeilError, Result};
use appveil_core::{PolicySnapshot, Subject, SubjectSet};

use crate::storage::{self, PrefsFile};

/// Counts fed to status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    pub hidden: usize,
    pub sandboxed: usize,
}

/// Canonical policy state plus its durable backing.
///
/// Construct once with [`PolicyStore::open`] and share via `Arc`. A single
/// mutex guards the whole triple and the backing record, so multi-step
/// mutations (e.g. whitelist removal + linked entry deletion) are observed
/// atomically.
///
/// Mutations are staged on a copy of the state and swapped in only after the
/// write succeeded: on a storage error the caller gets `Err` and memory still
/// matches disk.
pub struct PolicyStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    prefs: PrefsFile,
    state: PolicySnapshot,
}

impl PolicyStore {
    /// Load the store from an opened prefs record.
    pub fn open(prefs: PrefsFile) -> Result<Self> {
        let (mut state, decoded) = storage::read_snapshot(&prefs);
        if decoded.is_recovered() {
            tracing::warn!(path = %prefs.path().display(), "linked apps unreadable, starting with no links");
        }
        sanitize(&mut state);

        tracing::info!(
            path = %prefs.path().display(),
            blacklist = state.blacklist.len(),
            whitelist = state.whitelist.len(),
            "policy store loaded"
        );

        Ok(Self {
            inner: Mutex::new(StoreInner { prefs, state }),
        })
    }

    /// Open the prefs record in `dir` and load the store from it.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(PrefsFile::open(dir)?)
    }

    // ==================== Blacklist ====================

    pub fn blacklist(&self) -> SubjectSet {
        self.lock().state.blacklist.clone()
    }

    pub fn add_to_blacklist(&self, subject: &str) -> Result<()> {
        self.mutate(|s| {
            s.blacklist.insert(subject.to_string());
            Ok(true)
        })
    }

    pub fn remove_from_blacklist(&self, subject: &str) -> Result<()> {
        self.mutate(|s| {
            s.blacklist.remove(subject);
            Ok(true)
        })
    }

    pub fn is_blacklisted(&self, subject: &str) -> bool {
        self.lock().state.blacklist.contains(subject)
    }

    /// Subjects hidden from everyone.
    pub fn all_hidden_apps(&self) -> SubjectSet {
        self.blacklist()
    }

    // ==================== Whitelist ====================

    pub fn whitelist(&self) -> SubjectSet {
        self.lock().state.whitelist.clone()
    }

    /// Sandbox `subject`. Creates an empty linked entry if none exists.
    pub fn add_to_whitelist(&self, subject: &str) -> Result<()> {
        self.mutate(|s| {
            s.whitelist.insert(subject.to_string());
            s.linked.entry(subject.to_string()).or_default();
            Ok(true)
        })
    }

    /// Un-sandbox `subject` and drop its linked entry.
    pub fn remove_from_whitelist(&self, subject: &str) -> Result<()> {
        self.mutate(|s| {
            s.whitelist.remove(subject);
            s.linked.remove(subject);
            Ok(true)
        })
    }

    pub fn is_whitelisted(&self, subject: &str) -> bool {
        self.lock().state.whitelist.contains(subject)
    }

    // ==================== Linked apps ====================

    /// Subjects visible to `subject`; empty when unknown.
    pub fn linked_apps(&self, subject: &str) -> SubjectSet {
        self.lock()
            .state
            .linked
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the linked set of a whitelisted subject.
    pub fn set_linked_apps(&self, subject: &str, apps: &SubjectSet) -> Result<()> {
        self.mutate(|s| {
            require_whitelisted(s, subject)?;
            s.linked.insert(subject.to_string(), apps.clone());
            Ok(true)
        })
    }

    pub fn add_linked_app(&self, subject: &str, target: &str) -> Result<()> {
        self.mutate(|s| {
            require_whitelisted(s, subject)?;
            s.linked
                .entry(subject.to_string())
                .or_default()
                .insert(target.to_string());
            Ok(true)
        })
    }

    /// No-op (and no write) when `subject` has no linked entry.
    pub fn remove_linked_app(&self, subject: &str, target: &str) -> Result<()> {
        self.mutate(|s| match s.linked.get_mut(subject) {
            Some(linked) => {
                linked.remove(target);
                Ok(true)
            }
            None => Ok(false),
        })
    }

    // ==================== Batch edits ====================

    /// Make the blacklist equal to `selected` with a single write.
    pub fn apply_blacklist_selection(&self, selected: &SubjectSet) -> Result<()> {
        self.mutate(|s| {
            if s.blacklist == *selected {
                return Ok(false);
            }
            s.blacklist = selected.clone();
            Ok(true)
        })
    }

    /// Make the whitelist equal to `selected` with a single write. New members
    /// get an empty linked entry; removed members lose theirs. Links of members
    /// that stay are kept.
    pub fn apply_whitelist_selection(&self, selected: &SubjectSet) -> Result<()> {
        self.mutate(|s| {
            if s.whitelist == *selected {
                return Ok(false);
            }
            s.whitelist = selected.clone();
            s.linked.retain(|k, _| selected.contains(k));
            for subject in selected {
                s.linked.entry(subject.clone()).or_default();
            }
            Ok(true)
        })
    }

    /// Drop listed subjects that are no longer installed. Returns what was removed.
    pub fn prune_uninstalled(&self, installed: &BTreeSet<Subject>) -> Result<Vec<Subject>> {
        let mut removed = Vec::new();
        self.mutate(|s| {
            let gone: Vec<Subject> = s
                .blacklist
                .union(&s.whitelist)
                .filter(|p| !installed.contains(*p))
                .cloned()
                .collect();
            for p in &gone {
                s.blacklist.remove(p);
                s.whitelist.remove(p);
                s.linked.remove(p);
            }
            let changed = !gone.is_empty();
            removed = gone;
            Ok(changed)
        })?;

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "pruned uninstalled subjects");
        }
        Ok(removed)
    }

    // ==================== Export ====================

    pub fn export_snapshot(&self) -> PolicySnapshot {
        self.lock().state.clone()
    }

    /// Full JSON export (`blacklist`, `whitelist`, `linked`).
    pub fn export_json(&self) -> Result<String> {
        self.export_snapshot().to_json()
    }

    /// Linked-apps-only JSON export.
    pub fn export_linked_json(&self) -> Result<String> {
        appveil_core::encode(&self.lock().state.linked)
    }

    pub fn summary(&self) -> PolicySummary {
        let g = self.lock();
        PolicySummary {
            hidden: g.state.blacklist.len(),
            sandboxed: g.state.whitelist.len(),
        }
    }

    // ==================== Internals ====================

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // State is only replaced after a successful write, so a poisoned
        // guard still holds a consistent triple.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy of the state; persist and swap in when it reports a change.
    fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut PolicySnapshot) -> Result<bool>,
    {
        let mut g = self.lock();
        let mut next = g.state.clone();
        if !f(&mut next)? {
            return Ok(());
        }

        storage::write_snapshot(&mut g.prefs, &next).map_err(|e| {
            tracing::error!(error = %e, "policy write failed, keeping previous state");
            e
        })?;
        g.state = next;
        Ok(())
    }
}

fn require_whitelisted(state: &PolicySnapshot, subject: &str) -> Result<()> {
    if state.whitelist.contains(subject) {
        Ok(())
    } else {
        Err(AppVeilError::NotWhitelisted(subject.to_string()))
    }
}

/// Restore `linked keys == whitelist` on state written by older builds.
fn sanitize(state: &mut PolicySnapshot) {
    let orphans: Vec<Subject> = state.orphaned_links().into_iter().cloned().collect();
    for k in &orphans {
        tracing::warn!(subject = %k, "dropping linked apps of non-whitelisted subject");
        state.linked.remove(k);
    }
    for subject in &state.whitelist {
        state.linked.entry(subject.clone()).or_default();
    }

    let overlap = state.overlapping();
    if !overlap.is_empty() {
        tracing::warn!(count = overlap.len(), "subjects are both blacklisted and whitelisted; blacklist takes precedence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> SubjectSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> (tempfile::TempDir, PolicyStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PolicyStore::open_dir(dir.path()).unwrap();
        (dir, store)
    }

    fn assert_links_within_whitelist(store: &PolicyStore) {
        let snap = store.export_snapshot();
        assert!(snap.orphaned_links().is_empty(), "orphans: {:?}", snap.orphaned_links());
    }

    #[test]
    fn whitelist_link_scenario() {
        let (_dir, store) = store();

        store.add_to_whitelist("com.a").unwrap();
        assert_eq!(store.whitelist(), set(&["com.a"]));
        assert_eq!(store.linked_apps("com.a"), SubjectSet::new());

        store.add_linked_app("com.a", "com.b").unwrap();
        assert_eq!(store.linked_apps("com.a"), set(&["com.b"]));

        store.remove_from_whitelist("com.a").unwrap();
        assert_eq!(store.whitelist(), SubjectSet::new());
        assert_eq!(store.linked_apps("com.a"), SubjectSet::new());
        assert!(store.export_snapshot().linked.is_empty());
    }

    #[test]
    fn blacklist_membership_and_export() {
        let (_dir, store) = store();

        store.add_to_blacklist("com.x").unwrap();
        assert!(store.is_blacklisted("com.x"));

        let snap = store.export_snapshot();
        assert!(snap.blacklist.contains("com.x"));
        assert!(!snap.whitelist.contains("com.x"));
        assert!(!snap.linked.contains_key("com.x"));

        store.remove_from_blacklist("com.x").unwrap();
        assert!(!store.is_blacklisted("com.x"));
        // idempotent
        store.remove_from_blacklist("com.x").unwrap();
        assert!(!store.is_blacklisted("com.x"));
    }

    #[test]
    fn links_stay_within_whitelist_across_edits() {
        let (_dir, store) = store();
        let ops: [(&str, bool); 7] = [
            ("com.a", true),
            ("com.b", true),
            ("com.a", true),
            ("com.a", false),
            ("com.c", false),
            ("com.b", false),
            ("com.c", true),
        ];
        for (subject, add) in ops {
            if add {
                store.add_to_whitelist(subject).unwrap();
            } else {
                store.remove_from_whitelist(subject).unwrap();
            }
            assert_links_within_whitelist(&store);
        }
        assert_eq!(store.whitelist(), set(&["com.c"]));
    }

    #[test]
    fn re_adding_whitelisted_subject_keeps_links() {
        let (_dir, store) = store();
        store.add_to_whitelist("com.a").unwrap();
        store.add_linked_app("com.a", "com.b").unwrap();
        store.add_to_whitelist("com.a").unwrap();
        assert_eq!(store.linked_apps("com.a"), set(&["com.b"]));
    }

    #[test]
    fn link_edits_require_whitelist_membership() {
        let (_dir, store) = store();

        let err = store.set_linked_apps("com.a", &set(&["com.b"])).unwrap_err();
        assert_eq!(err.code().as_str(), "NOT_WHITELISTED");
        let err = store.add_linked_app("com.a", "com.b").unwrap_err();
        assert_eq!(err.code().as_str(), "NOT_WHITELISTED");
        assert!(store.export_snapshot().linked.is_empty());
    }

    #[test]
    fn set_linked_apps_replaces_wholesale() {
        let (_dir, store) = store();
        store.add_to_whitelist("com.a").unwrap();
        store.add_linked_app("com.a", "com.old").unwrap();

        let mut picked = set(&["com.b", "com.c"]);
        store.set_linked_apps("com.a", &picked).unwrap();
        picked.insert("com.mutated-after".into());

        assert_eq!(store.linked_apps("com.a"), set(&["com.b", "com.c"]));
    }

    #[test]
    fn remove_linked_app_on_unknown_subject_is_noop() {
        let (dir, store) = store();
        store.remove_linked_app("com.none", "com.b").unwrap();
        assert!(!dir.path().join("hide_config.json").exists());

        store.add_to_whitelist("com.a").unwrap();
        store.add_linked_app("com.a", "com.b").unwrap();
        store.remove_linked_app("com.a", "com.b").unwrap();
        assert_eq!(store.linked_apps("com.a"), SubjectSet::new());
    }

    #[test]
    fn returned_sets_are_copies() {
        let (_dir, store) = store();
        store.add_to_blacklist("com.x").unwrap();
        let mut bl = store.blacklist();
        bl.insert("com.sneaky".into());
        assert!(!store.is_blacklisted("com.sneaky"));
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = PolicyStore::open_dir(dir.path()).unwrap();
            store.add_to_blacklist("com.x").unwrap();
            store.add_to_whitelist("com.a").unwrap();
            store.add_linked_app("com.a", "com.b").unwrap();
        }
        let store = PolicyStore::open_dir(dir.path()).unwrap();
        assert!(store.is_blacklisted("com.x"));
        assert!(store.is_whitelisted("com.a"));
        assert_eq!(store.linked_apps("com.a"), set(&["com.b"]));
    }

    #[test]
    fn load_drops_orphans_and_fills_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut prefs = PrefsFile::open(dir.path()).unwrap();
            let mut legacy = PolicySnapshot::default();
            legacy.whitelist.insert("com.a".into());
            legacy.linked.insert("com.gone".into(), set(&["com.b"]));
            storage::write_snapshot(&mut prefs, &legacy).unwrap();
        }

        let store = PolicyStore::open_dir(dir.path()).unwrap();
        let snap = store.export_snapshot();
        assert!(!snap.linked.contains_key("com.gone"));
        assert_eq!(snap.linked.get("com.a"), Some(&SubjectSet::new()));
    }

    #[test]
    fn batch_whitelist_selection() {
        let (_dir, store) = store();
        store.add_to_whitelist("com.keep").unwrap();
        store.add_linked_app("com.keep", "com.l").unwrap();
        store.add_to_whitelist("com.drop").unwrap();

        store
            .apply_whitelist_selection(&set(&["com.keep", "com.new"]))
            .unwrap();

        assert_eq!(store.whitelist(), set(&["com.keep", "com.new"]));
        assert_eq!(store.linked_apps("com.keep"), set(&["com.l"]));
        assert_eq!(store.linked_apps("com.new"), SubjectSet::new());
        assert_links_within_whitelist(&store);
        assert_eq!(store.export_snapshot().linked.len(), 2);
    }

    #[test]
    fn batch_blacklist_selection() {
        let (_dir, store) = store();
        store.add_to_blacklist("com.old").unwrap();
        store.apply_blacklist_selection(&set(&["com.x", "com.y"])).unwrap();
        assert_eq!(store.blacklist(), set(&["com.x", "com.y"]));
        assert_eq!(store.summary(), PolicySummary { hidden: 2, sandboxed: 0 });
    }

    #[test]
    fn prune_removes_uninstalled_subjects() {
        let (_dir, store) = store();
        store.add_to_blacklist("com.x").unwrap();
        store.add_to_whitelist("com.a").unwrap();
        store.add_to_whitelist("com.gone").unwrap();

        let removed = store.prune_uninstalled(&set(&["com.x", "com.a"])).unwrap();
        assert_eq!(removed, vec!["com.gone".to_string()]);
        assert_eq!(store.whitelist(), set(&["com.a"]));
        assert_links_within_whitelist(&store);
    }

    #[cfg(unix)]
    #[test]
    fn write_failure_is_reported_and_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = PolicyStore::open_dir(dir.path()).unwrap();
        store.add_to_blacklist("com.x").unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(dir.path().join("hide_config.json.tmp")).unwrap();

        let err = store.add_to_blacklist("com.y").unwrap_err();
        assert_eq!(err.code().as_str(), "STORAGE");
        assert!(!store.is_blacklisted("com.y"));
        assert!(store.is_blacklisted("com.x"));
    }

    #[test]
    fn exports_are_json() {
        let (_dir, store) = store();
        store.add_to_whitelist("com.a").unwrap();
        store.add_linked_app("com.a", "com.b").unwrap();

        let full: serde_json::Value = serde_json::from_str(&store.export_json().unwrap()).unwrap();
        assert_eq!(full["whitelist"][0], "com.a");
        assert_eq!(store.export_linked_json().unwrap(), r#"{"com.a":["com.b"]}"#);
    }
}
