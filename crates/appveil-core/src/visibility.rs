//! Visibility decision as evaluated by the enforcement consumer.
//!
//! Rules, in order:
//! 1. A subject always sees itself.
//! 2. A blacklisted target is hidden from everyone. This also wins when the
//!    target or caller is whitelisted.
//! 3. A whitelisted caller sees only the targets linked to it.
//! 4. Everything else is visible.

use crate::snapshot::PolicySnapshot;

/// Read-only rule set built from a synced snapshot.
#[derive(Debug, Clone, Default)]
pub struct VisibilityRules {
    snapshot: PolicySnapshot,
}

impl VisibilityRules {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &PolicySnapshot {
        &self.snapshot
    }

    /// Whether `target` must be hidden from `caller`. Either side may be
    /// unknown (e.g. the hook could not resolve a uid to a package).
    pub fn should_hide(&self, caller: Option<&str>, target: Option<&str>) -> bool {
        if caller == target {
            return false;
        }

        if let Some(t) = target {
            if self.snapshot.blacklist.contains(t) {
                return true;
            }
        }

        if let Some(c) = caller {
            if self.snapshot.whitelist.contains(c) {
                let Some(t) = target else { return true; };
                return !self
                    .snapshot
                    .linked
                    .get(c)
                    .map(|allowed| allowed.contains(t))
                    .unwrap_or(false);
            }
        }

        false
    }

    pub fn is_blacklisted(&self, subject: &str) -> bool {
        self.snapshot.blacklist.contains(subject)
    }

    pub fn is_whitelisted(&self, subject: &str) -> bool {
        self.snapshot.whitelist.contains(subject)
    }
}
