use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use appveil_core::error::Result;
use appveil_core::protocol::PREFS_FILE_NAME;

use crate::policy::PolicyStore;
use crate::storage::{self, PrefsFile};

use super::migrate::{migrate_if_needed, MigrationOutcome};

/// Presence signal for the enforcement consumer, set by an out-of-band
/// detection mechanism before [`SyncBridge::init`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSignal {
    pub active: bool,
    pub protocol_version: u32,
    /// Directory holding the consumer-readable record.
    pub storage_dir: PathBuf,
}

impl ConsumerSignal {
    pub fn inactive() -> Self {
        Self {
            active: false,
            protocol_version: 0,
            storage_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Uninitialized,
    Unavailable,
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// All three fields written and committed.
    Synced,
    /// Consumer storage not open; nothing written.
    Skipped,
}

/// Point-in-time view of the bridge for status indicators.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub state: BridgeState,
    pub consumer_active: bool,
    pub protocol_version: u32,
    pub migration: MigrationOutcome,
    /// `None` until the first sync attempt.
    pub last_sync_ok: Option<bool>,
}

/// Pushes [`PolicyStore`] snapshots into the consumer-readable record.
///
/// Lock order: bridge lock, then store lock. The store never calls back into
/// the bridge.
pub struct SyncBridge {
    store: Arc<PolicyStore>,
    local_dir: PathBuf,
    min_protocol_version: u32,
    inner: Mutex<BridgeInner>,
}

struct BridgeInner {
    state: BridgeState,
    signal: Option<ConsumerSignal>,
    external: Option<PrefsFile>,
    migration: MigrationOutcome,
    last_sync_ok: Option<bool>,
}

impl SyncBridge {
    pub fn new(store: Arc<PolicyStore>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            local_dir: local_dir.into(),
            min_protocol_version: 0,
            inner: Mutex::new(BridgeInner {
                state: BridgeState::Uninitialized,
                signal: None,
                external: None,
                migration: MigrationOutcome::NotRun,
                last_sync_ok: None,
            }),
        }
    }

    /// Consumers reporting an older protocol are treated as absent.
    pub fn with_min_protocol_version(mut self, v: u32) -> Self {
        self.min_protocol_version = v;
        self
    }

    /// Read the consumer signal and, if the consumer is usable, open its
    /// storage, migrate once, and push the current snapshot.
    ///
    /// Safe to call again later (e.g. once the consumer shows up); a bridge
    /// that is already available keeps its handle.
    pub fn init(&self, signal: ConsumerSignal) -> BridgeState {
        let mut g = self.lock();
        if g.state == BridgeState::Available {
            tracing::debug!("sync bridge already available");
            return g.state;
        }
        g.signal = Some(signal.clone());

        if !signal.active {
            tracing::info!("policy consumer not active");
            g.state = BridgeState::Unavailable;
            return g.state;
        }

        tracing::info!(version = signal.protocol_version, "policy consumer active");

        if signal.protocol_version < self.min_protocol_version {
            tracing::warn!(
                version = signal.protocol_version,
                min = self.min_protocol_version,
                "policy consumer protocol too old, sync unavailable"
            );
            g.state = BridgeState::Unavailable;
            return g.state;
        }

        let mut external = match PrefsFile::open_writable(&signal.storage_dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, dir = %signal.storage_dir.display(), "consumer storage unusable, sync unavailable");
                g.state = BridgeState::Unavailable;
                return g.state;
            }
        };

        if g.migration == MigrationOutcome::NotRun {
            let outcome = migrate_if_needed(&self.local_path(), external.path());
            if outcome == MigrationOutcome::Copied {
                if let Err(e) = external.reload() {
                    tracing::warn!(error = %e, "reload after migration failed");
                }
            }
            g.migration = outcome;
        }

        g.external = Some(external);
        let _ = self.sync_locked(&mut g);

        g.state = BridgeState::Available;
        tracing::info!(migration = ?g.migration, "sync bridge initialized");
        g.state
    }

    /// Overwrite the consumer record with the full current snapshot.
    ///
    /// Idempotent. Without an open consumer record this logs and returns
    /// [`SyncOutcome::Skipped`].
    pub fn sync_config(&self) -> Result<SyncOutcome> {
        let mut g = self.lock();
        self.sync_locked(&mut g)
    }

    pub fn state(&self) -> BridgeState {
        self.lock().state
    }

    pub fn status(&self) -> BridgeStatus {
        let g = self.lock();
        let (consumer_active, protocol_version) = g
            .signal
            .as_ref()
            .map(|s| (s.active, s.protocol_version))
            .unwrap_or((false, 0));
        BridgeStatus {
            state: g.state,
            consumer_active,
            protocol_version,
            migration: g.migration.clone(),
            last_sync_ok: g.last_sync_ok,
        }
    }

    /// Consumer present and the bridge can push to it.
    pub fn is_available(&self) -> bool {
        self.state() == BridgeState::Available
    }

    /// Whether a status indicator may claim protection is active: available,
    /// migration did not fail, and the last push succeeded.
    pub fn is_protection_active(&self) -> bool {
        let g = self.lock();
        g.state == BridgeState::Available
            && !g.migration.is_failed()
            && g.last_sync_ok == Some(true)
    }

    /// Path of the local record that migration copies from.
    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(PREFS_FILE_NAME)
    }

    /// Path of the consumer record, once known.
    pub fn external_path(&self) -> Option<PathBuf> {
        self.lock()
            .external
            .as_ref()
            .map(|p| p.path().to_path_buf())
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    fn sync_locked(&self, g: &mut BridgeInner) -> Result<SyncOutcome> {
        let Some(external) = g.external.as_mut() else {
            tracing::warn!("consumer storage not initialized, cannot sync");
            return Ok(SyncOutcome::Skipped);
        };

        let snapshot = self.store.export_snapshot();
        tracing::debug!(
            blacklist = snapshot.blacklist.len(),
            whitelist = snapshot.whitelist.len(),
            "syncing policy"
        );

        match storage::write_snapshot(external, &snapshot) {
            Ok(()) => {
                g.last_sync_ok = Some(true);
                tracing::debug!("policy synced");
                Ok(SyncOutcome::Synced)
            }
            Err(e) => {
                g.last_sync_ok = Some(false);
                tracing::error!(error = %e, "policy sync failed");
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
