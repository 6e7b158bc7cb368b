//! Shared application state for the appveil bridge.
//!
//! Owns the explicitly constructed store and bridge. Everything that needs
//! them gets a clone of this handle instead of reaching for a global.

use std::sync::Arc;

use appveil_core::error::Result;

use crate::catalog::{AppInfo, PackageSource, PickerSession};
use crate::config::BridgeConfig;
use crate::policy::PolicyStore;
use crate::sync::{SyncBridge, SyncOutcome};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    store: Arc<PolicyStore>,
    bridge: Arc<SyncBridge>,
}

struct AppStateInner {
    cfg: BridgeConfig,
}

impl AppState {
    /// Load the store, then initialize the bridge from the configured
    /// consumer signal.
    pub fn new(cfg: BridgeConfig) -> Result<Self> {
        let store = Arc::new(PolicyStore::open_dir(&cfg.storage.local_dir)?);

        let bridge = SyncBridge::new(Arc::clone(&store), cfg.storage.local_dir.clone())
            .with_min_protocol_version(cfg.consumer.min_protocol_version);
        let state = bridge.init(cfg.consumer.signal());
        tracing::info!(state = ?state, "sync bridge state");

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            store,
            bridge: Arc::new(bridge),
        })
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<PolicyStore> {
        Arc::clone(&self.store)
    }

    pub fn bridge(&self) -> Arc<SyncBridge> {
        Arc::clone(&self.bridge)
    }

    /// Open a picker over `source`, leaving out the configured `self_package`.
    pub fn open_picker<F>(
        &self,
        source: Arc<dyn PackageSource>,
        on_ready: F,
    ) -> (PickerSession, tokio::task::JoinHandle<()>)
    where
        F: FnOnce(Result<Vec<AppInfo>>) + Send + 'static,
    {
        PickerSession::open(source, self.cfg().self_package.clone(), on_ready)
    }

    /// Run a batch of store edits, then push once.
    ///
    /// The push runs even if an edit failed partway, so whatever did persist
    /// reaches the consumer; the edit error is returned in that case.
    pub fn edit_and_sync<F>(&self, edit: F) -> Result<SyncOutcome>
    where
        F: FnOnce(&PolicyStore) -> Result<()>,
    {
        let edited = edit(&self.store);
        let synced = self.bridge.sync_config();
        edited?;
        synced
    }
}
