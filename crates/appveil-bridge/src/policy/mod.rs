//! Policy layer: the canonical blacklist/whitelist/linked-apps store.
//!
//! Every mutation persists to the local prefs record before returning.
//! Propagation to the consumer is a separate, explicit step
//! (see [`crate::sync::SyncBridge::sync_config`]).

pub mod store;

pub use store::{PolicyStore, PolicySummary};
