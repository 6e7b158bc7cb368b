//! Propagation of the policy snapshot to the enforcement consumer.
//!
//! Pull-based: the bridge overwrites the consumer-readable record and the
//! consumer re-reads it on its own schedule. There is no notification channel.

pub mod bridge;
pub mod migrate;

pub use bridge::{BridgeState, BridgeStatus, ConsumerSignal, SyncBridge, SyncOutcome};
pub use migrate::{migrate_if_needed, MigrationOutcome};
