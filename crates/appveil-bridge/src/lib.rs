//! appveil bridge library entry.
//!
//! Wires the policy store, its prefs backing, the sync bridge to the
//! enforcement consumer, app enumeration for pickers, and the read-only
//! diagnostics router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod catalog;
pub mod config;
pub mod consumer;
pub mod ops;
pub mod policy;
pub mod router;
pub mod storage;
pub mod sync;
