//! appveil core: policy data model, linked-apps codec, wire contract, and the
//! visibility decision shared by the authoring side and the enforcement side.
//!
//! This crate carries no storage, runtime, or transport dependencies so the
//! same types can be used by the bridge process and by consumer tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Corrupt persisted state is recovered as an explicit `Decoded::Recovered`
//! value instead of an error so neither process stops on bad input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod snapshot;
pub mod visibility;

/// Shared result type.
pub use error::{AppVeilError, Result};
pub use protocol::codec::{decode, encode, Decoded};
pub use snapshot::{LinkedApps, PolicySnapshot, Subject, SubjectSet};
pub use visibility::VisibilityRules;
