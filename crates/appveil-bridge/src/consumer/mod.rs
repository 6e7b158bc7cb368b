//! Consumer-side reader of the synced record.
//!
//! The enforcement process itself lives outside this crate. This is the
//! reference implementation of its read path, used by diagnostics and tests
//! to check what the consumer would decide.

pub mod reader;

pub use reader::SnapshotReader;
