//! Top-level facade crate for appveil.
//!
//! Re-exports the policy contracts and the bridge library so users can depend on a single crate.

pub mod core {
    pub use appveil_core::*;
}

pub mod bridge {
    pub use appveil_bridge::*;
}
