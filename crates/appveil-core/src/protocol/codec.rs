//! Linked-apps text codec (JSON object of arrays).
//!
//! Decoding never fails: malformed input is reported as
//! [`Decoded::Recovered`] carrying an empty mapping, so first-run and
//! corrupt-state cases stay distinguishable from a clean decode.

use crate::error::{AppVeilError, Result};
use crate::snapshot::LinkedApps;

/// Outcome of decoding a linked-apps blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Input parsed cleanly.
    Clean(LinkedApps),
    /// Input was empty or malformed; the empty mapping was substituted.
    Recovered { reason: String },
}

impl Decoded {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Decoded::Recovered { .. })
    }

    /// Mapping to use: the decoded one, or empty after recovery.
    pub fn into_linked(self) -> LinkedApps {
        match self {
            Decoded::Clean(m) => m,
            Decoded::Recovered { .. } => LinkedApps::new(),
        }
    }
}

/// Encode the mapping. Key order follows the ordered map, so output is stable.
pub fn encode(linked: &LinkedApps) -> Result<String> {
    serde_json::to_string(linked).map_err(|e| AppVeilError::Codec(format!("encode linked apps: {e}")))
}

/// Decode a linked-apps blob.
pub fn decode(text: &str) -> Decoded {
    if text.trim().is_empty() {
        return Decoded::Recovered {
            reason: "empty input".into(),
        };
    }

    // `null` is what older writers stored for an absent mapping.
    match serde_json::from_str::<Option<LinkedApps>>(text) {
        Ok(m) => Decoded::Clean(m.unwrap_or_default()),
        Err(e) => {
            tracing::warn!(error = %e, "linked apps blob is malformed, using empty mapping");
            Decoded::Recovered {
                reason: e.to_string(),
            }
        }
    }
}
