//! Durable key-value storage for the policy record.
//!
//! The same file layout is used for the local record and for the
//! consumer-readable copy, which is what lets migration copy the file
//! verbatim.

pub mod prefs;

use appveil_core::error::Result;
use appveil_core::protocol::codec::{self, Decoded};
use appveil_core::protocol::{EMPTY_LINKED, KEY_BLACKLIST, KEY_LINKED, KEY_WHITELIST};
use appveil_core::PolicySnapshot;

pub use prefs::{PrefValue, PrefsEditor, PrefsFile};

/// Write all three policy fields: three puts, one commit.
pub fn write_snapshot(prefs: &mut PrefsFile, snapshot: &PolicySnapshot) -> Result<()> {
    let linked = codec::encode(&snapshot.linked)?;
    let mut editor = prefs.edit();
    editor
        .put_string_set(KEY_BLACKLIST, snapshot.blacklist.clone())
        .put_string_set(KEY_WHITELIST, snapshot.whitelist.clone())
        .put_string(KEY_LINKED, linked);
    editor.commit()
}

/// Read the policy fields. Missing keys read as empty; the linked blob goes
/// through the recovering decoder and its outcome is returned alongside.
pub fn read_snapshot(prefs: &PrefsFile) -> (PolicySnapshot, Decoded) {
    let blacklist = prefs.get_string_set(KEY_BLACKLIST).unwrap_or_default();
    let whitelist = prefs.get_string_set(KEY_WHITELIST).unwrap_or_default();
    let raw = prefs
        .get_string(KEY_LINKED)
        .unwrap_or_else(|| EMPTY_LINKED.to_string());

    let decoded = codec::decode(&raw);
    let snapshot = PolicySnapshot {
        blacklist,
        whitelist,
        linked: decoded.clone().into_linked(),
    };
    (snapshot, decoded)
}
