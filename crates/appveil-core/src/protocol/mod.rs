//! Wire contract shared with the enforcement consumer.
//!
//! The storage name and key names below are read verbatim by the consumer.
//! Changing any of them requires bumping [`PROTOCOL_VERSION`].

pub mod codec;

/// Contract version. Bump on any change to the names below or to the
/// linked-apps encoding.
pub const PROTOCOL_VERSION: u32 = 1;

/// File name of the prefs record, both local and external.
pub const PREFS_FILE_NAME: &str = "hide_config.json";

/// Set of blacklisted subjects.
pub const KEY_BLACKLIST: &str = "blacklist_apps";

/// Set of whitelisted (sandboxed) subjects.
pub const KEY_WHITELIST: &str = "whitelist_apps";

/// Linked-apps mapping, encoded with [`codec::encode`].
pub const KEY_LINKED: &str = "linked_apps";

/// Value stored when no linked-apps record exists yet.
pub const EMPTY_LINKED: &str = "{}";
