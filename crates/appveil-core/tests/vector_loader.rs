//! JSON test vector loader for linked-apps decoding tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LinkedVector {
    pub description: String,
    /// Raw blob as it would sit under the `linked_apps` key.
    pub input: String,
    /// Expected mapping after decoding.
    pub expect: BTreeMap<String, BTreeSet<String>>,
    /// Whether the decoder should report recovery.
    #[serde(default)]
    pub recovered: bool,
}

pub fn load(name: &str) -> LinkedVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
