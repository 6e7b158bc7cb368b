//! Linked-apps decoding vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use appveil_core::protocol::codec::{decode, encode};

mod vector_loader;

#[test]
fn linked_vectors() {
    let files = [
        "linked_two_entries.json",
        "linked_empty_object.json",
        "linked_empty_text.json",
        "linked_truncated.json",
        "linked_wrong_shape.json",
    ];

    for f in files {
        let v = vector_loader::load(f);
        let d = decode(&v.input);
        assert_eq!(d.is_recovered(), v.recovered, "vector={}", v.description);
        assert_eq!(d.into_linked(), v.expect, "vector={}", v.description);
    }
}

#[test]
fn clean_vectors_reencode_to_equal_mapping() {
    let v = vector_loader::load("linked_two_entries.json");
    let m = decode(&v.input).into_linked();
    let again = decode(&encode(&m).unwrap()).into_linked();
    assert_eq!(again, m);
}
