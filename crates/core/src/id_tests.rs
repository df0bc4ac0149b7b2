// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;
use std::str::FromStr;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId;
}

#[test]
fn define_id_new_ids_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
}

#[test]
fn define_id_default_generates_fresh_id() {
    assert_ne!(TestId::default(), TestId::default());
}

#[test]
fn define_id_round_trips_through_display_and_parse() {
    let id = TestId::new();
    let parsed = TestId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn define_id_from_uuid() {
    let raw = uuid::Uuid::new_v4();
    let id = TestId::from(raw);
    assert_eq!(id.as_uuid(), raw);
}

#[test]
fn define_id_rejects_garbage() {
    assert!(TestId::parse_str("not-a-uuid").is_err());
}

#[test]
fn define_id_usable_as_hash_map_key() {
    let id = TestId::new();
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get(&id), Some(&42));
}

#[test]
fn define_id_serde_round_trip() {
    let id = TestId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

// --- short() tests ---

#[test]
fn short_truncates() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
}

#[test]
fn short_returns_full_when_shorter() {
    assert_eq!(short("abc", 8), "abc");
}

#[test]
fn short_returns_full_when_exact() {
    assert_eq!(short("abcdefgh", 8), "abcdefgh");
}
