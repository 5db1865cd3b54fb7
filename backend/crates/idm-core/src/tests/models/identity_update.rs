use crate::{Identity, IdentityUpdate, PublicKey};

use chrono::{TimeZone, Utc};
use googletest::prelude::*;

#[test]
fn given_empty_update_when_checked_then_is_empty() {
    assert!(IdentityUpdate::new().is_empty());
    assert!(!IdentityUpdate::new().with_email("a@b").is_empty());
}

#[test]
fn given_update_when_applied_then_only_set_fields_change() {
    let mut identity = Identity::interactive("bob", "ext")
        .with_email("old@example.com")
        .with_full_name("Bob")
        .with_ssh_keys(["ssh-rsa AAA"]);

    IdentityUpdate::new()
        .with_email("new@example.com")
        .with_groups(["a", "b", "a"])
        .apply_to(&mut identity);

    assert_that!(identity.email, eq("new@example.com"));
    assert_that!(identity.full_name, eq("Bob"));
    assert_that!(identity.groups, elements_are![eq("a"), eq("b")]);
    assert_that!(identity.ssh_keys, elements_are![eq("ssh-rsa AAA")]);
}

#[test]
fn given_extra_info_set_and_unset_when_applied_then_map_updated() {
    let mut identity = Identity::interactive("bob", "ext");
    identity.extra_info.insert("keep".to_string(), b"1".to_vec());
    identity.extra_info.insert("drop".to_string(), b"2".to_vec());

    IdentityUpdate::new()
        .set_extra_info("new", b"3".to_vec())
        .remove_extra_info("drop")
        .apply_to(&mut identity);

    assert_that!(identity.extra_info.len(), eq(2));
    assert_eq!(identity.extra_info.get("keep"), Some(&b"1".to_vec()));
    assert_eq!(identity.extra_info.get("new"), Some(&b"3".to_vec()));
    assert!(!identity.extra_info.contains_key("drop"));
}

#[test]
fn given_timestamps_and_keys_when_applied_then_replaced() {
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let mut identity = Identity::agent("bot", "alice");

    IdentityUpdate::new()
        .with_last_login(at)
        .with_last_discharge(at)
        .with_public_keys(vec![PublicKey::from_bytes(vec![9; 32])])
        .apply_to(&mut identity);

    assert_that!(identity.last_login, some(eq(at)));
    assert_that!(identity.last_discharge, some(eq(at)));
    assert_that!(identity.public_keys.len(), eq(1));
}
