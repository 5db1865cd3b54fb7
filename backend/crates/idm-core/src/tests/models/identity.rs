use crate::{CoreError, Identity, PublicKey};

use googletest::prelude::*;

#[test]
fn given_interactive_identity_when_validated_then_ok() {
    let identity = Identity::interactive("bob", "http://example.com/+id/bob");

    assert_that!(identity.validate(), ok(anything()));
    assert!(!identity.is_agent());
}

#[test]
fn given_agent_identity_when_validated_then_ok() {
    let identity = Identity::agent("bot@alice", "alice");

    assert_that!(identity.validate(), ok(anything()));
    assert!(identity.is_agent());
}

#[test]
fn given_identity_without_external_id_or_owner_when_validated_then_error() {
    let identity = Identity {
        username: "bob".to_string(),
        external_id: Some(String::new()),
        ..Identity::default()
    };

    let err = identity.validate().unwrap_err();

    assert!(matches!(err, CoreError::InvalidRecord { .. }));
    assert_that!(
        err.to_string(),
        starts_with("no external_id or owner specified")
    );
}

#[test]
fn given_identity_with_both_external_id_and_owner_when_validated_then_error() {
    let mut identity = Identity::interactive("bob", "ext");
    identity.owner = Some("alice".to_string());

    let err = identity.validate().unwrap_err();

    assert_that!(
        err.to_string(),
        starts_with("both external_id and owner specified")
    );
}

#[test]
fn given_identity_without_username_when_validated_then_error() {
    let identity = Identity::interactive("", "ext");

    assert_that!(identity.validate(), err(anything()));
}

#[test]
fn given_identity_with_key_when_checking_same_bytes_then_found() {
    let identity =
        Identity::agent("bot", "alice").with_public_keys(vec![PublicKey::from_bytes(vec![1, 2, 3])]);

    assert!(identity.has_public_key(&PublicKey::from_bytes(vec![1, 2, 3])));
    assert!(!identity.has_public_key(&PublicKey::from_bytes(vec![1, 2])));
}

#[test]
fn given_identity_with_empty_owner_and_duplicate_groups_when_normalized_then_cleaned() {
    let mut identity = Identity::interactive("bob", "ext").with_groups(["g1", "g2", "g1"]);
    identity.owner = Some(String::new());

    let normalized = identity.normalized();

    assert_that!(normalized.owner, none());
    assert_that!(normalized.external_id, some(eq("ext")));
    assert_that!(normalized.groups, elements_are![eq("g1"), eq("g2")]);
}
