use crate::models::public_key::PUBLIC_KEY_LENGTH;
use crate::{CoreError, PublicKey};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use googletest::prelude::*;

#[test]
fn given_32_byte_base64_when_parsed_then_key_round_trips_to_text() {
    let text = STANDARD.encode([7u8; PUBLIC_KEY_LENGTH]);

    let key = PublicKey::parse(&text).unwrap();

    assert_that!(key.as_bytes(), eq(&[7u8; PUBLIC_KEY_LENGTH][..]));
    assert_that!(key.to_string(), eq(&text));
}

#[test]
fn given_short_key_when_parsed_then_wrong_length_error() {
    let text = STANDARD.encode([1u8; 16]);

    let err = PublicKey::parse(&text).unwrap_err();

    assert!(matches!(err, CoreError::InvalidPublicKey { .. }));
    assert_that!(
        err.to_string(),
        contains_substring("wrong length: expected 32 bytes, got 16")
    );
}

#[test]
fn given_non_base64_when_parsed_then_error() {
    assert_that!(PublicKey::parse("not base64!"), err(anything()));
}

#[test]
fn given_stored_key_of_any_length_when_deserialized_then_accepted() {
    let key: PublicKey = serde_json::from_str("\"AQID\"").unwrap();

    assert_that!(key.as_bytes(), eq(&[1u8, 2, 3][..]));
}
