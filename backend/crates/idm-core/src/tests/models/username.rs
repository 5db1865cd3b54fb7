use crate::{CoreError, Username};

use googletest::prelude::*;

#[test]
fn given_valid_usernames_when_parsed_then_ok() {
    for name in ["bob", "bob.smith", "a+b-c_d@example", "X1"] {
        let parsed = Username::parse(name);
        assert_that!(parsed.unwrap().as_str(), eq(name));
    }
}

#[test]
fn given_illegal_usernames_when_parsed_then_error() {
    for name in ["", "=", "bob=smith", ".bob", "-bob", "bob smith", "bób"] {
        assert!(Username::parse(name).is_err(), "{name:?}");
    }
}

#[test]
fn given_illegal_username_when_parsed_then_message_quotes_value() {
    let err = Username::parse("=").unwrap_err();

    assert!(matches!(err, CoreError::IllegalUsername { .. }));
    assert_that!(err.to_string(), starts_with("illegal username \"=\""));
}

#[test]
fn given_overlong_username_when_parsed_then_error() {
    let name = "a".repeat(257);

    assert_that!(Username::parse(&name), err(anything()));
    assert_that!(Username::parse(&name[..256]), ok(anything()));
}

#[test]
fn given_json_string_when_deserialized_then_validated() {
    let ok_name: std::result::Result<Username, _> = serde_json::from_str("\"alice\"");
    let bad_name: std::result::Result<Username, _> = serde_json::from_str("\"al ice\"");

    assert_that!(ok_name, ok(anything()));
    assert_that!(bad_name, err(anything()));
}
