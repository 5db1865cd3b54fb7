mod common;

use common::{create_test_auth, public_key, test_user};

use idm_auth::{CaveatChecker, CaveatError, UserHasPublicKeyChecker};

use googletest::prelude::*;

async fn check(arg: &str) -> std::result::Result<Option<idm_core::Identity>, CaveatError> {
    let auth = create_test_auth().await;
    let mut store = auth.pool.get().await.unwrap();
    store.upsert_identity(&test_user(), None).await.unwrap();
    UserHasPublicKeyChecker.check(&mut store, arg).await
}

fn assert_fails_with(result: std::result::Result<Option<idm_core::Identity>, CaveatError>, expected: &str) {
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with(expected), "{err}");
}

#[tokio::test]
async fn given_holder_of_key_when_checked_then_identity_returned() {
    let identity = check(&format!("test {}", public_key(1))).await.unwrap();

    assert_that!(identity.map(|i| i.username), some(eq("test")));
}

#[tokio::test]
async fn given_unknown_user_when_checked_then_public_key_not_valid() {
    let result = check(&format!("test2 {}", public_key(1))).await;

    assert_fails_with(result, "public key not valid for user");
}

#[tokio::test]
async fn given_wrong_key_when_checked_then_public_key_not_valid() {
    let result = check(&format!("test {}", public_key(2))).await;

    assert_fails_with(result, "public key not valid for user");
}

#[tokio::test]
async fn given_missing_key_when_checked_then_badly_formatted() {
    let result = check("test").await;

    assert_fails_with(result, "caveat badly formatted");
}

#[tokio::test]
async fn given_illegal_username_when_checked_then_illegal_username() {
    let result = check(&format!("= {}", public_key(1))).await;

    assert_fails_with(result, "illegal username \"=\"");
}

#[tokio::test]
async fn given_truncated_key_when_checked_then_invalid_public_key() {
    let key = public_key(1).to_string();

    let result = check(&format!("test {}", &key[1..])).await;

    assert_fails_with(result, "invalid public key");
}
