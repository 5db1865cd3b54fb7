#![allow(dead_code)]

use idm_auth::bakery::{Caveat, Macaroon, cookie_name, declared_caveat, encode_cookie_value};
use idm_auth::{AdminCredentials, AuthError, Authorizer, Bakery};
use idm_core::{Identity, PublicKey};
use idm_store::{NoDirectory, StoreParams, StorePool, open_store_pool};

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};
use tempfile::TempDir;

pub const LOCATION: &str = "https://identity.test/id";
/// Basic auth for test-admin / open sesame
pub const ADMIN_AUTHORIZATION: &str = "Basic dGVzdC1hZG1pbjpvcGVuIHNlc2FtZQ==";

pub struct TestAuth {
    pub pool: StorePool,
    pub authorizer: Authorizer,
    _dir: TempDir,
}

pub async fn create_test_auth() -> TestAuth {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = open_store_pool(StoreParams {
        database_path: dir.path().join("idm.db"),
        max_sessions: 10,
        request_timeout: Duration::from_secs(1),
        directory: Arc::new(NoDirectory),
    })
    .await
    .expect("Failed to open store pool");

    let authorizer = Authorizer::new(
        AdminCredentials::new("test-admin", "open sesame"),
        Arc::new(Bakery::new(LOCATION, [42u8; 32])),
    );

    TestAuth {
        pool,
        authorizer,
        _dir: dir,
    }
}

pub fn public_key(fill: u8) -> PublicKey {
    PublicKey::from_bytes(vec![fill; 32])
}

pub fn test_user() -> Identity {
    Identity::interactive("test", "https://example.com/test")
        .with_groups(["test-group1", "test-group2"])
        .with_public_keys(vec![public_key(1)])
}

pub fn admin_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, ADMIN_AUTHORIZATION.parse().unwrap());
    headers
}

pub fn cookie_headers(slices: &[Vec<Macaroon>]) -> HeaderMap {
    let cookie = slices
        .iter()
        .map(|slice| {
            format!(
                "{}={}",
                cookie_name(slice),
                encode_cookie_value(slice).unwrap()
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie.parse().unwrap());
    headers
}

/// The macaroon a fresh client is asked to discharge
pub fn required_macaroon(authorizer: &Authorizer) -> Macaroon {
    match authorizer.discharge_required("test") {
        AuthError::DischargeRequired { macaroon, .. } => *macaroon,
        other => panic!("expected discharge required, got {other}"),
    }
}

/// Discharge every third-party caveat on `primary` with the given caveats
/// and return the complete slice.
pub fn discharged(authorizer: &Authorizer, primary: Macaroon, caveats: &[Caveat]) -> Vec<Macaroon> {
    let mut slice = vec![primary.clone()];
    for caveat in primary.third_party_caveats() {
        let discharge = authorizer
            .bakery()
            .discharge(&caveat.id, caveats)
            .unwrap()
            .bind(&primary);
        slice.push(discharge);
    }
    slice
}

pub fn logged_in_as(authorizer: &Authorizer, username: &str) -> Vec<Macaroon> {
    discharged(
        authorizer,
        required_macaroon(authorizer),
        &[declared_caveat("username", username)],
    )
}
