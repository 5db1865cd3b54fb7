#![allow(dead_code)]

//! Test infrastructure for idm-server router tests

use idm_auth::bakery::{cookie_name, declared_caveat, encode_cookie_value};
use idm_auth::{AdminCredentials, AuthError, Authorizer, Bakery};
use idm_server::{AppState, build_router};
use idm_store::{NoDirectory, StoreParams, open_store_pool};

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, body::Body, http::Request, response::Response};
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use http_body_util::BodyExt;
use tempfile::TempDir;

pub const LOCATION: &str = "https://identity.test/id";
/// Basic auth for test-admin / open sesame
pub const ADMIN_AUTHORIZATION: &str = "Basic dGVzdC1hZG1pbjpvcGVuIHNlc2FtZQ==";

pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Cookie header value for a client that logged in as `username`
    pub fn login_cookie(&self, username: &str) -> String {
        let authorizer = &self.state.authorizer;
        let AuthError::DischargeRequired { macaroon, .. } = authorizer.discharge_required("login")
        else {
            panic!("expected a discharge-required macaroon");
        };
        let primary = *macaroon;
        let mut slice = vec![primary.clone()];
        for caveat in primary.third_party_caveats() {
            let discharge = authorizer
                .bakery()
                .discharge(&caveat.id, &[declared_caveat("username", username)])
                .unwrap()
                .bind(&primary);
            slice.push(discharge);
        }
        format!("{}={}", cookie_name(&slice), encode_cookie_value(&slice).unwrap())
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(10, Duration::from_secs(1)).await
}

pub async fn create_test_app_with(max_sessions: usize, request_timeout: Duration) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = open_store_pool(StoreParams {
        database_path: dir.path().join("idm.db"),
        max_sessions,
        request_timeout,
        directory: Arc::new(NoDirectory),
    })
    .await
    .expect("Failed to open store pool");

    let authorizer = Authorizer::new(
        AdminCredentials::new("test-admin", "open sesame"),
        Arc::new(Bakery::new(LOCATION, [9u8; 32])),
    );

    TestApp {
        state: AppState::new(pool, Arc::new(authorizer)),
        _dir: dir,
    }
}

pub fn admin_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, ADMIN_AUTHORIZATION);
    with_body(builder, body)
}

pub fn cookie_request(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(COOKIE, cookie);
    with_body(builder, None)
}

pub fn anonymous_request(method: &str, uri: &str) -> Request<Body> {
    with_body(Request::builder().method(method).uri(uri), None)
}

fn with_body(builder: http::request::Builder, body: Option<serde_json::Value>) -> Request<Body> {
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// 32-byte key in standard base64
pub fn encoded_key(fill: u8) -> String {
    idm_core::PublicKey::from_bytes(vec![fill; 32]).to_string()
}
