use crate::ApiError;

use idm_auth::{AuthError, Bakery};
use idm_core::{CoreError, ErrorCode, Username};
use idm_store::StoreError;

use std::panic::Location;

use axum::response::IntoResponse;
use error_location::ErrorLocation;
use http::StatusCode;
use http::header::WWW_AUTHENTICATE;
use http_body_util::BodyExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn given_store_not_found_when_converted_then_404_without_location() {
    // Given
    let error: ApiError = StoreError::not_found("bob").into();

    // When
    let response = error.into_response();

    // Then
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "user \"bob\" not found");
}

#[tokio::test]
async fn given_illegal_username_when_converted_then_400() {
    let core: CoreError = Username::parse("=").unwrap_err();
    let response = ApiError::from(core).into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert_eq!(json["error"]["message"], "illegal username \"=\"");
}

#[tokio::test]
async fn given_duplicate_when_converted_then_409() {
    let error: ApiError = StoreError::Duplicate {
        location: ErrorLocation::from(Location::caller()),
    }
    .into();

    assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn given_pool_limit_when_converted_then_503() {
    let error: ApiError = StoreError::PoolLimitExceeded {
        kind: "database",
        location: ErrorLocation::from(Location::caller()),
    }
    .into();

    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn given_unauthorized_when_converted_then_401_with_challenge() {
    let response = ApiError::from(AuthError::unauthorized("invalid credentials")).into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Macaroon");
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "invalid credentials");
    assert!(json["error"].get("macaroon").is_none());
}

#[tokio::test]
async fn given_forbidden_when_converted_then_403() {
    let response = ApiError::from(AuthError::forbidden("not a member")).into_response();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn given_discharge_required_when_converted_then_401_with_macaroon() {
    // Given
    let bakery = Bakery::new("https://identity.test/id", [3u8; 32]);
    let macaroon = bakery.new_macaroon(&[]).unwrap();
    let error = AuthError::DischargeRequired {
        message: "authentication required".to_string(),
        macaroon: Box::new(macaroon),
        macaroon_path: "/id".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // When
    let response = ApiError::from(error).into_response();

    // Then
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Macaroon");
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], ErrorCode::DischargeRequired.as_str());
    assert_eq!(json["error"]["macaroon_path"], "/id");
    assert_eq!(json["error"]["macaroon"]["location"], "https://identity.test/id");
}

#[tokio::test]
async fn given_internal_error_when_converted_then_details_hidden() {
    let response = ApiError::from_code(ErrorCode::Internal, "disk on fire").into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "internal error");
}
