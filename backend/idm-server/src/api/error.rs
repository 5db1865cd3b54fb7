//! JSON error responses for the HTTP API

use idm_auth::{AuthError, Macaroon};
use idm_core::{CoreError, ErrorCode};
use idm_store::StoreError;

use std::panic::Location;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Machine-readable code, e.g. "NOT_FOUND"
    pub code: String,
    pub message: String,
    /// Macaroon to discharge before retrying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macaroon: Option<Box<Macaroon>>,
    /// Cookie path for the discharged macaroon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macaroon_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {message} {location}")]
    NotFound {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bad request: {message} {location}")]
    BadRequest {
        message: String,
        location: ErrorLocation,
    },

    #[error("Conflict: {message} {location}")]
    Conflict {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unauthorized: {message} {location}")]
    Unauthorized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Forbidden: {message} {location}")]
    Forbidden {
        message: String,
        location: ErrorLocation,
    },

    #[error("Discharge required: {message} {location}")]
    DischargeRequired {
        message: String,
        macaroon: Box<Macaroon>,
        macaroon_path: String,
        location: ErrorLocation,
    },

    #[error("Service unavailable: {message} {location}")]
    ServiceUnavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let location = ErrorLocation::from(Location::caller());
        match code {
            ErrorCode::NotFound => Self::NotFound { message, location },
            ErrorCode::AlreadyExists => Self::Conflict { message, location },
            ErrorCode::BadRequest => Self::BadRequest { message, location },
            ErrorCode::Unauthorized
            | ErrorCode::NoAdminCredsProvided
            | ErrorCode::DischargeRequired => Self::Unauthorized { message, location },
            ErrorCode::Forbidden => Self::Forbidden { message, location },
            ErrorCode::ServiceUnavailable => Self::ServiceUnavailable { message, location },
            ErrorCode::Internal => {
                // Details stay in the server log
                log::error!("Internal error: {}", message);
                Self::Internal {
                    message: "internal error".to_string(),
                    location,
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized { .. } | Self::DischargeRequired { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::BadRequest { .. } => ErrorCode::BadRequest,
            Self::Conflict { .. } => ErrorCode::AlreadyExists,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::DischargeRequired { .. } => ErrorCode::DischargeRequired,
            Self::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("{}", self);
        }

        let code = self.code().as_str().to_string();
        let body = match self {
            ApiError::DischargeRequired {
                message,
                macaroon,
                macaroon_path,
                ..
            } => ApiErrorBody {
                code,
                message,
                macaroon: Some(macaroon),
                macaroon_path: Some(macaroon_path),
            },
            ApiError::NotFound { message, .. }
            | ApiError::BadRequest { message, .. }
            | ApiError::Conflict { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::ServiceUnavailable { message, .. }
            | ApiError::Internal { message, .. } => ApiErrorBody {
                code,
                message,
                macaroon: None,
                macaroon_path: None,
            },
        };

        let mut response = (status, Json(ApiErrorResponse { error: body })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Macaroon"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    #[track_caller]
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::DischargeRequired {
                message,
                macaroon,
                macaroon_path,
                ..
            } => ApiError::DischargeRequired {
                message,
                macaroon,
                macaroon_path,
                location: ErrorLocation::from(Location::caller()),
            },
            AuthError::Store { source } => source.into(),
            AuthError::Unauthorized { message, .. } => {
                ApiError::from_code(ErrorCode::Unauthorized, message)
            }
            AuthError::Forbidden { message, .. } => {
                ApiError::from_code(ErrorCode::Forbidden, message)
            }
            other => ApiError::from_code(other.error_code(), other.to_string()),
        }
    }
}

/// Client-facing messages leave out the error location.
impl From<StoreError> for ApiError {
    #[track_caller]
    fn from(e: StoreError) -> Self {
        let code = e.error_code();
        match e {
            StoreError::NotFound { username, .. } => {
                ApiError::from_code(code, format!("user {:?} not found", username))
            }
            StoreError::Duplicate { .. } => {
                ApiError::from_code(code, "duplicate username or external_id")
            }
            StoreError::Core { source } => source.into(),
            StoreError::PoolLimitExceeded { kind, .. } => ApiError::from_code(
                code,
                format!("too many {} sessions in use", kind),
            ),
            other => ApiError::from_code(code, other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    #[track_caller]
    fn from(e: CoreError) -> Self {
        let message = match &e {
            CoreError::IllegalUsername { username, .. } => {
                format!("illegal username {:?}", username)
            }
            CoreError::InvalidPublicKey { value, message, .. } => {
                format!("invalid public key {:?}: {}", value, message)
            }
            CoreError::InvalidRecord { message, .. } => message.clone(),
        };
        ApiError::from_code(e.error_code(), message)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
