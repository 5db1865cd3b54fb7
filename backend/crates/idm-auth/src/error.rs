use crate::bakery::{BakeryError, Macaroon};

use idm_core::{CoreError, ErrorCode, ErrorLocation};
use idm_store::StoreError;

use std::panic::Location;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no admin credentials provided {location}")]
    NoAdminCredsProvided { location: ErrorLocation },

    #[error("unauthorized: {message} {location}")]
    Unauthorized {
        message: String,
        location: ErrorLocation,
    },

    #[error("forbidden: {message} {location}")]
    Forbidden {
        message: String,
        location: ErrorLocation,
    },

    /// No usable credential; the client should discharge `macaroon` and
    /// retry with it attached as a cookie at `macaroon_path`.
    #[error("discharge required: {message} {location}")]
    DischargeRequired {
        message: String,
        macaroon: Box<Macaroon>,
        macaroon_path: String,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("cannot mint macaroon: {source} {location}")]
    Bakery {
        source: BakeryError,
        location: ErrorLocation,
    },
}

impl AuthError {
    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NoAdminCredsProvided { .. } => ErrorCode::NoAdminCredsProvided,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::DischargeRequired { .. } => ErrorCode::DischargeRequired,
            Self::Store { source } => source.error_code(),
            Self::Bakery { .. } => ErrorCode::Internal,
        }
    }
}

impl From<BakeryError> for AuthError {
    #[track_caller]
    fn from(source: BakeryError) -> Self {
        Self::Bakery {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure of a single first-party caveat.
#[derive(Error, Debug)]
pub enum CaveatError {
    #[error("caveat badly formatted {location}")]
    BadlyFormatted { location: ErrorLocation },

    #[error("{source}")]
    InvalidArgument {
        #[from]
        source: CoreError,
    },

    #[error("public key not valid for user {location}")]
    PublicKeyNotValid { location: ErrorLocation },

    #[error("macaroon has expired {location}")]
    Expired { location: ErrorLocation },

    #[error("operation {operation:?} not allowed {location}")]
    OperationNotAllowed {
        operation: String,
        location: ErrorLocation,
    },

    #[error("caveat {condition:?} not satisfied: unrecognized condition {location}")]
    Unrecognized {
        condition: String,
        location: ErrorLocation,
    },

    #[error("{source}")]
    Store {
        #[from]
        source: StoreError,
    },
}

impl CaveatError {
    #[track_caller]
    pub fn badly_formatted() -> Self {
        Self::BadlyFormatted {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn public_key_not_valid() -> Self {
        Self::PublicKeyNotValid {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Failures the client can fix by getting a fresh credential.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}
