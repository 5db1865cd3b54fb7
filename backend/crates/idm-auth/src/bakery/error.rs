use idm_core::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BakeryError {
    #[error("no discharge for third party caveat at {third_party} {location}")]
    MissingDischarge {
        third_party: String,
        location: ErrorLocation,
    },

    #[error("macaroon signature mismatch {location}")]
    InvalidSignature { location: ErrorLocation },

    #[error("malformed macaroon: {message} {location}")]
    Malformed {
        message: String,
        location: ErrorLocation,
    },

    #[error("cannot add caveat for unknown third party {third_party} {location}")]
    UnknownThirdParty {
        third_party: String,
        location: ErrorLocation,
    },

    #[error("encryption failure {location}")]
    Crypto { location: ErrorLocation },
}

impl BakeryError {
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BakeryError>;
