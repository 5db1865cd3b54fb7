pub mod error_code;

// -------------------------------------------------------------------------- //

use crate::{ErrorCode, ErrorLocation};

use std::result::Result as StdResult;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("illegal username {username:?} {location}")]
    IllegalUsername {
        username: String,
        location: ErrorLocation,
    },

    #[error("invalid public key {value:?}: {message} {location}")]
    InvalidPublicKey {
        value: String,
        message: String,
        location: ErrorLocation,
    },

    /// Identity document rejected before it reached storage
    #[error("{message} {location}")]
    InvalidRecord {
        message: String,
        location: ErrorLocation,
    },
}

impl CoreError {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::BadRequest
    }
}

pub type Result<T> = StdResult<T, CoreError>;
