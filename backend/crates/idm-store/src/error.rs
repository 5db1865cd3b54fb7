use idm_core::{CoreError, ErrorCode, ErrorLocation};

use std::panic::Location;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user \"{username}\" not found {location}")]
    NotFound {
        username: String,
        location: ErrorLocation,
    },

    #[error("cannot add user: duplicate username or external_id {location}")]
    Duplicate { location: ErrorLocation },

    #[error("{source}")]
    Core {
        #[source]
        source: CoreError,
    },

    #[error("too many {kind} sessions in use: pool limit exceeded {location}")]
    PoolLimitExceeded {
        kind: &'static str,
        location: ErrorLocation,
    },

    #[error("{kind} pool closed {location}")]
    PoolClosed {
        kind: &'static str,
        location: ErrorLocation,
    },

    #[error("SQLx error: {source} {location}")]
    Sqlx {
        source: sqlx::Error,
        location: ErrorLocation,
    },

    #[error("Database initialization failed: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("Migration error: {message} {location}")]
    Migration {
        message: String,
        location: ErrorLocation,
    },

    #[error("cannot decode stored identity: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("group directory error: {message} {location}")]
    Directory {
        message: String,
        location: ErrorLocation,
    },

    #[error("group directory request failed: {source} {location}")]
    Http {
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl StoreError {
    #[track_caller]
    pub fn not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            username: username.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Duplicate { .. } => ErrorCode::AlreadyExists,
            Self::Core { source } => source.error_code(),
            Self::PoolLimitExceeded { .. } => ErrorCode::ServiceUnavailable,
            Self::PoolClosed { .. }
            | Self::Sqlx { .. }
            | Self::Initialization { .. }
            | Self::Migration { .. }
            | Self::Decode { .. }
            | Self::Directory { .. }
            | Self::Http { .. } => ErrorCode::Internal,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(source: CoreError) -> Self {
        Self::Core { source }
    }
}

impl From<reqwest::Error> for StoreError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::decode(source.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
