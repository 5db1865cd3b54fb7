use crate::{AuthError, Result as AuthErrorResult};

use idm_core::ErrorLocation;

use std::fmt;
use std::panic::Location;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use subtle::ConstantTimeEq;

/// The administrator's HTTP basic-auth credentials.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check the request's `Authorization` header against the admin
    /// credentials.
    ///
    /// A missing header is reported as `NoAdminCredsProvided` so callers can
    /// fall back to other credentials; any header that is present but wrong
    /// is `Unauthorized`.
    #[track_caller]
    pub fn check(&self, headers: &HeaderMap) -> AuthErrorResult<()> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Err(AuthError::NoAdminCredsProvided {
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let encoded = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Basic "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::unauthorized("invalid or missing HTTP auth header"))?;

        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| AuthError::unauthorized("invalid HTTP auth encoding"))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::unauthorized("invalid HTTP auth contents"))?;

        let username_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        if bool::from(username_ok & password_ok) {
            Ok(())
        } else {
            Err(AuthError::unauthorized("invalid credentials"))
        }
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
