use crate::{CoreError, ErrorLocation, Result as CoreErrorResult};

use std::fmt;
use std::panic::Location;
use std::result::Result as StdResult;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length in bytes of a key presented in text form
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Raw public key bytes.
///
/// Keys held on an identity are arbitrary byte strings; only keys parsed from
/// their text form (caveat arguments, API input) must be exactly
/// [`PUBLIC_KEY_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse the standard base64 text form of a key.
    #[track_caller]
    pub fn parse(text: &str) -> CoreErrorResult<Self> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| CoreError::InvalidPublicKey {
                value: text.to_string(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CoreError::InvalidPublicKey {
                value: text.to_string(),
                message: format!(
                    "wrong length: expected {} bytes, got {}",
                    PUBLIC_KEY_LENGTH,
                    bytes.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(&self.0))
    }
}

impl FromStr for PublicKey {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(&text)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
