use crate::{ConfigError, ConfigErrorResult, DEFAULT_ADMIN_USERNAME, ROOT_KEY_LENGTH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    /// Base64 bakery root key. Without one a random key is generated at
    /// startup and issued macaroons die with the process.
    pub root_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: String::from(DEFAULT_ADMIN_USERNAME),
            admin_password: String::new(),
            root_key: None,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.admin_username.is_empty() {
            return Err(ConfigError::auth("auth.admin_username must not be empty"));
        }
        if self.admin_username.contains(':') {
            return Err(ConfigError::auth("auth.admin_username must not contain ':'"));
        }
        if self.admin_password.is_empty() {
            return Err(ConfigError::auth(
                "auth.admin_password must be set (IDM_AUTH_ADMIN_PASSWORD)",
            ));
        }
        self.root_key_bytes()?;
        Ok(())
    }

    /// Decoded bakery root key, if one is configured.
    pub fn root_key_bytes(&self) -> ConfigErrorResult<Option<[u8; ROOT_KEY_LENGTH]>> {
        let Some(encoded) = &self.root_key else {
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::auth(format!("auth.root_key is not valid base64: {}", e)))?;
        let key: [u8; ROOT_KEY_LENGTH] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ConfigError::auth(format!(
                "auth.root_key must decode to {} bytes, got {}",
                ROOT_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Some(key))
    }
}
