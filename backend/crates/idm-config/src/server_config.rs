use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_COLLECTION_REPORT_SECS, DEFAULT_HOST,
    DEFAULT_LOCATION, DEFAULT_PORT, MIN_PORT,
};

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of the service; macaroons are minted for this location
    pub location: String,
    /// Interval between collection-size reports (0 = disabled)
    pub collection_report_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            location: String::from(DEFAULT_LOCATION),
            collection_report_secs: DEFAULT_COLLECTION_REPORT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        // Port 0 lets the OS pick
        if self.port != 0 && self.port < MIN_PORT {
            return Err(ConfigError::server(format!(
                "server.port must be 0 (auto) or >= {}, got {}",
                MIN_PORT, self.port
            )));
        }

        let location = Url::parse(&self.location).map_err(|e| {
            ConfigError::server(format!(
                "server.location {:?} is not a valid URL: {}",
                self.location, e
            ))
        })?;
        if !matches!(location.scheme(), "http" | "https") {
            return Err(ConfigError::server(format!(
                "server.location must be an http(s) URL, got {:?}",
                self.location
            )));
        }

        Ok(())
    }
}
