use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;
use url::Url;

/// External team directory. Without a URL, no external groups are merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub launchpad_url: Option<String>,
}

impl DirectoryConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if let Some(url) = &self.launchpad_url {
            Url::parse(url).map_err(|e| {
                ConfigError::directory(format!(
                    "directory.launchpad_url {:?} is not a valid URL: {}",
                    url, e
                ))
            })?;
        }
        Ok(())
    }
}
