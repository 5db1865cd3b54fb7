use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_MAX_SESSIONS, DEFAULT_REQUEST_TIMEOUT_MS,
    MAX_MAX_SESSIONS, MAX_REQUEST_TIMEOUT_MS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Database sessions open at once (0 = unbounded)
    pub max_sessions: usize,
    /// How long a request waits for a free session (0 = fail immediately)
    pub request_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl PoolConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_sessions > MAX_MAX_SESSIONS {
            return Err(ConfigError::pool(format!(
                "pool.max_sessions must be at most {}, got {}",
                MAX_MAX_SESSIONS, self.max_sessions
            )));
        }
        if self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::pool(format!(
                "pool.request_timeout_ms must be at most {}, got {}",
                MAX_REQUEST_TIMEOUT_MS, self.request_timeout_ms
            )));
        }
        Ok(())
    }
}
