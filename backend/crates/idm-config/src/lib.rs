mod auth_config;
mod config;
mod database_config;
mod directory_config;
mod error;
mod log_level;
mod logging_config;
mod pool_config;
mod server_config;

pub use auth_config::AuthConfig;
pub use config::Config;
pub use database_config::DatabaseConfig;
pub use directory_config::DirectoryConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use pool_config::PoolConfig;
pub use server_config::ServerConfig;

const CONFIG_DIR_ENV: &str = "IDM_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".idm";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8081;
const MIN_PORT: u16 = 1024;
const DEFAULT_LOCATION: &str = "http://127.0.0.1:8081";
const DEFAULT_COLLECTION_REPORT_SECS: u64 = 60;

const DEFAULT_DATABASE_FILENAME: &str = "idm.db";

const DEFAULT_MAX_SESSIONS: usize = 100;
const MAX_MAX_SESSIONS: usize = 10_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const ROOT_KEY_LENGTH: usize = 32;

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

#[cfg(test)]
mod tests;
