use crate::{
    AuthConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, DatabaseConfig, DirectoryConfig, LoggingConfig, PoolConfig, ServerConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pool: PoolConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// Loading order:
    /// 1. IDM_CONFIG_DIR env var, else ./.idm/
    /// 2. Create the config directory if missing
    /// 3. Read config.toml if it exists, else use defaults
    /// 4. Apply IDM_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Priority: IDM_CONFIG_DIR env var > ./.idm/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.pool.validate()?;
        self.auth.validate()?;
        self.directory.validate()?;
        Ok(())
    }

    pub fn database_path(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.database.path))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary. Never logs secrets.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} (location {})",
            self.server.host, self.server.port, self.server.location
        );
        info!("  database: {}", self.database.path);
        info!(
            "  pool: max_sessions={}, request_timeout={}ms",
            self.pool.max_sessions, self.pool.request_timeout_ms
        );
        info!(
            "  auth: admin={}, root_key={}",
            self.auth.admin_username,
            if self.auth.root_key.is_some() {
                "configured"
            } else {
                "random"
            }
        );
        info!(
            "  directory: {}",
            self.directory.launchpad_url.as_deref().unwrap_or("none")
        );
        info!(
            "  logging: {} (colored: {}, file: {})",
            *self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("stdout")
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("IDM_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("IDM_SERVER_PORT", &mut self.server.port);
        Self::apply_env_string("IDM_SERVER_LOCATION", &mut self.server.location);
        Self::apply_env_parse(
            "IDM_SERVER_COLLECTION_REPORT_SECS",
            &mut self.server.collection_report_secs,
        );

        // Database
        Self::apply_env_string("IDM_DATABASE_PATH", &mut self.database.path);

        // Pool
        Self::apply_env_parse("IDM_POOL_MAX_SESSIONS", &mut self.pool.max_sessions);
        Self::apply_env_parse(
            "IDM_POOL_REQUEST_TIMEOUT_MS",
            &mut self.pool.request_timeout_ms,
        );

        // Auth
        Self::apply_env_string("IDM_AUTH_ADMIN_USERNAME", &mut self.auth.admin_username);
        Self::apply_env_string("IDM_AUTH_ADMIN_PASSWORD", &mut self.auth.admin_password);
        Self::apply_env_option_string("IDM_AUTH_ROOT_KEY", &mut self.auth.root_key);

        // Directory
        Self::apply_env_option_string(
            "IDM_DIRECTORY_LAUNCHPAD_URL",
            &mut self.directory.launchpad_url,
        );

        // Logging
        Self::apply_env_parse("IDM_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("IDM_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("IDM_LOG_FILE", &mut self.logging.file);
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Accepts "true"/"1"
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
