mod edge_cases;

use std::env;

use tempfile::TempDir;

/// Restores an environment variable on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Temp config directory with IDM_CONFIG_DIR pointing at it and an admin
/// password set, so the defaults validate.
pub(crate) struct TestConfigDir {
    pub(crate) dir: TempDir,
    _config_dir: EnvGuard,
    _password: EnvGuard,
}

pub(crate) fn setup_config_dir() -> TestConfigDir {
    let dir = TempDir::new().unwrap();
    let config_dir = EnvGuard::set("IDM_CONFIG_DIR", dir.path().to_str().unwrap());
    let password = EnvGuard::set("IDM_AUTH_ADMIN_PASSWORD", "open sesame");
    TestConfigDir {
        dir,
        _config_dir: config_dir,
        _password: password,
    }
}

pub(crate) fn write_config(setup: &TestConfigDir, contents: &str) {
    std::fs::write(setup.dir.path().join(crate::CONFIG_FILENAME), contents).unwrap();
}
