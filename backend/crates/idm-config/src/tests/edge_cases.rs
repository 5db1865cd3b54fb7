use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir, write_config};

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err};
use log::LevelFilter;
use serial_test::serial;

#[test]
#[serial]
fn given_malformed_toml_when_load_then_error_mentions_file() {
    // Given
    let setup = setup_config_dir();
    write_config(&setup, "this is not valid toml {{{{");

    // When
    let result = Config::load();

    // Then
    assert_that!(result, err(anything()));
    assert_that!(
        result.unwrap_err().to_string(),
        contains_substring("config.toml")
    );
}

#[test]
#[serial]
fn given_database_path_with_traversal_when_validate_then_error() {
    // Given
    let _setup = setup_config_dir();
    let _path = EnvGuard::set("IDM_DATABASE_PATH", "../../../etc/passwd");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
    assert_that!(result.unwrap_err().to_string(), contains_substring(".."));
}

#[test]
#[serial]
fn given_invalid_directory_url_when_validate_then_error() {
    // Given
    let _setup = setup_config_dir();
    let _url = EnvGuard::set("IDM_DIRECTORY_LAUNCHPAD_URL", "not a url");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_unknown_log_level_when_load_then_info() {
    // Given
    let _setup = setup_config_dir();
    let _level = EnvGuard::set("IDM_LOG_LEVEL", "chatty");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(*config.logging.level, eq(LevelFilter::Info));
}
