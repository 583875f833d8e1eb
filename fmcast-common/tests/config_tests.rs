//! Tests for config file loading and lookup
//!
//! Tests that manipulate XDG_CONFIG_HOME are marked with #[serial]
//! so they don't race each other.

use fmcast_common::config::{load_toml_config, locate_config_file, TomlConfig};
use fmcast_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_explicit_config_file_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "sample_rate = 22050\nconsumer_path = \"/opt/tx\"\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.sample_rate, Some(22050));
    assert_eq!(config.consumer_path, Some(PathBuf::from("/opt/tx")));
    assert_eq!(config.channels, None);
}

#[test]
fn test_explicit_missing_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = load_toml_config(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn test_explicit_malformed_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "sample_rate = [").unwrap();

    assert!(matches!(load_toml_config(Some(&path)), Err(Error::Config(_))));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_user_config_dir_is_searched() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("fmcast");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "channels = 2\n").unwrap();

    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let located = locate_config_file();
    let loaded = load_toml_config(None);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(located, Some(config_dir.join("config.toml")));
    assert_eq!(loaded.unwrap().channels, Some(2));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_no_user_config_falls_back() {
    let dir = tempfile::tempdir().unwrap();

    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let located = locate_config_file();
    let loaded = load_toml_config(None);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    // Either nothing, or a system-wide file outside the temp dir
    if let Some(path) = located {
        assert!(!path.starts_with(dir.path()));
    } else {
        assert_eq!(loaded.unwrap(), TomlConfig::default());
    }
}
