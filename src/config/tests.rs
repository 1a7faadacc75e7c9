//! Tests for config functionality.

use crate::config::types::{DEFAULT_STORE_DIR_NAME, parse_bool};
use crate::config::{Config, ENV_AUTO_RECLAIM, ENV_STORE_DIR, OwnershipPolicy};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    // SAFETY: env-mutating tests are #[serial].
    unsafe {
        std::env::remove_var(ENV_STORE_DIR);
        std::env::remove_var(ENV_AUTO_RECLAIM);
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.store_dir.ends_with(DEFAULT_STORE_DIR_NAME));
    assert!(!config.auto_reclaim);
    assert_eq!(config.ownership, OwnershipPolicy::Permissive);
    assert!(config.audit_log);
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();

    assert!(!config.auto_reclaim);
    assert!(config.store_dir.ends_with(DEFAULT_STORE_DIR_NAME));
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
store_dir: /var/lock/lab-machines
auto_reclaim: true
ownership: strict
audit_log: false
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.store_dir, PathBuf::from("/var/lock/lab-machines"));
    assert!(config.auto_reclaim);
    assert_eq!(config.ownership, OwnershipPolicy::Strict);
    assert!(!config.audit_log);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
auto_reclaim: true
scheduler: round_robin
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(config.auto_reclaim);
}

#[test]
fn test_invalid_ownership_rejected() {
    let result = Config::from_yaml("ownership: sometimes\n");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("parse config"));
}

#[test]
fn test_empty_store_dir_rejected() {
    let result = Config::from_yaml("store_dir: \"\"\n");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("store_dir"));
}

#[test]
fn test_yaml_roundtrip_keeps_policy() {
    let config = Config {
        ownership: OwnershipPolicy::Strict,
        auto_reclaim: true,
        ..Config::default()
    };
    let parsed = Config::from_yaml(&config.to_yaml().unwrap()).unwrap();

    assert_eq!(parsed.ownership, OwnershipPolicy::Strict);
    assert!(parsed.auto_reclaim);
    assert_eq!(parsed.store_dir, config.store_dir);
}

#[test]
fn test_load_missing_file_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = Config::load(temp_dir.path().join("nope.yaml"));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("failed to read config file"));
}

#[test]
fn test_ownership_from_str() {
    assert_eq!(OwnershipPolicy::from_str("strict"), Some(OwnershipPolicy::Strict));
    assert_eq!(
        OwnershipPolicy::from_str("permissive"),
        Some(OwnershipPolicy::Permissive)
    );
    assert_eq!(OwnershipPolicy::from_str("loose"), None);
}

#[test]
fn test_parse_bool_values() {
    assert_eq!(parse_bool("YES"), Some(true));
    assert_eq!(parse_bool(" 1 "), Some(true));
    assert_eq!(parse_bool("off"), Some(false));
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(&config_path, "store_dir: /from/file\nauto_reclaim: false\n").unwrap();

    // SAFETY: serialized with the other env tests.
    unsafe {
        std::env::set_var(ENV_STORE_DIR, "/from/env");
        std::env::set_var(ENV_AUTO_RECLAIM, "true");
    }

    let config = Config::resolve(Some(&config_path)).unwrap();
    clear_env();

    assert_eq!(config.store_dir, PathBuf::from("/from/env"));
    assert!(config.auto_reclaim);
}

#[test]
#[serial]
fn test_invalid_env_auto_reclaim_rejected() {
    clear_env();
    // SAFETY: serialized with the other env tests.
    unsafe {
        std::env::set_var(ENV_AUTO_RECLAIM, "sometimes");
    }

    let result = Config::resolve(None);
    clear_env();

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains(ENV_AUTO_RECLAIM));
}

#[test]
#[serial]
fn test_resolve_without_file_uses_defaults() {
    clear_env();
    let config = Config::resolve(None).unwrap();

    assert!(!config.auto_reclaim);
    assert!(config.store_dir.ends_with(DEFAULT_STORE_DIR_NAME));
}
