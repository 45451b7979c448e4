//! Integration tests for ConfigManager and profile configuration files
//!
//! These tests verify:
//! - Loading and saving the YAML and JSON documents
//! - Defaults for missing files
//! - Tolerance of a broken per-mod paths document
//! - Merging everything into PathRules

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use modmap::config::{DEPLOYMENT_CONFIG_FILE, MOD_STRIP_PREFIXES_FILE, PROFILE_SETTINGS_FILE};
use modmap::models::{DeploymentConfig, Destination, ProfileSettings};
use modmap::ConfigManager;
use std::fs;
use tempfile::TempDir;

fn create_test_profile_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let profile_path = Utf8PathBuf::try_from(temp_dir.path().join("profiles/Default")).unwrap();
    (temp_dir, profile_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    assert_eq!(manager.profile_dir(), &profile_path);
    assert!(profile_path.is_dir());
}

#[test]
fn test_save_and_load_deployment_config() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    let config = DeploymentConfig {
        strip_prefixes: vec!["Data".to_string()],
        allowed_extensions: vec![".pak".to_string(), "utoc".to_string()],
        root_deploy_folders: vec!["bin".to_string()],
    };
    manager.save_deployment_config(&config).unwrap();

    let loaded = manager.load_deployment_config().unwrap();
    assert_eq!(loaded, config);

    let raw = fs::read_to_string(profile_path.join(DEPLOYMENT_CONFIG_FILE)).unwrap();
    assert!(raw.contains("Strip Prefixes"));
}

#[test]
fn test_save_and_load_profile_settings() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    let settings = ProfileSettings {
        root_folder_enabled: false,
        debug_logging: true,
    };
    manager.save_profile_settings(&settings).unwrap();

    assert_eq!(manager.load_profile_settings().unwrap(), settings);
}

#[test]
fn test_hand_written_profile_yaml() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    fs::write(
        profile_path.join(PROFILE_SETTINGS_FILE),
        "Root Folder Enabled: false\n",
    )
    .unwrap();

    let settings = manager.load_profile_settings().unwrap();
    assert!(!settings.root_folder_enabled);
    assert!(!settings.debug_logging);
}

#[test]
fn test_mod_strip_prefixes_round_trip_keeps_order() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    let mut map = IndexMap::new();
    map.insert("Zeta".to_string(), vec!["Package".to_string()]);
    map.insert("Alpha".to_string(), vec!["SKSE/Plugins".to_string(), "Docs".to_string()]);
    manager.save_mod_strip_prefixes(&map).unwrap();

    let loaded = manager.load_mod_strip_prefixes();
    assert_eq!(loaded, map);
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["Zeta", "Alpha"]);
}

#[test]
fn test_broken_mod_strip_prefixes_never_fails() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();
    let path = profile_path.join(MOD_STRIP_PREFIXES_FILE);

    fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(manager.load_mod_strip_prefixes().is_empty());

    fs::write(&path, "").unwrap();
    assert!(manager.load_mod_strip_prefixes().is_empty());

    fs::write(&path, r#"{"A": null, "B": {"x": 1}}"#).unwrap();
    let map = manager.load_mod_strip_prefixes();
    assert!(map["A"].is_empty());
    assert!(map["B"].is_empty());
}

#[test]
fn test_load_path_rules_merges_sources() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    fs::write(
        profile_path.join(DEPLOYMENT_CONFIG_FILE),
        r#"
Strip Prefixes:
  - Data
Allowed Extensions:
  - ESP
  - .dll
Root Deploy Folders:
  - Bin
"#,
    )
    .unwrap();
    fs::write(
        profile_path.join(MOD_STRIP_PREFIXES_FILE),
        r#"{"Loader": ["Package", "Package\\SKSE", "a/b/c/d"]}"#,
    )
    .unwrap();

    let rules = manager.load_path_rules().unwrap();

    assert!(rules.strip_prefixes().contains("data"));
    assert!(rules.allowed_extensions().contains(".esp"));
    assert!(rules.allowed_extensions().contains(".dll"));
    assert!(rules.root_deploy_folders().contains("bin"));
    // Too-deep entry dropped, longest first
    assert_eq!(rules.strip_paths_for("Loader"), ["package/skse", "package"]);

    assert_eq!(
        rules.apply("Loader", "Package/SKSE/bin/hook.dll"),
        Some(("bin/hook.dll".to_string(), Destination::Root))
    );
}

#[test]
fn test_missing_everything_gives_empty_rules() {
    let (_temp_dir, profile_path) = create_test_profile_dir();
    let manager = ConfigManager::new(&profile_path).unwrap();

    let rules = manager.load_path_rules().unwrap();
    assert!(rules.strip_prefixes().is_empty());
    assert!(rules.allowed_extensions().is_empty());
    assert_eq!(
        rules.apply("Any", "textures/a.dds"),
        Some(("textures/a.dds".to_string(), Destination::Data))
    );
}
