use crate::models::{DeploymentConfig, PathRules, ProfileSettings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::fs;

/// Game-wide deployment rules.
pub const DEPLOYMENT_CONFIG_FILE: &str = "deployment.yaml";

/// Per-profile toggles.
pub const PROFILE_SETTINGS_FILE: &str = "profile.yaml";

/// Per-mod deployment paths, keyed by mod name.
pub const MOD_STRIP_PREFIXES_FILE: &str = "mod_strip_prefixes.json";

/// Configuration manager for one profile directory.
///
/// Manages three files:
/// - `deployment.yaml`: Strip prefixes, allowed extensions, root deploy folders
/// - `profile.yaml`: Root_Folder toggle, debug logging
/// - `mod_strip_prefixes.json`: Per-mod deployment paths
#[derive(Debug, Clone)]
pub struct ConfigManager {
    profile_dir: Utf8PathBuf,
    deployment_path: Utf8PathBuf,
    profile_path: Utf8PathBuf,
    strip_prefixes_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for `profile_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(profile_dir: P) -> Result<Self> {
        let profile_dir = profile_dir.as_ref().to_path_buf();

        if !profile_dir.exists() {
            fs::create_dir_all(&profile_dir)
                .with_context(|| format!("Failed to create profile directory: {}", profile_dir))?;
        }

        Ok(Self {
            deployment_path: profile_dir.join(DEPLOYMENT_CONFIG_FILE),
            profile_path: profile_dir.join(PROFILE_SETTINGS_FILE),
            strip_prefixes_path: profile_dir.join(MOD_STRIP_PREFIXES_FILE),
            profile_dir,
        })
    }

    fn load_yaml<T: DeserializeOwned + Default>(path: &Utf8Path, what: &str) -> Result<T> {
        if !path.exists() {
            tracing::warn!("{} not found at {}, using defaults", what, path);
            return Ok(T::default());
        }

        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}: {}", what, path))?;

        let config: T = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse {}: {}", what, path))?;

        tracing::info!("Loaded {} from {}", what, path);
        Ok(config)
    }

    /// Load `deployment.yaml`, or defaults if it doesn't exist.
    pub fn load_deployment_config(&self) -> Result<DeploymentConfig> {
        Self::load_yaml(&self.deployment_path, "deployment config")
    }

    pub fn save_deployment_config(&self, config: &DeploymentConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize deployment config to YAML")?;

        fs::write(&self.deployment_path, yaml_string).with_context(|| {
            format!("Failed to write deployment config: {}", self.deployment_path)
        })?;

        tracing::info!("Saved deployment config to {}", self.deployment_path);
        Ok(())
    }

    /// Load `profile.yaml`, or defaults if it doesn't exist.
    pub fn load_profile_settings(&self) -> Result<ProfileSettings> {
        Self::load_yaml(&self.profile_path, "profile settings")
    }

    pub fn save_profile_settings(&self, settings: &ProfileSettings) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(settings)
            .context("Failed to serialize profile settings to YAML")?;

        fs::write(&self.profile_path, yaml_string)
            .with_context(|| format!("Failed to write profile settings: {}", self.profile_path))?;

        tracing::info!("Saved profile settings to {}", self.profile_path);
        Ok(())
    }

    /// Load the per-mod deployment paths.
    ///
    /// This never fails: a missing, unreadable or malformed document gives an
    /// empty map, and a value that isn't a list of strings gives an empty list
    /// for that mod.
    pub fn load_mod_strip_prefixes(&self) -> IndexMap<String, Vec<String>> {
        if !self.strip_prefixes_path.exists() {
            return IndexMap::new();
        }

        let text = match fs::read_to_string(&self.strip_prefixes_path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "Failed to read per-mod strip prefixes {}: {}",
                    self.strip_prefixes_path,
                    e
                );
                return IndexMap::new();
            }
        };

        let raw: IndexMap<String, serde_json::Value> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed per-mod strip prefixes {}: {}",
                    self.strip_prefixes_path,
                    e
                );
                return IndexMap::new();
            }
        };

        raw.into_iter()
            .map(|(mod_name, value)| {
                let paths = match value {
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                    other => {
                        tracing::warn!(
                            "Per-mod strip prefixes for '{}' is not a list ({}), ignoring",
                            mod_name,
                            other
                        );
                        Vec::new()
                    }
                };
                (mod_name, paths)
            })
            .collect()
    }

    pub fn save_mod_strip_prefixes(&self, map: &IndexMap<String, Vec<String>>) -> Result<()> {
        let json = serde_json::to_string_pretty(map)
            .context("Failed to serialize per-mod strip prefixes to JSON")?;

        fs::write(&self.strip_prefixes_path, json).with_context(|| {
            format!(
                "Failed to write per-mod strip prefixes: {}",
                self.strip_prefixes_path
            )
        })?;

        tracing::info!("Saved per-mod strip prefixes to {}", self.strip_prefixes_path);
        Ok(())
    }

    /// Merge the deployment config and per-mod paths into one [`PathRules`].
    pub fn load_path_rules(&self) -> Result<PathRules> {
        let deployment = self.load_deployment_config()?;
        let per_mod = self.load_mod_strip_prefixes();

        Ok(PathRules::new()
            .with_strip_prefixes(&deployment.strip_prefixes)
            .with_allowed_extensions(&deployment.allowed_extensions)
            .with_root_deploy_folders(&deployment.root_deploy_folders)
            .with_per_mod_strip_prefixes(per_mod))
    }

    pub fn profile_dir(&self) -> &Utf8Path {
        &self.profile_dir
    }
}
