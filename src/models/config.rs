use serde::{Deserialize, Serialize};

/// Game-specific deployment rules from `deployment.yaml`.
///
/// These come from the game handler and apply to every mod in every profile
/// of that game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Leading wrapper folders stripped from every mod while they match.
    #[serde(rename = "Strip Prefixes", default)]
    pub strip_prefixes: Vec<String>,

    /// When non-empty, only files with these extensions are deployed.
    #[serde(rename = "Allowed Extensions", default)]
    pub allowed_extensions: Vec<String>,

    /// Top-level folders deployed to the game root instead of the data dir.
    #[serde(rename = "Root Deploy Folders", default)]
    pub root_deploy_folders: Vec<String>,
}

/// Per-profile settings from `profile.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(rename = "Root Folder Enabled", default = "default_root_folder_enabled")]
    pub root_folder_enabled: bool,

    #[serde(rename = "Debug Logging", default)]
    pub debug_logging: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            root_folder_enabled: true,
            debug_logging: false,
        }
    }
}

fn default_root_folder_enabled() -> bool {
    true
}
