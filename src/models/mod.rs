//! Data models for the filemap engine.
//!
//! - [`ModEntry`] / [`Modlist`]: the ordered mod list, front = highest priority
//! - [`StagingLayout`]: where staging trees live and where the index is written
//! - [`PathRules`]: prefix stripping, extension filtering and destination routing
//! - [`ConflictStatus`] / [`ConflictReport`]: per-mod conflict classification and override graph
//! - [`DeploymentConfig`] / [`ProfileSettings`]: YAML-backed configuration
//!
//! The synthetic names [`OVERWRITE_NAME`] and [`ROOT_FOLDER_NAME`] are part of the
//! index file format; consumers match on them verbatim.

pub mod config;
pub mod conflict;
pub mod layout;
pub mod mod_entry;
pub mod path_rules;

pub use config::{DeploymentConfig, ProfileSettings};
pub use conflict::{ConflictReport, ConflictStatus};
pub use layout::{FILEMAP_FILE_NAME, ROOT_FILEMAP_FILE_NAME, StagingLayout};
pub use mod_entry::{
    is_separator_name, ModEntry, Modlist, OVERWRITE_NAME, ROOT_FOLDER_NAME, SEPARATOR_SUFFIX,
};
pub use path_rules::{Destination, MAX_STRIP_DEPTH, PathRules};
