// modmap - mod file overlay and conflict resolution engine
//
// This is the library crate containing the filemap engine, the rebuild scheduler
// and the profile configuration layer. The binary crate (main.rs) is a thin CLI.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::RebuildMetrics;
pub use models::{ConflictReport, ConflictStatus, ModEntry, PathRules, StagingLayout};
pub use scheduler::{RebuildJob, RebuildScheduler, RebuildState, RequestOutcome};
pub use services::{FilemapBuilder, FilemapError, FilemapIndex, FilemapSnapshot};
pub use state::{FilemapEvent, FilemapState};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
