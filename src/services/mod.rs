//! Services module - the filemap engine.
//!
//! Everything here is synchronous and framework-agnostic. The scheduler in
//! [`crate::scheduler`] runs it off the control thread; tests and the CLI call
//! it directly.
//!
//! # Components
//!
//! - [`PathCollector`]: Walks each enabled mod's staging folder and applies the
//!   [`PathRules`](crate::models::PathRules) to produce a [`ModFileSet`] per mod
//! - [`WinnerResolver`]: First-claim-wins resolution in priority order, one
//!   [`FilemapIndex`] per destination
//! - [`ConflictClassifier`]: Override graph and per-mod
//!   [`ConflictStatus`](crate::models::ConflictStatus)
//! - [`FilemapIndex`]: The resolved index and its tab-separated on-disk format
//! - [`build_filemap`] / [`FilemapBuilder`]: One complete pass, producing a
//!   [`FilemapSnapshot`]
//! - [`ModlistStore`] / [`ModlistFile`]: Where the ordered mod list comes from
//!
//! # Usage Example
//!
//! ```ignore
//! use modmap::models::{ModEntry, PathRules, StagingLayout};
//! use modmap::services::build_filemap;
//!
//! let layout = StagingLayout::for_game_dir("/games/skyrim");
//! let entries = vec![ModEntry::overwrite(), ModEntry::new("SkyUI", true)];
//! let snapshot = build_filemap(&entries, &layout, &PathRules::new())?;
//!
//! println!("{} files", snapshot.count());
//! ```

pub mod classifier;
pub mod collector;
pub mod error;
pub mod filemap;
pub mod modlist;
pub mod pipeline;
pub mod resolver;

pub use classifier::ConflictClassifier;
pub use collector::{ModFileSet, PathCollector, normalize_folder_case};
pub use error::FilemapError;
pub use filemap::{FilemapEntry, FilemapIndex};
pub use modlist::{ModlistFile, ModlistStore, parse_modlist, render_modlist};
pub use pipeline::{FilemapBuilder, FilemapSnapshot, build_filemap};
pub use resolver::WinnerResolver;
