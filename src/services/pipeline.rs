//! One full filemap pass: collect → resolve → classify → serialize.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;
use std::time::Instant;

use super::classifier::ConflictClassifier;
use super::collector::PathCollector;
use super::error::FilemapError;
use super::filemap::FilemapIndex;
use super::modlist::ModlistStore;
use super::resolver::WinnerResolver;
use crate::models::{ConflictReport, ConflictStatus, ModEntry, PathRules, StagingLayout};
use crate::scheduler::RebuildJob;

/// Immutable result of one rebuild.
///
/// Published as a whole; readers hold an `Arc` to it and never see a partly
/// updated index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilemapSnapshot {
    /// Files deployed to the data directory.
    pub data: FilemapIndex,
    /// Files deployed to the game root.
    pub root: FilemapIndex,
    pub conflicts: ConflictReport,
    /// Set by the scheduler when published; 0 for the initial empty snapshot.
    pub generation: u64,
}

impl FilemapSnapshot {
    /// Total indexed files across both destinations.
    pub fn count(&self) -> usize {
        self.data.len() + self.root.len()
    }

    /// `(count, conflict_map, overrides, overridden_by)`.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        usize,
        BTreeMap<String, ConflictStatus>,
        BTreeMap<String, BTreeSet<String>>,
        BTreeMap<String, BTreeSet<String>>,
    ) {
        let count = self.count();
        let ConflictReport {
            conflict_map,
            overrides,
            overridden_by,
        } = self.conflicts;
        (count, conflict_map, overrides, overridden_by)
    }
}

/// Run the whole pipeline against the staging trees and write the index files.
///
/// `entries` is the ordered list with synthetic rows already injected. The root
/// index is written next to the data index; a stale one is removed when this
/// pass has no root files.
pub fn build_filemap(
    entries: &[ModEntry],
    layout: &StagingLayout,
    rules: &PathRules,
) -> Result<FilemapSnapshot, FilemapError> {
    let start = Instant::now();

    let sets = PathCollector::new(layout, rules).collect(entries)?;
    let (data, root) = WinnerResolver::resolve_all(&sets);
    let conflicts = ConflictClassifier::classify(&sets, &data, &root);

    write_indexes(&data, &root, layout)?;

    tracing::info!(
        "Filemap built: {} data + {} root file(s) from {} mod(s), {} conflicting, in {:.2}ms",
        data.len(),
        root.len(),
        sets.len(),
        conflicts.conflicting_mods(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(FilemapSnapshot {
        data,
        root,
        conflicts,
        generation: 0,
    })
}

/// Write both index files so that a failure leaves `filemap.txt` as it was.
///
/// Both temp files are written before anything is renamed. The root index is
/// committed first; the data index, the one readers look at, goes last.
fn write_indexes(
    data: &FilemapIndex,
    root: &FilemapIndex,
    layout: &StagingLayout,
) -> Result<(), FilemapError> {
    let data_tmp = data.write_temp(&layout.output_path)?;
    let discard_data_tmp = || {
        let _ = fs::remove_file(&data_tmp);
    };

    let root_path = layout.root_output_path();
    if root.is_empty() {
        if root_path.is_file() {
            if let Err(source) = fs::remove_file(&root_path) {
                discard_data_tmp();
                return Err(FilemapError::OutputWrite {
                    path: root_path,
                    source,
                });
            }
            tracing::debug!("Removed stale root index {}", root_path);
        }
    } else {
        let committed = root
            .write_temp(&root_path)
            .and_then(|root_tmp| FilemapIndex::commit_temp(&root_tmp, &root_path));
        if let Err(e) = committed {
            discard_data_tmp();
            return Err(e);
        }
    }

    FilemapIndex::commit_temp(&data_tmp, &layout.output_path)
}

/// The production rebuild job.
///
/// Reads the mod list and the current rules at the start of every execution so a
/// follow-up run always sees edits made while the previous one was in flight.
pub struct FilemapBuilder {
    store: Arc<dyn ModlistStore>,
    layout: StagingLayout,
    rules: RwLock<PathRules>,
}

impl FilemapBuilder {
    pub fn new(store: Arc<dyn ModlistStore>, layout: StagingLayout, rules: PathRules) -> Self {
        Self {
            store,
            layout,
            rules: RwLock::new(rules),
        }
    }

    pub fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    pub fn rules(&self) -> PathRules {
        self.rules.read().clone()
    }

    /// Replace the rules used by the next execution.
    pub fn set_rules(&self, rules: PathRules) {
        *self.rules.write() = rules;
    }
}

impl RebuildJob for FilemapBuilder {
    fn run(&self) -> Result<FilemapSnapshot, FilemapError> {
        let entries = self.store.load().map_err(FilemapError::Modlist)?;
        let rules = self.rules();
        build_filemap(&entries, &self.layout, &rules)
    }
}
