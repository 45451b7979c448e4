use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Coarse per-mod summary of how its files interact with other mods' files.
///
/// Drives the row icons in the mod list. The integer codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictStatus {
    /// No shared paths with any other enabled mod.
    #[default]
    None,
    /// Beats every mod it shares a path with.
    Wins,
    /// Loses every shared path, but still provides some unshared files.
    Loses,
    /// Wins some shared paths and loses others.
    Partial,
    /// Every file it ships is provided by some other mod instead.
    Full,
}

impl ConflictStatus {
    pub fn code(self) -> u8 {
        match self {
            ConflictStatus::None => 0,
            ConflictStatus::Wins => 1,
            ConflictStatus::Loses => 2,
            ConflictStatus::Partial => 3,
            ConflictStatus::Full => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConflictStatus::None => "none",
            ConflictStatus::Wins => "wins",
            ConflictStatus::Loses => "loses",
            ConflictStatus::Partial => "partial",
            ConflictStatus::Full => "full",
        }
    }
}

impl fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Conflict graph and classification for one rebuild.
///
/// The maps are sparse: mods without conflicts have no entry, and the query
/// methods fall back to [`ConflictStatus::None`] / an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub conflict_map: BTreeMap<String, ConflictStatus>,
    pub overrides: BTreeMap<String, BTreeSet<String>>,
    pub overridden_by: BTreeMap<String, BTreeSet<String>>,
}

impl ConflictReport {
    pub fn status(&self, mod_name: &str) -> ConflictStatus {
        self.conflict_map
            .get(mod_name)
            .copied()
            .unwrap_or_default()
    }

    /// Mods that `mod_name` beats on at least one shared path.
    pub fn overrides_of(&self, mod_name: &str) -> impl Iterator<Item = &str> {
        self.overrides
            .get(mod_name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Mods that beat `mod_name` on at least one shared path.
    pub fn overridden_by_of(&self, mod_name: &str) -> impl Iterator<Item = &str> {
        self.overridden_by
            .get(mod_name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Number of mods with a non-`None` classification.
    pub fn conflicting_mods(&self) -> usize {
        self.conflict_map.len()
    }
}
