use std::collections::HashMap;

use super::collector::ModFileSet;
use super::filemap::FilemapIndex;
use crate::models::{ConflictReport, ConflictStatus, Destination};

/// Builds the override graph and per-mod classification from a resolved pass.
pub struct ConflictClassifier;

impl ConflictClassifier {
    /// Classify every contributing mod.
    ///
    /// For each path claimed by two or more mods the winner overrides every other
    /// claimant. A mod whose files are all provided by other mods is
    /// [`ConflictStatus::Full`]; that check runs before `Loses`.
    pub fn classify(
        sets: &[ModFileSet],
        data: &FilemapIndex,
        root: &FilemapIndex,
    ) -> ConflictReport {
        let mut report = ConflictReport::default();

        for (destination, index) in [(Destination::Data, data), (Destination::Root, root)] {
            let mut claimants: HashMap<&str, Vec<&str>> = HashMap::new();
            for set in sets {
                for key in set.files(destination).keys() {
                    claimants
                        .entry(key.as_str())
                        .or_default()
                        .push(set.mod_name.as_str());
                }
            }

            for (key, mods) in claimants {
                if mods.len() < 2 {
                    continue;
                }
                let winner = index
                    .get_by_key(key)
                    .map(|e| e.mod_name.as_str())
                    .unwrap_or(mods[0]);
                for loser in mods.into_iter().filter(|m| *m != winner) {
                    report
                        .overrides
                        .entry(winner.to_string())
                        .or_default()
                        .insert(loser.to_string());
                    report
                        .overridden_by
                        .entry(loser.to_string())
                        .or_default()
                        .insert(winner.to_string());
                }
            }
        }

        for set in sets {
            let status = Self::status_for(set, &report, data, root);
            if status != ConflictStatus::None {
                report.conflict_map.insert(set.mod_name.clone(), status);
            }
        }

        tracing::debug!(
            "Classified {} mods, {} with conflicts",
            sets.len(),
            report.conflicting_mods()
        );

        report
    }

    fn status_for(
        set: &ModFileSet,
        report: &ConflictReport,
        data: &FilemapIndex,
        root: &FilemapIndex,
    ) -> ConflictStatus {
        let wins = report.overrides_of(&set.mod_name).next().is_some();
        let loses = report.overridden_by_of(&set.mod_name).next().is_some();

        match (wins, loses) {
            (false, false) => ConflictStatus::None,
            (_, true) if !Self::provides_any(set, data, root) => ConflictStatus::Full,
            (true, false) => ConflictStatus::Wins,
            (false, true) => ConflictStatus::Loses,
            (true, true) => ConflictStatus::Partial,
        }
    }

    /// Whether at least one of the mod's files made it into the index.
    fn provides_any(set: &ModFileSet, data: &FilemapIndex, root: &FilemapIndex) -> bool {
        [(Destination::Data, data), (Destination::Root, root)]
            .into_iter()
            .any(|(destination, index)| {
                set.files(destination).keys().any(|key| {
                    index
                        .get_by_key(key)
                        .is_some_and(|e| e.mod_name == set.mod_name)
                })
            })
    }
}
