//! Staging tree traversal.
//!
//! Walks every enabled mod's staging directory and turns each regular file into a
//! mod-relative path after the [`PathRules`] have been applied. One unreadable
//! folder never aborts the pass: the error is logged and that subtree is skipped.

use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::HashMap;
use walkdir::WalkDir;

use super::error::FilemapError;
use crate::models::{Destination, ModEntry, OVERWRITE_NAME, PathRules, StagingLayout};

/// Per-mod metadata files that are never deployed.
const EXCLUDED_FILE_NAMES: &[&str] = &["meta.ini"];

/// Files one mod contributes, split by destination.
///
/// Keys are lowercase relative paths, values the path as it should be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModFileSet {
    pub mod_name: String,
    data: IndexMap<String, String>,
    root: IndexMap<String, String>,
}

impl ModFileSet {
    pub fn new(mod_name: impl Into<String>) -> Self {
        Self {
            mod_name: mod_name.into(),
            ..Self::default()
        }
    }

    /// Add a file. A case-insensitive duplicate within the same mod keeps the first path.
    pub fn insert(&mut self, rel: String, destination: Destination) {
        let key = rel.to_lowercase();
        self.files_mut(destination).entry(key).or_insert(rel);
    }

    pub fn files(&self, destination: Destination) -> &IndexMap<String, String> {
        match destination {
            Destination::Data => &self.data,
            Destination::Root => &self.root,
        }
    }

    fn files_mut(&mut self, destination: Destination) -> &mut IndexMap<String, String> {
        match destination {
            Destination::Data => &mut self.data,
            Destination::Root => &mut self.root,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() + self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.root.is_empty()
    }
}

/// Walks staging trees and applies the path rules.
pub struct PathCollector<'a> {
    layout: &'a StagingLayout,
    rules: &'a PathRules,
}

impl<'a> PathCollector<'a> {
    pub fn new(layout: &'a StagingLayout, rules: &'a PathRules) -> Self {
        Self { layout, rules }
    }

    /// Entries that contribute files, in priority order.
    ///
    /// `[Overwrite]` is moved to the front wherever it appears and is always
    /// treated as enabled. Separators, disabled mods and `[Root_Folder]` are
    /// skipped, as are repeated names.
    pub fn priority_order(entries: &[ModEntry]) -> Vec<&ModEntry> {
        let mut order: Vec<&ModEntry> = Vec::with_capacity(entries.len());
        if let Some(overwrite) = entries.iter().find(|e| e.is_overwrite()) {
            order.push(overwrite);
        }
        for entry in entries {
            if entry.is_synthetic() || entry.is_separator || !entry.enabled {
                continue;
            }
            if order.iter().any(|e| e.name == entry.name) {
                tracing::warn!("Mod '{}' listed more than once, using first position", entry.name);
                continue;
            }
            order.push(entry);
        }
        order
    }

    /// Collect every contributing mod's files, highest priority first.
    ///
    /// Fails only when the staging root itself is missing.
    pub fn collect(&self, entries: &[ModEntry]) -> Result<Vec<ModFileSet>, FilemapError> {
        if !self.layout.staging_root.is_dir() {
            return Err(FilemapError::StagingRootMissing(
                self.layout.staging_root.clone(),
            ));
        }

        let mut sets: Vec<ModFileSet> = Self::priority_order(entries)
            .into_iter()
            .map(|entry| {
                let dir = self.layout.source_dir(&entry.name);
                self.collect_mod(&entry.name, &dir)
            })
            .collect();

        normalize_folder_case(&mut sets, Destination::Data);
        normalize_folder_case(&mut sets, Destination::Root);

        tracing::debug!(
            "Collected {} files from {} mods",
            sets.iter().map(ModFileSet::len).sum::<usize>(),
            sets.len()
        );

        Ok(sets)
    }

    /// Walk one mod folder. A missing folder yields an empty set.
    pub fn collect_mod(&self, mod_name: &str, dir: &Utf8Path) -> ModFileSet {
        let mut set = ModFileSet::new(mod_name);

        if has_record_separator(mod_name) {
            tracing::warn!(
                "Skipping mod with a tab or line break in its name: {:?}",
                mod_name
            );
            return set;
        }

        if !dir.is_dir() {
            if mod_name != OVERWRITE_NAME {
                tracing::debug!("Staging folder for '{}' not found: {}", mod_name, dir);
            }
            return set;
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable path in '{}': {}", mod_name, err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            if EXCLUDED_FILE_NAMES.iter().any(|n| file_name == *n) {
                continue;
            }

            let rel = match relative_key(dir, entry.path()) {
                Ok(rel) => rel,
                Err(err) => {
                    tracing::warn!("Skipping file in '{}': {}", mod_name, err);
                    continue;
                }
            };

            if has_record_separator(&rel) {
                tracing::warn!(
                    "Skipping file in '{}' with a tab or line break in its path: {:?}",
                    mod_name,
                    rel
                );
                continue;
            }

            if let Some((rel, destination)) = self.rules.apply(mod_name, &rel) {
                set.insert(rel, destination);
            }
        }

        set
    }
}

/// Tabs and line breaks would split an index record.
fn has_record_separator(s: &str) -> bool {
    s.contains(['\t', '\n', '\r'])
}

/// Path of `path` relative to `base`, with `/` separators.
fn relative_key(base: &Utf8Path, path: &std::path::Path) -> Result<String, FilemapError> {
    let rel = path
        .strip_prefix(base.as_std_path())
        .map_err(|_| FilemapError::NonUtf8Path(path.to_path_buf()))?;

    let mut parts: Vec<&str> = Vec::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| FilemapError::NonUtf8Path(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn uppercase_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_uppercase()).count()
}

/// Rewrite folder segments that differ only in case to one canonical casing.
///
/// The variant with the most uppercase characters wins; ties keep the first
/// variant seen in priority order. File names are left untouched.
pub fn normalize_folder_case(sets: &mut [ModFileSet], destination: Destination) {
    let mut canonical: HashMap<String, String> = HashMap::new();

    for set in sets.iter() {
        for rel in set.files(destination).values() {
            let Some((folders, _)) = rel.rsplit_once('/') else {
                continue;
            };
            for seg in folders.split('/') {
                canonical
                    .entry(seg.to_lowercase())
                    .and_modify(|current| {
                        if uppercase_count(seg) > uppercase_count(current) {
                            *current = seg.to_string();
                        }
                    })
                    .or_insert_with(|| seg.to_string());
            }
        }
    }

    if canonical.is_empty() {
        return;
    }

    for set in sets.iter_mut() {
        for rel in set.files_mut(destination).values_mut() {
            let Some((folders, file_name)) = rel.rsplit_once('/') else {
                continue;
            };
            let rewritten: Vec<&str> = folders
                .split('/')
                .map(|seg| {
                    canonical
                        .get(&seg.to_lowercase())
                        .map(String::as_str)
                        .unwrap_or(seg)
                })
                .collect();
            let new_rel = format!("{}/{}", rewritten.join("/"), file_name);
            if new_rel != *rel {
                *rel = new_rel;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StagingLayout) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let layout = StagingLayout::for_game_dir(&root);
        fs::create_dir_all(&layout.staging_root).unwrap();
        (temp_dir, layout)
    }

    fn touch(path: &Utf8Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_priority_order_moves_overwrite_first() {
        let entries = vec![
            ModEntry::separator("Core_separator"),
            ModEntry::new("A", true),
            ModEntry::overwrite(),
            ModEntry::new("B", false),
            ModEntry::new("C", true),
            ModEntry::root_folder(true),
        ];
        let names: Vec<&str> = PathCollector::priority_order(&entries)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec![OVERWRITE_NAME, "A", "C"]);
    }

    #[test]
    fn test_collect_mod_skips_metadata_and_normalizes_separators() {
        let (_temp_dir, layout) = setup();
        let mod_dir = layout.staging_root.join("A");
        touch(&mod_dir.join("meta.ini"));
        touch(&mod_dir.join("Textures/sky/clouds.dds"));
        touch(&mod_dir.join("A.esp"));

        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);
        let set = collector.collect_mod("A", &mod_dir);

        let files: Vec<&String> = set.files(Destination::Data).values().collect();
        assert_eq!(files, vec!["A.esp", "Textures/sky/clouds.dds"]);
        assert!(set.files(Destination::Root).is_empty());
    }

    #[test]
    fn test_collect_mod_missing_folder_is_empty() {
        let (_temp_dir, layout) = setup();
        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);
        let set = collector.collect_mod("Ghost", &layout.staging_root.join("Ghost"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_collect_requires_staging_root() {
        let (_temp_dir, layout) = setup();
        fs::remove_dir_all(&layout.staging_root).unwrap();
        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);

        let result = collector.collect(&[ModEntry::new("A", true)]);
        assert!(matches!(result, Err(FilemapError::StagingRootMissing(_))));
    }

    #[test]
    fn test_collect_reads_overwrite_from_overwrite_dir() {
        let (_temp_dir, layout) = setup();
        touch(&layout.overwrite_dir.join("SKSE/Plugins/log.txt"));
        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);

        let sets = collector.collect(&[ModEntry::overwrite()]).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].files(Destination::Data).contains_key("skse/plugins/log.txt"));
    }

    #[test]
    fn test_within_mod_case_duplicate_keeps_first() {
        let mut set = ModFileSet::new("A");
        set.insert("Foo/Bar.esp".to_string(), Destination::Data);
        set.insert("foo/bar.esp".to_string(), Destination::Data);
        assert_eq!(set.len(), 1);
        assert_eq!(set.files(Destination::Data)["foo/bar.esp"], "Foo/Bar.esp");
    }

    #[test]
    fn test_normalize_folder_case_prefers_more_uppercase() {
        let mut a = ModFileSet::new("A");
        a.insert("scripts/a.pex".to_string(), Destination::Data);
        let mut b = ModFileSet::new("B");
        b.insert("Scripts/Source/b.psc".to_string(), Destination::Data);
        b.insert("top.esp".to_string(), Destination::Data);

        let mut sets = vec![a, b];
        normalize_folder_case(&mut sets, Destination::Data);

        assert_eq!(sets[0].files(Destination::Data)["scripts/a.pex"], "Scripts/a.pex");
        assert_eq!(
            sets[1].files(Destination::Data)["scripts/source/b.psc"],
            "Scripts/Source/b.psc"
        );
        assert_eq!(sets[1].files(Destination::Data)["top.esp"], "top.esp");
    }

    #[test]
    fn test_normalize_folder_case_tie_keeps_first_seen() {
        let mut a = ModFileSet::new("A");
        a.insert("Meshes/a.nif".to_string(), Destination::Data);
        let mut b = ModFileSet::new("B");
        b.insert("mesheS/b.nif".to_string(), Destination::Data);

        let mut sets = vec![a, b];
        normalize_folder_case(&mut sets, Destination::Data);
        assert_eq!(sets[1].files(Destination::Data)["meshes/b.nif"], "Meshes/b.nif");
    }

    #[test]
    fn test_names_with_tabs_or_line_breaks_are_skipped() {
        let (_temp_dir, layout) = setup();
        let mod_dir = layout.staging_root.join("A");
        touch(&mod_dir.join("weird\tname.esp"));
        touch(&mod_dir.join("line\nbreak.esp"));
        touch(&mod_dir.join("ok.esp"));

        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);
        let set = collector.collect_mod("A", &mod_dir);
        assert_eq!(set.len(), 1);
        assert!(set.files(Destination::Data).contains_key("ok.esp"));

        let tabbed_dir = layout.staging_root.join("Tab\tMod");
        touch(&tabbed_dir.join("x.esp"));
        assert!(collector.collect_mod("Tab\tMod", &tabbed_dir).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subfolder_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp_dir, layout) = setup();
        let mod_dir = layout.staging_root.join("A");
        touch(&mod_dir.join("kept.esp"));
        touch(&mod_dir.join("locked/hidden.esp"));
        touch(&mod_dir.join("textures/sky.dds"));

        let locked = mod_dir.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores permission bits, so there is nothing to observe
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);
        let result = collector.collect(&[ModEntry::new("A", true)]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let sets = result.unwrap();
        let files = sets[0].files(Destination::Data);
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("kept.esp"));
        assert!(files.contains_key("textures/sky.dds"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_collected() {
        let (_temp_dir, layout) = setup();
        let mod_dir = layout.staging_root.join("A");
        touch(&mod_dir.join("real.esp"));
        std::os::unix::fs::symlink(mod_dir.join("real.esp"), mod_dir.join("link.esp")).unwrap();

        let rules = PathRules::new();
        let collector = PathCollector::new(&layout, &rules);
        let set = collector.collect_mod("A", &mod_dir);
        assert_eq!(set.len(), 1);
        assert!(set.files(Destination::Data).contains_key("real.esp"));
    }
}
