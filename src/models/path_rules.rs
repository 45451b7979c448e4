use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Deepest per-mod deployment path accepted, in folder segments.
pub const MAX_STRIP_DEPTH: usize = 3;

/// Where a collected file is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    /// The game's mod data directory.
    Data,
    /// The game's install root.
    Root,
}

/// Per-profile path rewriting and filtering rules applied while collecting files.
///
/// All matching is case-insensitive. Sets are stored already normalized
/// (lowercase, `/` separators, extensions with a leading dot) so the
/// collector can compare without re-normalizing per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRules {
    strip_prefixes: BTreeSet<String>,
    per_mod_strip_prefixes: IndexMap<String, Vec<String>>,
    allowed_extensions: BTreeSet<String>,
    root_deploy_folders: BTreeSet<String>,
}

impl PathRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leading folder names stripped from every mod's paths, repeatedly while they match.
    pub fn with_strip_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.strip_prefixes = prefixes
            .into_iter()
            .map(|p| normalize_rel(p.as_ref()).to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Per-mod folder paths to strip, keyed by mod name.
    ///
    /// Entries deeper than [`MAX_STRIP_DEPTH`] segments are dropped with a warning.
    /// Each mod's list is sorted longest first so the first match is the deepest.
    pub fn with_per_mod_strip_prefixes(mut self, map: IndexMap<String, Vec<String>>) -> Self {
        let mut normalized = IndexMap::with_capacity(map.len());
        for (mod_name, paths) in map {
            let mut kept: Vec<String> = Vec::with_capacity(paths.len());
            for path in paths {
                let rel = normalize_rel(&path);
                if rel.is_empty() {
                    continue;
                }
                if rel.split('/').count() > MAX_STRIP_DEPTH {
                    tracing::warn!(
                        "Ignoring deployment path '{}' for '{}': deeper than {} levels",
                        path,
                        mod_name,
                        MAX_STRIP_DEPTH
                    );
                    continue;
                }
                let lower = rel.to_lowercase();
                if !kept.contains(&lower) {
                    kept.push(lower);
                }
            }
            kept.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            normalized.insert(mod_name, kept);
        }
        self.per_mod_strip_prefixes = normalized;
        self
    }

    /// Only files with one of these extensions are collected. Empty means no filter.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Top-level folders whose files deploy to the game root.
    pub fn with_root_deploy_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.root_deploy_folders = folders
            .into_iter()
            .map(|f| normalize_rel(f.as_ref()).to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    pub fn strip_prefixes(&self) -> &BTreeSet<String> {
        &self.strip_prefixes
    }

    pub fn per_mod_strip_prefixes(&self) -> &IndexMap<String, Vec<String>> {
        &self.per_mod_strip_prefixes
    }

    pub fn allowed_extensions(&self) -> &BTreeSet<String> {
        &self.allowed_extensions
    }

    pub fn root_deploy_folders(&self) -> &BTreeSet<String> {
        &self.root_deploy_folders
    }

    /// Strip paths configured for one mod, longest first.
    pub fn strip_paths_for(&self, mod_name: &str) -> &[String] {
        self.per_mod_strip_prefixes
            .get(mod_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Apply the rules to one mod-relative path.
    ///
    /// Steps run in a fixed order: global prefix strip, per-mod path strip,
    /// extension filter, destination tagging. Returns `None` when the file is
    /// filtered out.
    pub fn apply(&self, mod_name: &str, rel: &str) -> Option<(String, Destination)> {
        let mut rel = rel;

        // (a) global prefixes: repeatedly, never the file name itself
        while let Some((first, rest)) = rel.split_once('/') {
            if !self.strip_prefixes.contains(&first.to_lowercase()) {
                break;
            }
            rel = rest;
        }

        // (b) per-mod folder, deepest match wins
        let strip_paths = self.strip_paths_for(mod_name);
        if !strip_paths.is_empty() {
            let lower = rel.to_lowercase();
            for prefix in strip_paths {
                if lower.len() > prefix.len()
                    && lower.starts_with(prefix.as_str())
                    && lower.as_bytes()[prefix.len()] == b'/'
                {
                    rel = strip_leading_segments(rel, prefix.split('/').count());
                    break;
                }
            }
        }

        if rel.is_empty() {
            return None;
        }

        // (c) extension filter
        if !self.allowed_extensions.is_empty() {
            let file_name = rel.rsplit('/').next().unwrap_or(rel);
            let ext = file_name
                .rfind('.')
                .filter(|&i| i > 0)
                .map(|i| file_name[i..].to_lowercase());
            match ext {
                Some(ext) if self.allowed_extensions.contains(&ext) => {}
                _ => return None,
            }
        }

        // (d) destination
        let destination = match rel.split_once('/') {
            Some((top, _)) if self.root_deploy_folders.contains(&top.to_lowercase()) => {
                Destination::Root
            }
            _ => Destination::Data,
        };

        Some((rel.to_string(), destination))
    }
}

/// Drop the first `count` `/`-separated segments of `rel`.
fn strip_leading_segments(rel: &str, count: usize) -> &str {
    let mut rest = rel;
    for _ in 0..count {
        match rest.split_once('/') {
            Some((_, tail)) => rest = tail,
            None => return "",
        }
    }
    rest
}

/// Normalize a configured relative path: `/` separators, no leading or trailing slash,
/// no empty segments.
pub fn normalize_rel(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize an extension to lowercase with a leading dot. `"PAK"` → `".pak"`.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!(".{}", trimmed.to_lowercase()))
    }
}
