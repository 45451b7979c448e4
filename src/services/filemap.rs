//! The flat index of winning files and its on-disk format.
//!
//! One record per line: `original/cased/relative/path<TAB>winning mod name`.
//! Rows are written sorted by their lowercase key so that unchanged inputs
//! produce byte-identical files.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

use super::error::FilemapError;

/// One resolved file: where it goes and which mod provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilemapEntry {
    pub relative_path: String,
    pub mod_name: String,
}

/// Case-insensitive map of relative path to winning mod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilemapIndex {
    entries: BTreeMap<String, FilemapEntry>,
}

impl FilemapIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the path is already claimed. Returns true if inserted.
    pub fn insert_if_absent(&mut self, relative_path: &str, mod_name: &str) -> bool {
        let key = relative_path.to_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            FilemapEntry {
                relative_path: relative_path.to_string(),
                mod_name: mod_name.to_string(),
            },
        );
        true
    }

    /// The entry for a path, matched case-insensitively.
    pub fn get(&self, relative_path: &str) -> Option<&FilemapEntry> {
        self.entries.get(&relative_path.replace('\\', "/").to_lowercase())
    }

    /// Look up by an already-lowercased key.
    pub fn get_by_key(&self, key: &str) -> Option<&FilemapEntry> {
        self.entries.get(key)
    }

    /// Name of the mod that provides `relative_path`, if any.
    pub fn winner_of(&self, relative_path: &str) -> Option<&str> {
        self.get(relative_path).map(|e| e.mod_name.as_str())
    }

    /// Paths provided by one mod, in key order.
    pub fn files_of<'a>(&'a self, mod_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .values()
            .filter(move |e| e.mod_name == mod_name)
            .map(|e| e.relative_path.as_str())
    }

    /// Distinct mods that provide at least one file.
    pub fn mods(&self) -> Vec<&str> {
        let mut mods: Vec<&str> = self.entries.values().map(|e| e.mod_name.as_str()).collect();
        mods.sort_unstable();
        mods.dedup();
        mods
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &FilemapEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the index in its on-disk format.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.values() {
            out.push_str(&entry.relative_path);
            out.push('\t');
            out.push_str(&entry.mod_name);
            out.push('\n');
        }
        out
    }

    /// Parse the on-disk format.
    ///
    /// Blank lines, lines without a tab and lines with an empty field are skipped.
    /// If a path appears twice the first row wins.
    pub fn parse(text: &str) -> Self {
        let mut index = Self::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((path, mod_name)) if !path.is_empty() && !mod_name.is_empty() => {
                    index.insert_if_absent(path, mod_name);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed index line(s)", skipped);
        }

        index
    }

    /// Read an index file.
    pub fn read(path: &Utf8Path) -> Result<Self, FilemapError> {
        let text = fs::read_to_string(path).map_err(|source| FilemapError::IndexRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Write the index atomically: a temp file next to `path`, then a rename.
    pub fn write(&self, path: &Utf8Path) -> Result<(), FilemapError> {
        let tmp = self.write_temp(path)?;
        Self::commit_temp(&tmp, path)?;
        tracing::debug!("Wrote {} entries to {}", self.len(), path);
        Ok(())
    }

    /// Write the index to the temp file that [`commit_temp`](Self::commit_temp)
    /// later renames onto `path`. `path` itself is not touched.
    pub fn write_temp(&self, path: &Utf8Path) -> Result<Utf8PathBuf, FilemapError> {
        let write_err = |source: std::io::Error| FilemapError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp = temp_path(path);
        let result = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(self.to_text().as_bytes())?;
            file.sync_all()
        });

        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }
        Ok(tmp)
    }

    /// Move a temp file from [`write_temp`](Self::write_temp) into place.
    pub fn commit_temp(tmp: &Utf8Path, path: &Utf8Path) -> Result<(), FilemapError> {
        fs::rename(tmp, path).map_err(|source| {
            let _ = fs::remove_file(tmp);
            FilemapError::OutputWrite {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// `filemap.txt` → `filemap.tmp`, next to the target.
pub fn temp_path(path: &Utf8Path) -> Utf8PathBuf {
    path.with_extension("tmp")
}
