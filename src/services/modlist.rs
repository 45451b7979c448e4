//! Mod list sources.
//!
//! The engine only needs an ordered, read-only view of the list; [`ModlistStore`]
//! is that seam. [`ModlistFile`] is the MO2-compatible `modlist.txt` backend:
//!
//! ```text
//! +ModName          enabled mod
//! -ModName          disabled mod
//! *ModName          enabled and locked
//! -Name_separator   separator (MO2 sometimes writes these with +)
//! ```
//!
//! Line 0 is the highest priority. Synthetic rows are injected on load and never
//! written back.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::models::{is_separator_name, ModEntry, Modlist};

/// Supplies the ordered mod list for one profile, synthetic rows included.
#[cfg_attr(test, mockall::automock)]
pub trait ModlistStore: Send + Sync {
    fn load(&self) -> Result<Vec<ModEntry>>;
}

/// Parse `modlist.txt` content. Blank and unknown lines are skipped.
pub fn parse_modlist(text: &str) -> Vec<ModEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        let mut chars = line.chars();
        let Some(prefix) = chars.next() else {
            continue;
        };
        let name = chars.as_str();
        if name.is_empty() {
            continue;
        }
        let separator = is_separator_name(name);
        match prefix {
            '+' | '-' if separator => entries.push(ModEntry::separator(name)),
            '+' => entries.push(ModEntry::new(name, true)),
            '-' => entries.push(ModEntry::new(name, false)),
            '*' => entries.push(ModEntry {
                name: name.to_string(),
                enabled: true,
                locked: true,
                is_separator: false,
            }),
            _ => {}
        }
    }
    entries
}

/// Render entries in `modlist.txt` form. Synthetic rows are left out.
pub fn render_modlist(entries: &[ModEntry]) -> String {
    let mut out = String::new();
    for entry in entries.iter().filter(|e| !e.is_synthetic()) {
        let prefix = if entry.is_separator || !entry.enabled {
            '-'
        } else if entry.locked {
            '*'
        } else {
            '+'
        };
        out.push(prefix);
        out.push_str(&entry.name);
        out.push('\n');
    }
    out
}

/// `modlist.txt` on disk.
#[derive(Debug, Clone)]
pub struct ModlistFile {
    path: Utf8PathBuf,
    root_folder: Option<bool>,
}

impl ModlistFile {
    /// `root_folder` controls the synthetic `[Root_Folder]` row: `None` omits it,
    /// `Some(enabled)` appends it with that toggle state.
    pub fn new(path: impl Into<Utf8PathBuf>, root_folder: Option<bool>) -> Self {
        Self {
            path: path.into(),
            root_folder,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The persisted entries only. A missing file is an empty list.
    pub fn read_entries(&self) -> Result<Vec<ModEntry>> {
        if !self.path.is_file() {
            tracing::debug!("Modlist not found at {}, treating as empty", self.path);
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read modlist: {}", self.path))?;
        Ok(parse_modlist(&text))
    }

    pub fn write_entries(&self, entries: &[ModEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create profile directory: {}", parent))?;
        }
        fs::write(&self.path, render_modlist(entries))
            .with_context(|| format!("Failed to write modlist: {}", self.path))?;
        tracing::info!("Saved modlist to {}", self.path);
        Ok(())
    }

    /// Put a mod at the top of the list, moving it if already present.
    pub fn prepend_mod(&self, mod_name: &str, enabled: bool) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.retain(|e| e.name != mod_name);
        entries.insert(0, ModEntry::new(mod_name, enabled));
        self.write_entries(&entries)
    }
}

impl ModlistStore for ModlistFile {
    fn load(&self) -> Result<Vec<ModEntry>> {
        let entries = self.read_entries()?;
        let list = Modlist::with_synthetic_entries(entries, self.root_folder);
        Ok(list.entries().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OVERWRITE_NAME, ROOT_FOLDER_NAME};
    use tempfile::TempDir;

    #[test]
    fn test_parse_modlist_prefixes() {
        let entries = parse_modlist("+A\n-B\n*C\n+Armor_separator\n-Weapons_separator\n\n#comment\n+\n");

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], ModEntry::new("A", true));
        assert_eq!(entries[1], ModEntry::new("B", false));
        assert!(entries[2].locked && entries[2].enabled);
        assert!(entries[3].is_separator && entries[4].is_separator);
    }

    #[test]
    fn test_render_writes_separators_with_minus_and_skips_synthetic() {
        let entries = vec![
            ModEntry::overwrite(),
            ModEntry::separator("Armor_separator"),
            ModEntry::new("A", true),
            ModEntry::new("B", false),
            ModEntry::root_folder(true),
        ];
        assert_eq!(render_modlist(&entries), "-Armor_separator\n+A\n-B\n");
    }

    #[test]
    fn test_locked_but_disabled_is_written_disabled() {
        let locked_disabled = ModEntry {
            name: "Patch".to_string(),
            enabled: false,
            locked: true,
            is_separator: false,
        };
        let locked_enabled = ModEntry {
            enabled: true,
            ..locked_disabled.clone()
        };

        let written = render_modlist(&[locked_disabled]);
        assert_eq!(written, "-Patch\n");
        assert!(!parse_modlist(&written)[0].enabled);
        assert_eq!(render_modlist(&[locked_enabled]), "*Patch\n");
    }

    #[test]
    fn test_load_injects_synthetic_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("modlist.txt")).unwrap();
        fs::write(&path, "+A\n").unwrap();

        let store = ModlistFile::new(&path, Some(true));
        let names: Vec<String> = store.load().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![OVERWRITE_NAME, "A", ROOT_FOLDER_NAME]);
    }

    #[test]
    fn test_prepend_moves_existing_mod_to_top() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("p/modlist.txt")).unwrap();
        let store = ModlistFile::new(&path, None);

        store.write_entries(&[ModEntry::new("A", true), ModEntry::new("B", false)]).unwrap();
        store.prepend_mod("B", true).unwrap();

        let entries = store.read_entries().unwrap();
        assert_eq!(entries[0], ModEntry::new("B", true));
        assert_eq!(entries[1], ModEntry::new("A", true));
    }

    #[test]
    fn test_missing_modlist_is_empty() {
        let store = ModlistFile::new("/no/such/profile/modlist.txt", None);
        assert!(store.read_entries().unwrap().is_empty());
    }
}
