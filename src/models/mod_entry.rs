/// Name written to the index for files coming from the overwrite folder.
///
/// The overwrite folder collects everything tools write while the game runs, so it
/// always sits at the top of the list and wins every collision.
pub const OVERWRITE_NAME: &str = "[Overwrite]";

/// Name of the synthetic row for files deployed to the game's install root.
pub const ROOT_FOLDER_NAME: &str = "[Root_Folder]";

/// Suffix marking a separator row in `modlist.txt`.
pub const SEPARATOR_SUFFIX: &str = "_separator";

/// One row of a profile's mod list.
///
/// Separators are display-only grouping markers and never contribute files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    pub enabled: bool,
    pub locked: bool,
    pub is_separator: bool,
}

impl ModEntry {
    /// A regular, unlocked mod.
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            locked: false,
            is_separator: false,
        }
    }

    /// A separator row. Separators are always reported as enabled.
    pub fn separator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            locked: true,
            is_separator: true,
        }
    }

    /// The synthetic overwrite row: always enabled, always first.
    pub fn overwrite() -> Self {
        Self {
            name: OVERWRITE_NAME.to_string(),
            enabled: true,
            locked: true,
            is_separator: false,
        }
    }

    /// The synthetic root folder row: always last, toggleable.
    pub fn root_folder(enabled: bool) -> Self {
        Self {
            name: ROOT_FOLDER_NAME.to_string(),
            enabled,
            locked: true,
            is_separator: false,
        }
    }

    pub fn is_overwrite(&self) -> bool {
        self.name == OVERWRITE_NAME
    }

    pub fn is_root_folder(&self) -> bool {
        self.name == ROOT_FOLDER_NAME
    }

    /// Synthetic rows are injected at load time and never persisted.
    pub fn is_synthetic(&self) -> bool {
        self.is_overwrite() || self.is_root_folder()
    }

    /// Human-readable name; separators lose their `_separator` suffix.
    pub fn display_name(&self) -> &str {
        if self.is_separator {
            self.name.strip_suffix(SEPARATOR_SUFFIX).unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}

/// Returns true when a modlist name denotes a separator row.
pub fn is_separator_name(name: &str) -> bool {
    name.ends_with(SEPARATOR_SUFFIX)
}

/// Ordered view of a profile's mod list, front = highest priority.
///
/// Priority is positional: the index of an entry *is* its priority, so
/// reordering the vector is all it takes to change who wins a collision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modlist {
    entries: Vec<ModEntry>,
}

impl Modlist {
    pub fn new(entries: Vec<ModEntry>) -> Self {
        Self { entries }
    }

    /// Inject the synthetic rows around the persisted entries.
    ///
    /// `[Overwrite]` is prepended; `[Root_Folder]` is appended when `root_folder`
    /// is `Some(enabled)`. Stale synthetic rows in `entries` are dropped first.
    pub fn with_synthetic_entries(entries: Vec<ModEntry>, root_folder: Option<bool>) -> Self {
        let mut all = Vec::with_capacity(entries.len() + 2);
        all.push(ModEntry::overwrite());
        all.extend(entries.into_iter().filter(|e| !e.is_synthetic()));
        if let Some(enabled) = root_folder {
            all.push(ModEntry::root_folder(enabled));
        }
        Self { entries: all }
    }

    pub fn entries(&self) -> &[ModEntry] {
        &self.entries
    }

    /// Entries that belong in `modlist.txt`.
    pub fn persisted(&self) -> Vec<ModEntry> {
        self.entries
            .iter()
            .filter(|e| !e.is_synthetic())
            .cloned()
            .collect()
    }

    /// Position of a mod in the list (0 = highest priority).
    pub fn priority_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ModEntry>> for Modlist {
    fn from(entries: Vec<ModEntry>) -> Self {
        Self::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_strips_separator_suffix() {
        let sep = ModEntry::separator("Textures_separator");
        assert_eq!(sep.display_name(), "Textures");

        let m = ModEntry::new("Cool_separator_mod", true);
        assert_eq!(m.display_name(), "Cool_separator_mod");
    }

    #[test]
    fn test_synthetic_entries_injected() {
        let list = Modlist::with_synthetic_entries(
            vec![ModEntry::new("A", true), ModEntry::overwrite()],
            Some(false),
        );

        let names: Vec<&str> = list.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![OVERWRITE_NAME, "A", ROOT_FOLDER_NAME]);
        assert!(!list.entries()[2].enabled);
        assert_eq!(list.persisted(), vec![ModEntry::new("A", true)]);
    }

    #[test]
    fn test_priority_is_position() {
        let list = Modlist::with_synthetic_entries(
            vec![ModEntry::new("A", true), ModEntry::new("B", false)],
            None,
        );
        assert_eq!(list.priority_of(OVERWRITE_NAME), Some(0));
        assert_eq!(list.priority_of("B"), Some(2));
        assert_eq!(list.priority_of("missing"), None);
    }
}
