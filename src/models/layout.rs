use camino::{Utf8Path, Utf8PathBuf};

use super::mod_entry::OVERWRITE_NAME;

/// File name of the data-destination index.
pub const FILEMAP_FILE_NAME: &str = "filemap.txt";

/// File name of the root-destination index, written next to the data index.
pub const ROOT_FILEMAP_FILE_NAME: &str = "filemap_root.txt";

/// On-disk locations one rebuild reads from and writes to.
///
/// The conventional game directory looks like:
///
/// ```text
/// <game>/mods/<mod name>/...   staging trees, one per mod
/// <game>/overwrite/...         files written at runtime
/// <game>/filemap.txt           data-destination index
/// <game>/filemap_root.txt      root-destination index
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    pub staging_root: Utf8PathBuf,
    pub overwrite_dir: Utf8PathBuf,
    pub output_path: Utf8PathBuf,
}

impl StagingLayout {
    /// Layout with the overwrite folder as a sibling of the staging root.
    pub fn new(staging_root: impl Into<Utf8PathBuf>, output_path: impl Into<Utf8PathBuf>) -> Self {
        let staging_root = staging_root.into();
        let overwrite_dir = staging_root
            .parent()
            .map(|p| p.join("overwrite"))
            .unwrap_or_else(|| Utf8PathBuf::from("overwrite"));
        Self {
            staging_root,
            overwrite_dir,
            output_path: output_path.into(),
        }
    }

    /// The conventional `<game>/mods` + `<game>/overwrite` + `<game>/filemap.txt` layout.
    pub fn for_game_dir(game_dir: impl AsRef<Utf8Path>) -> Self {
        let game_dir = game_dir.as_ref();
        Self {
            staging_root: game_dir.join("mods"),
            overwrite_dir: game_dir.join("overwrite"),
            output_path: game_dir.join(FILEMAP_FILE_NAME),
        }
    }

    pub fn with_overwrite_dir(mut self, overwrite_dir: impl Into<Utf8PathBuf>) -> Self {
        self.overwrite_dir = overwrite_dir.into();
        self
    }

    /// Where the root-destination index is written.
    pub fn root_output_path(&self) -> Utf8PathBuf {
        match self.output_path.parent() {
            Some(parent) => parent.join(ROOT_FILEMAP_FILE_NAME),
            None => Utf8PathBuf::from(ROOT_FILEMAP_FILE_NAME),
        }
    }

    /// Staging directory of one mod list entry.
    pub fn source_dir(&self, mod_name: &str) -> Utf8PathBuf {
        if mod_name == OVERWRITE_NAME {
            self.overwrite_dir.clone()
        } else {
            self.staging_root.join(mod_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_overwrite_sibling() {
        let layout = StagingLayout::new("/games/skyrim/mods", "/games/skyrim/filemap.txt");
        assert_eq!(layout.overwrite_dir, Utf8PathBuf::from("/games/skyrim/overwrite"));
        assert_eq!(
            layout.root_output_path(),
            Utf8PathBuf::from("/games/skyrim/filemap_root.txt")
        );
    }

    #[test]
    fn test_source_dir_routes_overwrite() {
        let layout = StagingLayout::for_game_dir("/g");
        assert_eq!(layout.source_dir("SkyUI"), Utf8PathBuf::from("/g/mods/SkyUI"));
        assert_eq!(layout.source_dir(OVERWRITE_NAME), Utf8PathBuf::from("/g/overwrite"));
    }
}
