use super::collector::ModFileSet;
use super::filemap::FilemapIndex;
use crate::models::Destination;

/// Picks the single winning mod for every relative path.
///
/// Sets must arrive in priority order. The first mod to claim a path keeps it,
/// so list position is the only tie-break and no other bookkeeping is needed.
pub struct WinnerResolver;

impl WinnerResolver {
    /// Resolve one destination.
    pub fn resolve(sets: &[ModFileSet], destination: Destination) -> FilemapIndex {
        let mut index = FilemapIndex::new();
        for set in sets {
            for rel in set.files(destination).values() {
                index.insert_if_absent(rel, &set.mod_name);
            }
        }
        index
    }

    /// Resolve both destinations independently: `(data, root)`.
    pub fn resolve_all(sets: &[ModFileSet]) -> (FilemapIndex, FilemapIndex) {
        (
            Self::resolve(sets, Destination::Data),
            Self::resolve(sets, Destination::Root),
        )
    }
}
