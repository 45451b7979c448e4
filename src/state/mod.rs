// State management module
//
// This module provides FilemapState, which holds the currently published
// filemap snapshot behind an Arc swap and emits events when it changes.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::services::FilemapSnapshot;

/// Events emitted as rebuilds progress
///
/// Consumers (a UI, a deploy step) subscribe instead of polling the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum FilemapEvent {
    /// A rebuild execution has started
    RebuildStarted { generation: u64 },

    /// A request arrived while a rebuild was running and was folded into a follow-up
    RebuildCoalesced,

    /// A new snapshot is visible to readers
    Published { generation: u64, files: usize },

    /// A rebuild failed; the previous snapshot remains published
    RebuildFailed { generation: u64, error: String },
}

/// Holder for the published [`FilemapSnapshot`]
///
/// Readers get an `Arc` to a complete snapshot. Publishing replaces the `Arc` in
/// one step, so a reader sees either the old result or the new one, never a mix.
///
/// # Related Types
///
/// - [`crate::scheduler::RebuildScheduler`]: The only writer in normal use
/// - [`FilemapEvent`]: Event types emitted on publish and failure
pub struct FilemapState {
    /// Current snapshot, swapped as a whole
    current: Arc<RwLock<Arc<FilemapSnapshot>>>,

    /// Broadcast channel for rebuild events
    event_tx: broadcast::Sender<FilemapEvent>,
}

impl FilemapState {
    /// Create a state holding an empty snapshot (generation 0)
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            current: Arc::new(RwLock::new(Arc::new(FilemapSnapshot::default()))),
            event_tx,
        }
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<FilemapSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Execute a function against the current snapshot
    ///
    /// # Example
    /// ```ignore
    /// let winner = state.read(|s| s.data.winner_of("meshes/tree.nif").map(str::to_owned));
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FilemapSnapshot) -> R,
    {
        let snapshot = self.snapshot();
        f(&snapshot)
    }

    /// Generation of the published snapshot
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Replace the published snapshot and emit [`FilemapEvent::Published`]
    pub fn publish(&self, snapshot: FilemapSnapshot) {
        let event = FilemapEvent::Published {
            generation: snapshot.generation,
            files: snapshot.count(),
        };
        *self.current.write() = Arc::new(snapshot);

        // Ignore send errors - it's OK if no one is listening
        let _ = self.event_tx.send(event);
    }

    /// Emit an event without touching the snapshot
    pub fn emit(&self, event: FilemapEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Record a failed rebuild. The published snapshot is left as it was.
    pub fn report_failure(&self, generation: u64, error: String) {
        self.emit(FilemapEvent::RebuildFailed { generation, error });
    }

    /// Subscribe to rebuild events
    pub fn subscribe(&self) -> broadcast::Receiver<FilemapEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for FilemapState {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same snapshot slot and event channel
impl Clone for FilemapState {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            event_tx: self.event_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FilemapIndex;

    fn snapshot_with(generation: u64, files: &[(&str, &str)]) -> FilemapSnapshot {
        let mut data = FilemapIndex::new();
        for (path, mod_name) in files {
            data.insert_if_absent(path, mod_name);
        }
        FilemapSnapshot {
            data,
            generation,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = FilemapState::new();
        assert_eq!(state.generation(), 0);
        assert_eq!(state.snapshot().count(), 0);
    }

    #[test]
    fn test_publish_swaps_snapshot() {
        let state = FilemapState::new();
        let before = state.snapshot();

        state.publish(snapshot_with(1, &[("a.esp", "A")]));

        // An Arc taken earlier still sees the old data
        assert_eq!(before.count(), 0);
        assert_eq!(state.generation(), 1);
        assert_eq!(state.read(|s| s.data.winner_of("A.ESP").map(str::to_owned)), Some("A".to_string()));
    }

    #[test]
    fn test_publish_emits_event() {
        let state = FilemapState::new();
        let mut rx = state.subscribe();

        state.publish(snapshot_with(3, &[("a.esp", "A"), ("b.esp", "B")]));

        assert_eq!(
            rx.try_recv().unwrap(),
            FilemapEvent::Published { generation: 3, files: 2 }
        );
    }

    #[test]
    fn test_report_failure_keeps_snapshot() {
        let state = FilemapState::new();
        state.publish(snapshot_with(1, &[("a.esp", "A")]));
        let mut rx = state.subscribe();

        state.report_failure(2, "disk full".to_string());

        assert_eq!(state.generation(), 1);
        assert!(matches!(rx.try_recv().unwrap(), FilemapEvent::RebuildFailed { generation: 2, .. }));
    }

    #[test]
    fn test_clone_shares_snapshot() {
        let state1 = FilemapState::new();
        let state2 = state1.clone();

        state1.publish(snapshot_with(5, &[]));
        assert_eq!(state2.generation(), 5);
    }
}
