use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, warn};

/// Tracks which rows are mounted and which one is open.
///
/// Owned by the list container, never by a row. Every mounted row registers
/// and every unmounted row unregisters, so no entry outlives its row.
#[derive(Debug)]
pub struct RowRegistry<K> {
    live: HashSet<K>,
    open_row: Option<K>,
}

impl<K> Default for RowRegistry<K> {
    fn default() -> Self {
        Self {
            live: HashSet::new(),
            open_row: None,
        }
    }
}

impl<K: Clone + Eq + Hash + Debug> RowRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the row was already registered
    pub fn register(&mut self, row_id: K) -> bool {
        self.live.insert(row_id)
    }

    /// Forget a disposed row. Does not close it.
    pub fn unregister(&mut self, row_id: &K) -> bool {
        if self.open_row.as_ref() == Some(row_id) {
            self.open_row = None;
        }
        self.live.remove(row_id)
    }

    /// Record that `row_id` committed open.
    ///
    /// If a different row was open, `close` is invoked on it before this
    /// returns, so two rows are never open at once.
    pub fn notify_opened<F>(&mut self, row_id: &K, close: F)
    where
        F: FnOnce(&K),
    {
        if !self.live.contains(row_id) {
            warn!(row = ?row_id, "Open notification from unregistered row");
            return;
        }
        if self.open_row.as_ref() == Some(row_id) {
            return;
        }
        if let Some(previous) = self.open_row.take() {
            debug!(previous = ?previous, next = ?row_id, "Closing previously open row");
            close(&previous);
        }
        self.open_row = Some(row_id.clone());
    }

    /// Last row reported open. It may have closed itself since.
    pub fn open_row(&self) -> Option<&K> {
        self.open_row.as_ref()
    }

    pub fn is_registered(&self, row_id: &K) -> bool {
        self.live.contains(row_id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
