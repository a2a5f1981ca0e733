use crate::models::SequencedEntry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Shared aggregation point for one run: an append-only entry list behind a
/// single lock, plus a counter read only for progress reporting.
#[derive(Debug, Default)]
pub struct ResultCollector {
    entries: Mutex<Vec<SequencedEntry>>,
    processed: AtomicUsize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and return the running count.
    pub fn push(&self, entry: SequencedEntry) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Entries in arrival order.
    pub fn into_entries(self) -> Vec<SequencedEntry> {
        self.entries.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
