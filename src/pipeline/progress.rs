use log::info;

/// Advisory progress notifications. Called from worker threads; return
/// values are never consulted.
pub trait ProgressObserver: Send + Sync {
    fn on_page_progress(&self, _page_number: u32, _cells_done: usize, _cells_total: usize) {}

    /// Entries collected so far in the current document against the most its
    /// pages could hold.
    fn on_entry_progress(&self, _entries_done: usize, _entries_expected: usize) {}

    fn on_document_progress(&self, _doc_index: usize, _docs_total: usize, _pages_done: usize, _pages_total: usize) {}

    fn on_log(&self, _message: &str) {}
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_page_progress(&self, page_number: u32, cells_done: usize, cells_total: usize) {
        log::debug!("page {}: {}/{} cells", page_number, cells_done, cells_total);
    }

    fn on_entry_progress(&self, entries_done: usize, entries_expected: usize) {
        log::debug!("{}/{} entries", entries_done, entries_expected);
    }

    fn on_document_progress(&self, doc_index: usize, docs_total: usize, pages_done: usize, pages_total: usize) {
        info!(
            "document {}/{}: {}/{} pages done",
            doc_index + 1,
            docs_total,
            pages_done,
            pages_total
        );
    }

    fn on_log(&self, message: &str) {
        info!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {}
