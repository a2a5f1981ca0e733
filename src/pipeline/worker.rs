use crate::models::{Cell, Page};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::collector::ResultCollector;
use crate::pipeline::progress::ProgressObserver;
use crate::pipeline::sink::RecordSink;
use crate::processing::recognizer::CellFallback;
use crate::processing::{CellSanitizer, FieldNormalizer, FieldRecognizer, GridSegmenter, SequenceAssigner};
use log::{info, warn};

/// How a page ended. `cell` is the 1-based grid position where processing
/// stopped, 0 when no cell was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Every cell yielded a record
    Complete,
    /// The cell at this position was empty; it and everything after it were dropped
    EarlyStopped { cell: usize },
    Failed { cell: usize, reason: String },
    Cancelled { cell: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page_number: u32,
    pub emitted: usize,
    pub outcome: PageOutcome,
}

/// Shared, read-only collaborators for every page of one document.
pub struct WorkerContext<'a> {
    pub document_tag: &'a str,
    pub segmenter: &'a GridSegmenter,
    pub sanitizer: &'a CellSanitizer,
    pub recognizer: &'a FieldRecognizer<'a>,
    pub assigner: &'a SequenceAssigner,
    pub collector: &'a ResultCollector,
    pub sink: &'a dyn RecordSink,
    pub observer: &'a dyn ProgressObserver,
    pub cancel: &'a CancellationToken,
    /// Upper bound on entries for the document: content pages times cells per page
    pub entries_expected: usize,
}

/// Runs one page to completion: segment, then per cell sanitize, recognize,
/// normalize, number and emit, stopping at the first empty cell.
pub struct PageWorker<'c, 'a> {
    context: &'c WorkerContext<'a>,
}

impl<'c, 'a> PageWorker<'c, 'a> {
    pub fn new(context: &'c WorkerContext<'a>) -> Self {
        PageWorker { context }
    }

    pub fn process(&self, page: Page) -> PageReport {
        let page_number = page.number();
        let report = |emitted, outcome| PageReport { page_number, emitted, outcome };

        if self.context.cancel.is_cancelled() {
            return report(0, PageOutcome::Cancelled { cell: 0 });
        }

        let cells = match self.context.segmenter.segment(&page.image) {
            Ok(cells) => cells,
            Err(e) => {
                warn!("{} page {}: {}", self.context.document_tag, page_number, e);
                return report(0, PageOutcome::Failed { cell: 0, reason: e.to_string() });
            }
        };
        drop(page);

        let total = cells.len();
        let mut emitted = 0;
        for (index, cell) in cells.into_iter().enumerate() {
            let position = index + 1;
            if self.context.cancel.is_cancelled() {
                info!("{} page {} cancelled at cell {}", self.context.document_tag, page_number, position);
                return report(emitted, PageOutcome::Cancelled { cell: position });
            }

            match self.process_cell(page_number, cell) {
                Ok(true) => {
                    emitted += 1;
                    self.context.observer.on_page_progress(page_number, position, total);
                }
                Ok(false) => {
                    info!(
                        "{} page {}: cell {} empty, {} entries",
                        self.context.document_tag, page_number, position, emitted
                    );
                    return report(emitted, PageOutcome::EarlyStopped { cell: position });
                }
                Err(reason) => {
                    warn!(
                        "{} page {} failed at cell {}: {}",
                        self.context.document_tag, page_number, position, reason
                    );
                    return report(emitted, PageOutcome::Failed { cell: position, reason });
                }
            }
        }

        info!("{} page {}: complete, {} entries", self.context.document_tag, page_number, emitted);
        report(emitted, PageOutcome::Complete)
    }

    /// `Ok(false)` when the cell holds no record.
    fn process_cell(&self, page_number: u32, cell: Cell) -> Result<bool, String> {
        let Cell { row, col, image, .. } = cell;
        let sanitized = self.context.sanitizer.sanitize(&image);

        let reading = self
            .context
            .recognizer
            .read_cell(&image, &sanitized)
            .map_err(|e| e.to_string())?;
        drop(image);

        let fallback = CellFallback::new(self.context.recognizer, &sanitized);
        let normalized = FieldNormalizer::normalize(&reading, &fallback);
        if normalized.is_empty {
            return Ok(false);
        }

        let entry = self.context.assigner.assign(
            self.context.document_tag,
            page_number,
            row,
            col,
            reading.sequence_label,
            normalized.record,
        );
        if let Err(e) = self.context.sink.persist(&entry) {
            warn!("failed to persist entry {} of {}: {}", entry.sequence, self.context.document_tag, e);
        }
        let done = self.context.collector.push(entry);
        self.context
            .observer
            .on_entry_progress(done, self.context.entries_expected);
        Ok(true)
    }
}
