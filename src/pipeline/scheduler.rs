use crate::models::{DocumentSummary, PipelineConfig, PipelineResult, SequencedEntry};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::collector::ResultCollector;
use crate::pipeline::progress::{LogObserver, ProgressObserver};
use crate::pipeline::sink::{NullSink, RecordSink};
use crate::pipeline::source::PageSource;
use crate::pipeline::worker::{PageOutcome, PageReport, PageWorker, WorkerContext};
use crate::processing::{
    CellSanitizer, FieldRecognizer, GridSegmenter, RecognitionEngine, SequenceAssigner,
};
use crate::utils::ExtractionError;
use chrono::Utc;
use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Runs documents one after another, the pages of each on a bounded pool.
pub struct PipelineScheduler {
    config: PipelineConfig,
    segmenter: GridSegmenter,
    sanitizer: CellSanitizer,
    assigner: SequenceAssigner,
    engine: Arc<dyn RecognitionEngine>,
    sink: Arc<dyn RecordSink>,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
    pool: ThreadPool,
}

impl PipelineScheduler {
    /// Validates the configuration and builds the worker pool. Nothing runs
    /// if either fails.
    pub fn new(config: PipelineConfig, engine: Arc<dyn RecognitionEngine>) -> Result<Self, ExtractionError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.scheduler.max_workers)
            .thread_name(|index| format!("rollgrid-page-{}", index))
            .build()?;

        Ok(PipelineScheduler {
            segmenter: GridSegmenter::new(config.grid.clone())?,
            sanitizer: CellSanitizer::new(config.mask.clone()),
            assigner: SequenceAssigner::new(&config.grid, &config.sequence),
            config,
            engine,
            sink: Arc::new(NullSink),
            observer: Arc::new(LogObserver),
            cancel: CancellationToken::new(),
            pool,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run<S: PageSource>(&self, sources: &[S]) -> PipelineResult {
        let started_at = Utc::now();
        let mut documents = Vec::with_capacity(sources.len());
        let mut entries = Vec::new();

        for (doc_index, source) in sources.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("run cancelled before document {}", source.name());
                break;
            }
            let (summary, document_entries) = self.run_document(source, doc_index, sources.len());
            documents.push(summary);
            entries.extend(document_entries);
        }

        PipelineResult {
            started_at,
            finished_at: Utc::now(),
            cancelled: self.cancel.is_cancelled(),
            documents,
            entries,
        }
    }

    /// One document. Load failures are recorded in the summary, never raised.
    pub fn run_document(
        &self,
        source: &dyn PageSource,
        doc_index: usize,
        docs_total: usize,
    ) -> (DocumentSummary, Vec<SequencedEntry>) {
        let tag = source.name().to_string();
        let mut summary = DocumentSummary {
            document_tag: tag.clone(),
            ..DocumentSummary::default()
        };
        self.observer.on_log(&format!("Processing document {} ({}/{})", tag, doc_index + 1, docs_total));

        let pages = match self.load_content_pages(source) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("skipping document {}: {}", tag, e);
                self.observer.on_log(&format!("Skipped document {}: {}", tag, e));
                summary.load_error = Some(e.to_string());
                return (summary, Vec::new());
            }
        };
        summary.pages_total = pages.len();

        let collector = ResultCollector::new();
        let reports: Mutex<Vec<PageReport>> = Mutex::new(Vec::with_capacity(pages.len()));
        let pages_done = AtomicUsize::new(0);
        let recognizer = FieldRecognizer::new(self.engine.as_ref(), self.config.recognition.clone());
        let context = WorkerContext {
            document_tag: &tag,
            segmenter: &self.segmenter,
            sanitizer: &self.sanitizer,
            recognizer: &recognizer,
            assigner: &self.assigner,
            collector: &collector,
            sink: self.sink.as_ref(),
            observer: self.observer.as_ref(),
            cancel: &self.cancel,
            entries_expected: pages.len() * self.config.grid.cells_per_page() as usize,
        };

        let pages_total = pages.len();
        self.pool.scope(|scope| {
            for page in pages {
                let context = &context;
                let reports = &reports;
                let pages_done = &pages_done;
                scope.spawn(move |_| {
                    let report = PageWorker::new(context).process(page);
                    let done = pages_done.fetch_add(1, Ordering::SeqCst) + 1;
                    context.observer.on_document_progress(doc_index, docs_total, done, pages_total);
                    reports.lock().unwrap_or_else(PoisonError::into_inner).push(report);
                });
            }
        });

        for report in reports.into_inner().unwrap_or_else(PoisonError::into_inner) {
            match report.outcome {
                PageOutcome::Complete => summary.pages_completed += 1,
                PageOutcome::EarlyStopped { .. } => summary.pages_early_stopped += 1,
                PageOutcome::Failed { .. } => summary.pages_failed += 1,
                PageOutcome::Cancelled { .. } => summary.pages_cancelled += 1,
            }
        }

        let entries = collector.into_entries();
        summary.entries = entries.len();
        info!(
            "document {}: {} entries from {} pages ({} early stopped, {} failed)",
            tag, summary.entries, summary.pages_total, summary.pages_early_stopped, summary.pages_failed
        );
        self.observer.on_log(&format!("Finished document {}: {} entries", tag, summary.entries));
        (summary, entries)
    }

    fn load_content_pages(&self, source: &dyn PageSource) -> Result<Vec<crate::models::Page>, ExtractionError> {
        let count = source.page_count()?;
        let first = self.config.scheduler.first_page;
        let last = count.saturating_sub(self.config.scheduler.trailing_pages_skipped);
        if last < first {
            info!("{}: no content pages in {} pages", source.name(), count);
            return Ok(Vec::new());
        }
        source.load_pages(first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Relation};
    use crate::pipeline::fixtures::{roll_engine, synthetic_page};
    use crate::pipeline::progress::SilentObserver;
    use crate::pipeline::source::InMemorySource;
    use image::GrayImage;
    use std::collections::HashSet;

    fn config(max_workers: usize) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.scheduler.max_workers = max_workers;
        config.scheduler.first_page = 1;
        config.scheduler.trailing_pages_skipped = 0;
        config.sequence.first_content_page = 1;
        config
    }

    fn scheduler(max_workers: usize) -> PipelineScheduler {
        PipelineScheduler::new(config(max_workers), Arc::new(roll_engine()))
            .unwrap()
            .with_observer(Arc::new(SilentObserver))
    }

    fn first_cells(count: usize) -> GrayImage {
        let filled: Vec<bool> = (0..30).map(|i| i < count).collect();
        synthetic_page(&filled)
    }

    #[test]
    fn test_end_to_end_twelve_cells() {
        let source = InMemorySource::new("roll_001", vec![first_cells(12)]);
        let result = scheduler(4).run(&[source]);

        let entries = result.sorted_entries();
        let sequences: Vec<i64> = entries.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (0..12).collect::<Vec<_>>());
        assert!(!result.cancelled);

        let summary = &result.documents[0];
        assert_eq!(summary.pages_total, 1);
        assert_eq!(summary.pages_early_stopped, 1);
        assert_eq!(summary.entries, 12);

        let hindi = &entries[0].record;
        assert_eq!(hindi.name, "व्यक्ति 0");
        assert_eq!(hindi.relation, Relation::Father);
        assert_eq!(hindi.relation_name, "अभिभावक 0");
        assert_eq!(hindi.house_number, "1");
        assert_eq!(hindi.age, "20");
        assert_eq!(hindi.gender, Gender::Male);
        assert_eq!(hindi.voter_id, "ABC1234567");

        let english = &entries[1];
        assert_eq!((english.page, english.row, english.col), (1, 1, 2));
        assert_eq!(english.document_tag, "roll_001");
        assert_eq!(english.record.name, "Person 1");
        assert_eq!(english.record.relation, Relation::Husband);
        assert_eq!(english.record.relation_name, "Spouse 1");
        assert_eq!(english.record.house_number, "2");
        assert_eq!(english.record.age, "21");
        assert_eq!(english.record.gender, Gender::Female);
    }

    #[test]
    fn test_pool_size_does_not_change_results() {
        let pages: Vec<GrayImage> = (0..4).map(|_| first_cells(30)).collect();
        let serial = scheduler(1).run(&[InMemorySource::new("doc", pages.clone())]);
        let parallel = scheduler(16).run(&[InMemorySource::new("doc", pages)]);

        assert_eq!(serial.total_entries(), 120);
        let a: HashSet<SequencedEntry> = serial.entries.into_iter().collect();
        let b: HashSet<SequencedEntry> = parallel.entries.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut bad = config(4);
        bad.grid.cols = 0;
        assert!(matches!(
            PipelineScheduler::new(bad, Arc::new(roll_engine())),
            Err(ExtractionError::InvalidGrid(_))
        ));

        let mut bad = config(4);
        bad.scheduler.max_workers = 0;
        assert!(matches!(
            PipelineScheduler::new(bad, Arc::new(roll_engine())),
            Err(ExtractionError::InvalidConfig(_))
        ));
    }

    struct FailingSink {
        attempts: AtomicUsize,
    }

    impl RecordSink for FailingSink {
        fn persist(&self, _entry: &SequencedEntry) -> Result<(), ExtractionError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ExtractionError::Persistence("store offline".to_string()))
        }
    }

    #[test]
    fn test_persistence_failures_do_not_block_aggregation() {
        let sink = Arc::new(FailingSink { attempts: AtomicUsize::new(0) });
        let result = scheduler(2)
            .with_sink(sink.clone())
            .run(&[InMemorySource::new("doc", vec![first_cells(12)])]);
        assert_eq!(result.total_entries(), 12);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 12);
    }

    struct UnreadableSource;

    impl PageSource for UnreadableSource {
        fn name(&self) -> &str {
            "corrupt"
        }

        fn page_count(&self) -> Result<u32, ExtractionError> {
            Err(ExtractionError::DocumentLoad("not a roll".to_string()))
        }

        fn load_pages(&self, _first: u32, _last: u32) -> Result<Vec<crate::models::Page>, ExtractionError> {
            Err(ExtractionError::DocumentLoad("not a roll".to_string()))
        }
    }

    #[test]
    fn test_document_load_failure_is_skipped() {
        let sources: Vec<Box<dyn PageSource>> = vec![
            Box::new(UnreadableSource),
            Box::new(InMemorySource::new("good", vec![first_cells(3)])),
        ];
        let result = scheduler(2).run(&sources);

        assert_eq!(result.documents.len(), 2);
        assert!(result.documents[0].load_error.is_some());
        assert_eq!(result.documents[1].entries, 3);
        assert_eq!(result.entries_for("good").count(), 3);
        assert_eq!(result.entries_for("corrupt").count(), 0);
    }

    #[test]
    fn test_leading_and_trailing_pages_skipped() {
        let mut config = config(2);
        config.scheduler.first_page = 2;
        config.scheduler.trailing_pages_skipped = 1;
        config.sequence.first_content_page = 2;
        let scheduler = PipelineScheduler::new(config, Arc::new(roll_engine()))
            .unwrap()
            .with_observer(Arc::new(SilentObserver));

        let cover = GrayImage::from_pixel(300, 1000, image::Luma([255u8]));
        let source = InMemorySource::new("doc", vec![cover.clone(), first_cells(2), cover]);
        let result = scheduler.run(&[source]);

        assert_eq!(result.documents[0].pages_total, 1);
        let pages: HashSet<u32> = result.entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, HashSet::from([2]));
        assert_eq!(result.sorted_entries()[0].sequence, 0);
    }

    #[test]
    fn test_default_page_range_skips_short_documents() {
        let scheduler = PipelineScheduler::new(PipelineConfig::default(), Arc::new(roll_engine()))
            .unwrap()
            .with_observer(Arc::new(SilentObserver));
        let result = scheduler.run(&[InMemorySource::new("short", vec![first_cells(12)])]);

        assert!(result.documents[0].load_error.is_none());
        assert_eq!(result.documents[0].pages_total, 0);
        assert_eq!(result.total_entries(), 0);
    }

    struct CancelAfterFirstCell {
        token: CancellationToken,
    }

    impl ProgressObserver for CancelAfterFirstCell {
        fn on_page_progress(&self, _page: u32, _done: usize, _total: usize) {
            self.token.cancel();
        }
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let token = CancellationToken::new();
        let scheduler = scheduler(1)
            .with_observer(Arc::new(CancelAfterFirstCell { token: token.clone() }))
            .with_cancellation(token);

        let pages: Vec<GrayImage> = (0..3).map(|_| first_cells(30)).collect();
        let result = scheduler.run(&[
            InMemorySource::new("first", pages.clone()),
            InMemorySource::new("second", pages),
        ]);

        assert!(result.cancelled);
        assert_eq!(result.total_entries(), 1);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].pages_cancelled, 3);
    }
}
