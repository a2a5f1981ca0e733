pub mod cancel;
pub mod collector;
pub mod progress;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod worker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cancel::CancellationToken;
pub use collector::ResultCollector;
pub use progress::{LogObserver, ProgressObserver, SilentObserver};
pub use scheduler::PipelineScheduler;
pub use sink::{JsonLinesSink, NullSink, RecordSink};
pub use source::{discover_documents, ImageDirectorySource, InMemorySource, PageSource};
pub use worker::{PageOutcome, PageReport, PageWorker};
