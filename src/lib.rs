pub mod models;
pub mod pipeline;
pub mod processing;
pub mod utils;

pub use models::{PipelineConfig, PipelineResult, SequencedEntry};
pub use pipeline::{CancellationToken, PageSource, PipelineScheduler};
pub use processing::RecognitionEngine;
pub use utils::ExtractionError;
