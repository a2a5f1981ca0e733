pub mod classifier;
pub mod engine;
pub mod extractors;
pub mod field_correction;
pub mod grid;
pub mod image;
pub mod recognizer;
pub mod sanitizer;
pub mod sequence;
#[cfg(feature = "tesseract")]
pub mod tesseract_engine;

pub use engine::{EngineConfig, EngineMode, Recognition, RecognitionEngine};
pub use extractors::LineParser;
pub use field_correction::{CellReading, FieldNormalizer, NormalizedRecord};
pub use grid::GridSegmenter;
pub use image::ImageProcessor;
pub use recognizer::FieldRecognizer;
pub use sanitizer::CellSanitizer;
pub use sequence::SequenceAssigner;
#[cfg(feature = "tesseract")]
pub use tesseract_engine::TesseractEngine;
