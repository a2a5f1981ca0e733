pub mod config;
pub mod data;
pub mod rules;

pub use config::{GridSpec, MaskLayout, PipelineConfig, Region};
pub use data::{
    Cell, CellBounds, Document, DocumentSummary, FieldRecord, Gender, Page, PipelineResult,
    Relation, SequencedEntry, NAME_UNAVAILABLE,
};
