use crate::utils::ExtractionError;
use chrono::{DateTime, Utc};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Printed placeholder used when no name could be recovered from a cell.
pub const NAME_UNAVAILABLE: &str = "Name Unavailable";

/// One page of a document, already rasterized to grayscale.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based position within the source document
    pub index: usize,
    pub image: GrayImage,
}

impl Page {
    pub fn new(index: usize, image: GrayImage) -> Self {
        Page { index, image }
    }

    /// 1-based page number as printed in the document.
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }
}

/// A loaded document: its stable tag and the content pages to process.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub pages: Vec<Page>,
}

/// Pixel rectangle of a cell within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellBounds {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &CellBounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// One grid position of a page. The image is owned by the cell until recognition consumes it.
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub bounds: CellBounds,
    pub image: GrayImage,
}

/// Canonical relation of the named person to the relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Relation {
    Husband,
    Father,
    Other,
    /// Token that matched no class, kept as read
    Unrecognized(String),
}

impl Relation {
    pub fn blank() -> Self {
        Relation::Unrecognized(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Relation::Unrecognized(raw) if raw.trim().is_empty())
    }
}

impl Default for Relation {
    fn default() -> Self {
        Relation::blank()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Relation::Husband => write!(f, "Husband"),
            Relation::Father => write!(f, "Father"),
            Relation::Other => write!(f, "Other"),
            Relation::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<Relation> for String {
    fn from(relation: Relation) -> String {
        relation.to_string()
    }
}

impl From<String> for Relation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Husband" | "पति" => Relation::Husband,
            "Father" | "पिता" => Relation::Father,
            "Other" | "अन्य" => Relation::Other,
            _ => Relation::Unrecognized(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Normalized fields of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub voter_id: String,
    pub name: String,
    pub relation: Relation,
    pub relation_name: String,
    pub house_number: String,
    pub age: String,
    pub gender: Gender,
}

/// A record placed in the document-wide numbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencedEntry {
    pub sequence: i64,
    /// Printed serial number as read from the cell; advisory only
    #[serde(rename = "sequenceOCR")]
    pub sequence_ocr: String,
    pub page: u32,
    pub row: u32,
    pub col: u32,
    pub document_tag: String,
    pub record: FieldRecord,
}

/// Per-document counters reported alongside the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub document_tag: String,
    pub pages_total: usize,
    pub pages_completed: usize,
    pub pages_early_stopped: usize,
    pub pages_failed: usize,
    pub pages_cancelled: usize,
    pub entries: usize,
    /// Set when the document could not be loaded at all
    pub load_error: Option<String>,
}

/// Aggregate output of a run. Entries are in arrival order, not sequence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub documents: Vec<DocumentSummary>,
    pub entries: Vec<SequencedEntry>,
}

impl PipelineResult {
    pub fn total_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn entries_for<'a>(&'a self, document_tag: &'a str) -> impl Iterator<Item = &'a SequencedEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.document_tag == document_tag)
    }

    /// Entries ordered by document, then sequence.
    pub fn sorted_entries(&self) -> Vec<SequencedEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            a.document_tag
                .cmp(&b.document_tag)
                .then(a.sequence.cmp(&b.sequence))
        });
        entries
    }

    /// Writes the whole result as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ExtractionError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes one document's entries, in sequence order, as a JSON array.
    pub fn write_document_json<P: AsRef<Path>>(&self, document_tag: &str, path: P) -> Result<usize, ExtractionError> {
        let mut entries: Vec<&SequencedEntry> = self.entries_for(document_tag).collect();
        entries.sort_by_key(|entry| entry.sequence);

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &entries)?;
        writer.flush()?;
        Ok(entries.len())
    }
}
