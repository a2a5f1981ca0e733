use crate::utils::ExtractionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid shape and page margins, as fractions of the page size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub side_margin: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            rows: 10,
            cols: 3,
            top_margin: 0.03,
            bottom_margin: 0.026,
            side_margin: 0.02,
        }
    }
}

impl GridSpec {
    pub fn cells_per_page(&self) -> u32 {
        self.rows * self.cols
    }

    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ExtractionError::InvalidGrid(format!(
                "grid must have positive dimensions, got {}x{}",
                self.rows, self.cols
            )));
        }
        let margins = [self.top_margin, self.bottom_margin, self.side_margin];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ExtractionError::InvalidGrid(
                "margins must be finite and non-negative".to_string(),
            ));
        }
        if self.top_margin + self.bottom_margin >= 1.0 || self.side_margin * 2.0 >= 1.0 {
            return Err(ExtractionError::InvalidGrid(
                "margins leave no usable page area".to_string(),
            ));
        }
        Ok(())
    }
}

/// Proportional box within a cell: `[top, bottom) x [left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Region {
    pub const fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Region { top, bottom, left, right }
    }

    /// Pixel rectangle `(x, y, width, height)` for an image of the given size.
    /// Edges are truncated like integer slicing, so the box never leaves the image.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let x1 = ((self.left * width as f64) as u32).min(width);
        let x2 = ((self.right * width as f64) as u32).min(width);
        let y1 = ((self.top * height as f64) as u32).min(height);
        let y2 = ((self.bottom * height as f64) as u32).min(height);
        (x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    fn is_valid(&self) -> bool {
        [self.top, self.bottom, self.left, self.right]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
            && self.top < self.bottom
            && self.left < self.right
    }
}

/// Regions of a cell that carry print artifacts rather than data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskLayout {
    pub serial_box: Region,
    pub photo_box: Region,
    /// Border strip width as a fraction of the smaller cell dimension
    pub border_fraction: f64,
}

impl Default for MaskLayout {
    fn default() -> Self {
        MaskLayout {
            serial_box: Region::new(0.04, 0.22, 0.015, 0.5),
            photo_box: Region::new(0.21, 0.95, 0.7, 0.98),
            border_fraction: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSpec {
    /// Page number (1-based) that holds sequence 0
    pub first_content_page: u32,
    pub offset: i64,
}

impl Default for SequenceSpec {
    fn default() -> Self {
        SequenceSpec {
            first_content_page: 3,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSpec {
    /// Engine languages for the printed cell text
    pub text_languages: String,
    /// Engine languages for numeric and identifier sub-regions
    pub digit_languages: String,
    /// Mean token confidence (0-100) a numeric reading must reach
    pub min_confidence: f32,
    /// Engine data directory; engine default when unset
    pub data_path: Option<String>,
}

impl Default for RecognitionSpec {
    fn default() -> Self {
        RecognitionSpec {
            text_languages: "hin+eng".to_string(),
            digit_languages: "eng".to_string(),
            min_confidence: 70.0,
            data_path: None,
        }
    }
}

/// Which pages of each document reach the workers. The defaults match a full
/// printed roll (two cover pages, one summary page at the end), so a document
/// with fewer than four pages yields no entries until `first_page` and
/// `trailing_pages_skipped` are lowered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSpec {
    pub max_workers: usize,
    /// First page (1-based) handed to the workers; earlier pages are cover matter
    pub first_page: u32,
    /// Pages at the end of each document that carry no grid
    pub trailing_pages_skipped: u32,
}

impl Default for SchedulerSpec {
    fn default() -> Self {
        SchedulerSpec {
            max_workers: 16,
            first_page: 3,
            trailing_pages_skipped: 1,
        }
    }
}

/// Everything a run needs, passed into the pipeline at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grid: GridSpec,
    pub mask: MaskLayout,
    pub sequence: SequenceSpec,
    pub recognition: RecognitionSpec,
    pub scheduler: SchedulerSpec,
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExtractionError> {
        self.grid.validate()?;

        if !self.mask.serial_box.is_valid() || !self.mask.photo_box.is_valid() {
            return Err(ExtractionError::InvalidConfig(
                "mask boxes must lie within the cell".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&self.mask.border_fraction) {
            return Err(ExtractionError::InvalidConfig(format!(
                "border fraction {} out of range",
                self.mask.border_fraction
            )));
        }
        if self.sequence.first_content_page == 0 || self.scheduler.first_page == 0 {
            return Err(ExtractionError::InvalidConfig(
                "page numbers are 1-based".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.recognition.min_confidence) {
            return Err(ExtractionError::InvalidConfig(format!(
                "confidence threshold {} outside 0-100",
                self.recognition.min_confidence
            )));
        }
        if self.recognition.text_languages.trim().is_empty()
            || self.recognition.digit_languages.trim().is_empty()
        {
            return Err(ExtractionError::InvalidConfig(
                "language sets must not be empty".to_string(),
            ));
        }
        if self.scheduler.max_workers == 0 {
            return Err(ExtractionError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.cells_per_page(), 30);
        assert_eq!(config.scheduler.max_workers, 16);
    }

    #[test]
    fn test_invalid_grid_fails_fast() {
        let mut config = PipelineConfig::default();
        config.grid.rows = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidGrid(_)));
        assert!(err.is_fatal());

        let mut config = PipelineConfig::default();
        config.grid.top_margin = 0.6;
        config.grid.bottom_margin = 0.5;
        assert!(matches!(config.validate(), Err(ExtractionError::InvalidGrid(_))));
    }

    #[test]
    fn test_invalid_scheduler_and_recognition() {
        let mut config = PipelineConfig::default();
        config.scheduler.max_workers = 0;
        assert!(matches!(config.validate(), Err(ExtractionError::InvalidConfig(_))));

        let mut config = PipelineConfig::default();
        config.recognition.min_confidence = 120.0;
        assert!(matches!(config.validate(), Err(ExtractionError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"grid": {"rows": 8}, "scheduler": {"max_workers": 4}}"#).unwrap();
        assert_eq!(config.grid.rows, 8);
        assert_eq!(config.grid.cols, 3);
        assert_eq!(config.scheduler.max_workers, 4);
        assert_eq!(config.recognition.text_languages, "hin+eng");
    }

    #[test]
    fn test_region_to_pixels_truncates() {
        let region = Region::new(0.5, 0.75, 0.25, 0.5);
        assert_eq!(region.to_pixels(202, 101), (50, 50, 51, 25));
        let full = Region::new(0.0, 1.0, 0.0, 1.0);
        assert_eq!(full.to_pixels(7, 9), (0, 0, 7, 9));
    }
}
