use crate::processing::engine::{EngineConfig, EngineMode, Recognition, RecognitionEngine};
use crate::processing::image::ImageProcessor;
use crate::utils::ExtractionError;
use image::GrayImage;
use tesseract::{OcrEngineMode, Tesseract};

/// Tesseract backend. A fresh engine handle is built per call, so one
/// instance can be shared by every worker.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    datapath: Option<String>,
}

impl TesseractEngine {
    pub fn new(datapath: Option<String>) -> Self {
        TesseractEngine { datapath }
    }

    fn engine_mode(mode: EngineMode) -> OcrEngineMode {
        match mode {
            EngineMode::Default => OcrEngineMode::Default,
            EngineMode::LstmOnly => OcrEngineMode::LstmOnly,
        }
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &EngineConfig,
    ) -> Result<Recognition, ExtractionError> {
        let temp_file = ImageProcessor::save_to_temp_file(image)?;
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| ExtractionError::Engine("Could not convert path to string".to_string()))?;

        let tess = Tesseract::new_with_oem(self.datapath.as_deref(), Some(languages), Self::engine_mode(config.mode))
            .map_err(|e| ExtractionError::Engine(format!("Failed to initialize Tesseract: {}", e)))?
            .set_variable("tessedit_pageseg_mode", &config.psm.to_string())
            .map_err(|e| ExtractionError::Engine(format!("Failed to set page segmentation mode: {}", e)))?;

        let tess = match config.whitelist {
            Some(whitelist) => tess
                .set_variable("tessedit_char_whitelist", whitelist)
                .map_err(|e| ExtractionError::Engine(format!("Failed to set character whitelist: {}", e)))?,
            None => tess,
        };

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| ExtractionError::Engine(format!("Failed to set image: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::Engine(format!("Failed to extract text: {}", e)))?;
        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| ExtractionError::Engine(format!("Failed to extract TSV: {}", e)))?;

        Ok(Recognition::with_confidences(text, word_confidences(&tsv)))
    }
}

/// Word-level confidences from Tesseract TSV output; `-1` rows carry no word.
fn word_confidences(tsv: &str) -> Vec<f32> {
    tsv.lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 || columns[0] != "5" || columns[11].trim().is_empty() {
                return None;
            }
            columns[10].trim().parse::<f32>().ok().filter(|conf| *conf >= 0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_confidences_from_tsv() {
        let tsv = "1\t1\t0\t0\t0\t0\t0\t0\t100\t40\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t3\t4\t20\t10\t91.5\t42\n\
                   5\t1\t1\t1\t1\t2\t30\t4\t20\t10\t-1\t\n\
                   5\t1\t1\t1\t1\t3\t60\t4\t20\t10\t64\tX\n";
        assert_eq!(word_confidences(tsv), vec![91.5, 64.0]);
    }
}
