use crate::models::config::RecognitionSpec;
use crate::models::rules::IDENTIFIER_PATTERNS;
use crate::models::Region;
use crate::processing::engine::{first_accepted, trimmed, Attempt, EngineConfig, EngineMode, Recognition, RecognitionEngine};
use crate::processing::field_correction::{CellReading, FallbackReader};
use crate::processing::image::{ImageProcessor, Preprocessing};
use crate::utils::text::{
    devanagari_to_ascii_digits, digits_only, has_devanagari_letters, substitute_glyphs, LABEL_GLYPHS, NUMERIC_GLYPHS,
    ONE_GLYPHS,
};
use crate::utils::ExtractionError;
use image::GrayImage;
use log::debug;

pub const IDENTIFIER_REGION: Region = Region::new(0.04, 0.18, 0.60, 0.98);
pub const NAME_REGION: Region = Region::new(0.23, 0.36, 0.11, 0.65);
pub const HOUSE_REGION: Region = Region::new(0.47, 0.59, 0.226, 0.50);
pub const AGE_REGION: Region = Region::new(0.58, 0.70, 0.12, 0.17);
pub const FULL_TEXT_REGION: Region = Region::new(0.20, 1.0, 0.0, 1.0);
/// Read from the unmasked cell: the sanitizer blanks this box.
pub const SEQUENCE_LABEL_REGION: Region = Region::new(0.05, 0.25, 0.20, 0.35);

const DIGITS: &str = "0123456789";
const HOUSE_DIGITS: &str = "0123456789/";

/// Longest house number accepted as purely numeric.
const MAX_HOUSE_DIGITS: usize = 10;

const IDENTIFIER_ATTEMPTS: [Attempt; 9] = [
    Attempt::new(EngineConfig::new("identifier-oem3-psm7", EngineMode::Default, 7), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem3-psm6", EngineMode::Default, 6), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm7", EngineMode::LstmOnly, 7), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm8", EngineMode::LstmOnly, 8), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem3-psm13", EngineMode::Default, 13), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm6", EngineMode::LstmOnly, 6), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm11", EngineMode::LstmOnly, 11), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm12", EngineMode::LstmOnly, 12), identifier_cleanup),
    Attempt::new(EngineConfig::new("identifier-oem1-psm9", EngineMode::LstmOnly, 9), identifier_cleanup),
];

const AGE_ATTEMPTS: [Attempt; 2] = [
    Attempt::new(EngineConfig::new("age-psm11", EngineMode::Default, 11), numeric_cleanup),
    Attempt::new(EngineConfig::new("age-psm7", EngineMode::Default, 7).with_whitelist(DIGITS), numeric_cleanup),
];

const ONE_SENSITIVE_AGE_ATTEMPTS: [Attempt; 3] = [
    Attempt::new(EngineConfig::new("age1-psm7", EngineMode::Default, 7).with_whitelist(DIGITS), one_sensitive_cleanup),
    Attempt::new(EngineConfig::new("age1-psm13", EngineMode::Default, 13).with_whitelist(DIGITS), one_sensitive_cleanup),
    Attempt::new(EngineConfig::new("age1-psm6", EngineMode::Default, 6).with_whitelist(DIGITS), one_sensitive_cleanup),
];

const HOUSE_DIGIT_ATTEMPTS: [Attempt; 1] = [Attempt::new(
    EngineConfig::new("house-digits-psm7", EngineMode::Default, 7).with_whitelist(HOUSE_DIGITS),
    house_cleanup,
)];

const HOUSE_MIXED_ATTEMPTS: [Attempt; 2] = [
    Attempt::new(EngineConfig::new("house-mixed-psm7", EngineMode::Default, 7), house_cleanup),
    Attempt::new(EngineConfig::new("house-mixed-psm8", EngineMode::Default, 8), house_cleanup),
];

const NAME_ATTEMPTS: [Attempt; 3] = [
    Attempt::new(EngineConfig::new("name-psm6", EngineMode::Default, 6), trimmed),
    Attempt::new(EngineConfig::new("name-psm11", EngineMode::Default, 11), trimmed),
    Attempt::new(EngineConfig::new("name-psm8", EngineMode::Default, 8), trimmed),
];

pub const FULL_TEXT_CONFIG: EngineConfig = EngineConfig::new("cell-text-psm11", EngineMode::Default, 11);

const SEQUENCE_LABEL_ATTEMPTS: [Attempt; 3] = [
    Attempt::new(EngineConfig::new("label-psm6", EngineMode::Default, 6), label_cleanup),
    Attempt::new(EngineConfig::new("label-psm11", EngineMode::Default, 11), label_cleanup),
    Attempt::new(EngineConfig::new("label-oem1-psm6", EngineMode::LstmOnly, 6), label_cleanup),
];

fn identifier_cleanup(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '/')
        .collect()
}

fn numeric_cleanup(text: &str) -> String {
    digits_only(&substitute_glyphs(text, NUMERIC_GLYPHS))
}

fn one_sensitive_cleanup(text: &str) -> String {
    let ones = substitute_glyphs(text, ONE_GLYPHS);
    let digits = substitute_glyphs(&ones, NUMERIC_GLYPHS);
    devanagari_to_ascii_digits(&digits)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn house_cleanup(text: &str) -> String {
    const NOISE: &[char] = &['|', '_', '-', '~', '`', '^', '*', '+', '=', '[', ']', '{', '}', '<', '>'];
    let stripped: String = text.chars().filter(|c| !NOISE.contains(c)).collect();
    let substituted = substitute_glyphs(&stripped, NUMERIC_GLYPHS);
    substituted.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn label_cleanup(text: &str) -> String {
    let numeric = substitute_glyphs(text, NUMERIC_GLYPHS);
    digits_only(&substitute_glyphs(&numeric, LABEL_GLYPHS))
}

fn is_short_number(text: &str) -> bool {
    (1..=3).contains(&text.len()) && text.chars().all(|c| c.is_ascii_digit())
}

/// Reads the fields of one cell through the engine's configuration chains.
pub struct FieldRecognizer<'e> {
    engine: &'e dyn RecognitionEngine,
    spec: RecognitionSpec,
}

impl<'e> FieldRecognizer<'e> {
    pub fn new(engine: &'e dyn RecognitionEngine, spec: RecognitionSpec) -> Self {
        FieldRecognizer { engine, spec }
    }

    /// Eager reads for one cell. Only a failed full-text pass is an error.
    pub fn read_cell(&self, raw: &GrayImage, sanitized: &GrayImage) -> Result<CellReading, ExtractionError> {
        let full_text = self.read_full_text(sanitized)?;
        Ok(CellReading {
            identifier: self.read_identifier(sanitized),
            house_number: self.read_house_number(sanitized),
            age: self.read_age(sanitized),
            full_text,
            sequence_label: self.read_sequence_label(raw),
        })
    }

    pub fn read_identifier(&self, cell: &GrayImage) -> String {
        self.read_region(
            cell,
            &IDENTIFIER_REGION,
            Preprocessing::Identifier,
            &self.spec.digit_languages,
            &IDENTIFIER_ATTEMPTS,
            |r| IDENTIFIER_PATTERNS.iter().any(|p| p.is_match(&r.text)),
        )
    }

    pub fn read_age(&self, cell: &GrayImage) -> String {
        let min_confidence = self.spec.min_confidence;
        self.read_region(
            cell,
            &AGE_REGION,
            Preprocessing::Age,
            &self.spec.digit_languages,
            &AGE_ATTEMPTS,
            |r| is_short_number(&r.text) && r.mean_confidence().map_or(true, |c| c >= min_confidence),
        )
    }

    /// Second look at the age box tuned for thin `1` strokes.
    pub fn read_age_one_sensitive(&self, cell: &GrayImage) -> String {
        self.read_region(
            cell,
            &AGE_REGION,
            Preprocessing::OneSensitive,
            &self.spec.digit_languages,
            &ONE_SENSITIVE_AGE_ATTEMPTS,
            |r| is_short_number(&r.text) && r.text.contains('1'),
        )
    }

    pub fn read_house_number(&self, cell: &GrayImage) -> String {
        let region = match ImageProcessor::crop_region(cell, &HOUSE_REGION) {
            Ok(region) => ImageProcessor::prepare(&region, Preprocessing::HouseNumber),
            Err(e) => {
                debug!("house number region skipped: {}", e);
                return String::new();
            }
        };

        let accept = |r: &Recognition| self.accept_house_number(r);
        first_accepted(self.engine, &region, &self.spec.digit_languages, &HOUSE_DIGIT_ATTEMPTS, accept)
            .or_else(|| first_accepted(self.engine, &region, &self.spec.text_languages, &HOUSE_MIXED_ATTEMPTS, accept))
            .map(|r| {
                if has_devanagari_letters(&r.text) {
                    r.text
                } else {
                    devanagari_to_ascii_digits(&r.text)
                }
            })
            .unwrap_or_default()
    }

    // Informational text (letters in the target script) only needs to clear the
    // threshold; plain numbers must reach it and stay short.
    fn accept_house_number(&self, candidate: &Recognition) -> bool {
        let text = candidate.text.trim();
        if text.is_empty() {
            return false;
        }
        let confidence = candidate.mean_confidence();
        if has_devanagari_letters(text) {
            return confidence.map_or(true, |c| c > self.spec.min_confidence);
        }

        let converted = devanagari_to_ascii_digits(text);
        let digit_count = converted.chars().filter(|c| c.is_ascii_digit()).count();
        let numeric_only = digit_count > 0 && converted.chars().all(|c| c.is_ascii_digit() || c == '/');
        numeric_only
            && digit_count <= MAX_HOUSE_DIGITS
            && confidence.map_or(true, |c| c >= self.spec.min_confidence)
    }

    pub fn read_name(&self, cell: &GrayImage) -> String {
        self.read_region(
            cell,
            &NAME_REGION,
            Preprocessing::None,
            &self.spec.text_languages,
            &NAME_ATTEMPTS,
            |r| !r.text.is_empty(),
        )
    }

    pub fn read_full_text(&self, cell: &GrayImage) -> Result<String, ExtractionError> {
        let region = ImageProcessor::crop_region(cell, &FULL_TEXT_REGION)?;
        let recognition = self
            .engine
            .recognize(&region, &self.spec.text_languages, &FULL_TEXT_CONFIG)?;
        Ok(recognition.text.trim().to_string())
    }

    /// Printed serial number, read from the raw cell.
    pub fn read_sequence_label(&self, raw: &GrayImage) -> String {
        self.read_region(
            raw,
            &SEQUENCE_LABEL_REGION,
            Preprocessing::SequenceLabel,
            &self.spec.digit_languages,
            &SEQUENCE_LABEL_ATTEMPTS,
            |r| !r.text.is_empty(),
        )
    }

    fn read_region<V>(
        &self,
        cell: &GrayImage,
        region: &Region,
        preprocessing: Preprocessing,
        languages: &str,
        attempts: &[Attempt],
        accept: V,
    ) -> String
    where
        V: Fn(&Recognition) -> bool,
    {
        let image = match ImageProcessor::crop_region(cell, region) {
            Ok(image) => ImageProcessor::prepare(&image, preprocessing),
            Err(e) => {
                debug!("{:?} region skipped: {}", preprocessing, e);
                return String::new();
            }
        };
        first_accepted(self.engine, &image, languages, attempts, accept)
            .map(|r| r.text)
            .unwrap_or_default()
    }
}

/// Lazy fallback reads bound to one sanitized cell.
pub struct CellFallback<'a, 'e> {
    recognizer: &'a FieldRecognizer<'e>,
    cell: &'a GrayImage,
}

impl<'a, 'e> CellFallback<'a, 'e> {
    pub fn new(recognizer: &'a FieldRecognizer<'e>, cell: &'a GrayImage) -> Self {
        CellFallback { recognizer, cell }
    }
}

impl FallbackReader for CellFallback<'_, '_> {
    fn read_name(&self) -> String {
        self.recognizer.read_name(self.cell)
    }

    fn read_age_one_sensitive(&self) -> String {
        self.recognizer.read_age_one_sensitive(self.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::engine::mock::ScriptedEngine;
    use image::Luma;

    fn cell() -> GrayImage {
        GrayImage::from_pixel(300, 100, Luma([200u8]))
    }

    fn recognizer(engine: &dyn RecognitionEngine) -> FieldRecognizer<'_> {
        FieldRecognizer::new(engine, RecognitionSpec::default())
    }

    #[test]
    fn test_identifier_tries_until_pattern_matches() {
        let engine = ScriptedEngine::new(|_, languages, config| {
            assert_eq!(languages, "eng");
            Ok(match config.label {
                "identifier-oem3-psm7" => Recognition::text("AB 12345"),
                "identifier-oem3-psm6" => Recognition::text("noise"),
                "identifier-oem1-psm7" => Recognition::text(" aXYZ 1234567 \n"),
                _ => Recognition::text("ZZZ0000000"),
            })
        });
        assert_eq!(recognizer(&engine).read_identifier(&cell()), "XYZ1234567");

        let slashed = ScriptedEngine::new(|_, _, _| Ok(Recognition::text("CG/11/083/123456.")));
        assert_eq!(recognizer(&slashed).read_identifier(&cell()), "CG/11/083/123456");

        let never = ScriptedEngine::new(|_, _, _| Ok(Recognition::text("1234")));
        assert_eq!(recognizer(&never).read_identifier(&cell()), "");
    }

    #[test]
    fn test_age_confidence_threshold() {
        let low = ScriptedEngine::new(|_, _, config| {
            Ok(match config.label {
                "age-psm11" => Recognition::with_confidences("4S", vec![40.0]),
                _ => Recognition::with_confidences("38", vec![71.0, 75.0]),
            })
        });
        assert_eq!(recognizer(&low).read_age(&cell()), "38");

        let unreported = ScriptedEngine::new(|_, _, _| Ok(Recognition::text("2?")));
        assert_eq!(recognizer(&unreported).read_age(&cell()), "27");

        let failing = ScriptedEngine::new(|_, _, _| Err(ExtractionError::Engine("down".to_string())));
        assert_eq!(recognizer(&failing).read_age(&cell()), "");
    }

    #[test]
    fn test_one_sensitive_age_requires_a_one() {
        let engine = ScriptedEngine::new(|_, _, config| {
            Ok(match config.label {
                "age1-psm7" => Recognition::text("22"),
                "age1-psm13" => Recognition::text("I7"),
                _ => Recognition::text("11"),
            })
        });
        assert_eq!(recognizer(&engine).read_age_one_sensitive(&cell()), "17");
    }

    #[test]
    fn test_house_number_rules() {
        // numeric readings must reach the threshold
        let numeric = ScriptedEngine::new(|_, languages, config| {
            Ok(match (config.label, languages) {
                ("house-digits-psm7", "eng") => Recognition::with_confidences("12", vec![60.0]),
                ("house-mixed-psm7", "hin+eng") => Recognition::with_confidences("|12/4|", vec![70.0]),
                _ => Recognition::text("unexpected"),
            })
        });
        assert_eq!(recognizer(&numeric).read_house_number(&cell()), "12/4");

        // target-script text must be strictly above the threshold
        let text = ScriptedEngine::new(|_, _, config| {
            Ok(match config.label {
                "house-digits-psm7" => Recognition::with_confidences("", vec![]),
                "house-mixed-psm7" => Recognition::with_confidences("ख 12", vec![70.0]),
                _ => Recognition::with_confidences("ग 7", vec![71.0]),
            })
        });
        assert_eq!(recognizer(&text).read_house_number(&cell()), "ग 7");

        let too_long = ScriptedEngine::new(|_, _, _| Ok(Recognition::with_confidences("12345678901", vec![99.0])));
        assert_eq!(recognizer(&too_long).read_house_number(&cell()), "");

        let latin = ScriptedEngine::new(|_, _, _| Ok(Recognition::with_confidences("12B", vec![99.0])));
        assert_eq!(recognizer(&latin).read_house_number(&cell()), "");
    }

    #[test]
    fn test_full_text_error_propagates() {
        let engine = ScriptedEngine::new(|_, _, config| {
            if config.label == FULL_TEXT_CONFIG.label {
                Err(ExtractionError::Engine("crashed".to_string()))
            } else {
                Ok(Recognition::default())
            }
        });
        let r = recognizer(&engine);
        assert!(r.read_full_text(&cell()).is_err());
        assert!(r.read_cell(&cell(), &cell()).is_err());
    }

    #[test]
    fn test_sequence_label_cleanup_and_name_chain() {
        let engine = ScriptedEngine::new(|_, _, config| {
            Ok(match config.label {
                "label-psm6" => Recognition::text(""),
                "label-psm11" => Recognition::text("[2S]"),
                "name-psm6" => Recognition::text("  "),
                "name-psm11" => Recognition::text(" राम कुमार \n"),
                _ => Recognition::text("unexpected"),
            })
        });
        let r = recognizer(&engine);
        assert_eq!(r.read_sequence_label(&cell()), "1251");
        assert_eq!(r.read_name(&cell()), "राम कुमार");

        let c = cell();
        let fallback = CellFallback::new(&r, &c);
        assert_eq!(fallback.read_name(), "राम कुमार");
    }

    #[test]
    fn test_tiny_cell_yields_empty_fields() {
        let engine = ScriptedEngine::new(|_, _, _| Ok(Recognition::text("ABC1234567")));
        let tiny = GrayImage::from_pixel(4, 4, Luma([0u8]));
        // age box is zero pixels wide at this size
        assert_eq!(recognizer(&engine).read_age(&tiny), "");
    }
}
