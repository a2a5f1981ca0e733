use crate::utils::ExtractionError;
use image::GrayImage;
use log::debug;

/// Engine recognition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineMode {
    /// Whatever the engine picks (legacy and LSTM where available)
    Default,
    LstmOnly,
}

/// One engine configuration: mode, page segmentation mode and an optional whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineConfig {
    pub label: &'static str,
    pub mode: EngineMode,
    pub psm: u8,
    pub whitelist: Option<&'static str>,
}

impl EngineConfig {
    pub const fn new(label: &'static str, mode: EngineMode, psm: u8) -> Self {
        EngineConfig { label, mode, psm, whitelist: None }
    }

    pub const fn with_whitelist(self, whitelist: &'static str) -> Self {
        EngineConfig { whitelist: Some(whitelist), ..self }
    }
}

/// Engine output for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Per-token confidences (0-100); empty when the engine does not report them
    pub confidences: Vec<f32>,
}

impl Recognition {
    pub fn text(text: impl Into<String>) -> Self {
        Recognition { text: text.into(), confidences: Vec::new() }
    }

    pub fn with_confidences(text: impl Into<String>, confidences: Vec<f32>) -> Self {
        Recognition { text: text.into(), confidences }
    }

    pub fn mean_confidence(&self) -> Option<f32> {
        if self.confidences.is_empty() {
            return None;
        }
        Some(self.confidences.iter().sum::<f32>() / self.confidences.len() as f32)
    }
}

/// Text recognition backend. Called concurrently from every page worker.
pub trait RecognitionEngine: Send + Sync {
    fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &EngineConfig,
    ) -> Result<Recognition, ExtractionError>;
}

impl<E: RecognitionEngine + ?Sized> RecognitionEngine for std::sync::Arc<E> {
    fn recognize(
        &self,
        image: &GrayImage,
        languages: &str,
        config: &EngineConfig,
    ) -> Result<Recognition, ExtractionError> {
        (**self).recognize(image, languages, config)
    }
}

/// A configuration paired with the cleanup applied to its raw text.
#[derive(Clone, Copy)]
pub struct Attempt {
    pub config: EngineConfig,
    pub cleanup: fn(&str) -> String,
}

impl Attempt {
    pub const fn new(config: EngineConfig, cleanup: fn(&str) -> String) -> Self {
        Attempt { config, cleanup }
    }
}

pub fn trimmed(text: &str) -> String {
    text.trim().to_string()
}

/// Run attempts in priority order and return the first cleaned reading the
/// validator accepts. Engine errors count as rejected attempts.
pub fn first_accepted<E, V>(
    engine: &E,
    image: &GrayImage,
    languages: &str,
    attempts: &[Attempt],
    accept: V,
) -> Option<Recognition>
where
    E: RecognitionEngine + ?Sized,
    V: Fn(&Recognition) -> bool,
{
    for attempt in attempts {
        match engine.recognize(image, languages, &attempt.config) {
            Ok(raw) => {
                let candidate = Recognition {
                    text: (attempt.cleanup)(&raw.text),
                    confidences: raw.confidences,
                };
                if accept(&candidate) {
                    debug!("{} accepted {:?}", attempt.config.label, candidate.text);
                    return Some(candidate);
                }
                debug!("{} rejected {:?}", attempt.config.label, candidate.text);
            }
            Err(e) => debug!("{} failed: {}", attempt.config.label, e),
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// Engine driven by a closure over the image and the configuration.
    pub struct ScriptedEngine<F>
    where
        F: Fn(&GrayImage, &str, &EngineConfig) -> Result<Recognition, ExtractionError> + Send + Sync,
    {
        script: F,
    }

    impl<F> ScriptedEngine<F>
    where
        F: Fn(&GrayImage, &str, &EngineConfig) -> Result<Recognition, ExtractionError> + Send + Sync,
    {
        pub fn new(script: F) -> Self {
            ScriptedEngine { script }
        }
    }

    impl<F> RecognitionEngine for ScriptedEngine<F>
    where
        F: Fn(&GrayImage, &str, &EngineConfig) -> Result<Recognition, ExtractionError> + Send + Sync,
    {
        fn recognize(
            &self,
            image: &GrayImage,
            languages: &str,
            config: &EngineConfig,
        ) -> Result<Recognition, ExtractionError> {
            (self.script)(image, languages, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedEngine;
    use super::*;

    const FIRST: EngineConfig = EngineConfig::new("first", EngineMode::Default, 7);
    const SECOND: EngineConfig = EngineConfig::new("second", EngineMode::LstmOnly, 6);
    const THIRD: EngineConfig = EngineConfig::new("third", EngineMode::Default, 11).with_whitelist("0123456789");

    fn upper(text: &str) -> String {
        text.trim().to_uppercase()
    }

    #[test]
    fn test_first_accepted_walks_chain_in_order() {
        let engine = ScriptedEngine::new(|_, _, config| match config.label {
            "first" => Err(ExtractionError::Engine("boom".to_string())),
            "second" => Ok(Recognition::text("  nope ")),
            _ => Ok(Recognition::with_confidences("42", vec![90.0, 80.0])),
        });
        let img = GrayImage::new(4, 4);
        let attempts = [Attempt::new(FIRST, trimmed), Attempt::new(SECOND, upper), Attempt::new(THIRD, trimmed)];

        let hit = first_accepted(&engine, &img, "eng", &attempts, |r| r.text.chars().all(|c| c.is_ascii_digit()))
            .unwrap();
        assert_eq!(hit.text, "42");
        assert_eq!(hit.mean_confidence(), Some(85.0));

        let miss = first_accepted(&engine, &img, "eng", &attempts, |r| r.text == "never");
        assert!(miss.is_none());
    }

    #[test]
    fn test_cleanup_runs_before_validation() {
        let engine = ScriptedEngine::new(|_, _, _| Ok(Recognition::text(" abc ")));
        let img = GrayImage::new(2, 2);
        let hit = first_accepted(&engine, &img, "eng", &[Attempt::new(SECOND, upper)], |r| r.text == "ABC");
        assert!(hit.is_some());
        assert_eq!(THIRD.whitelist, Some("0123456789"));
        assert_eq!(Recognition::text("x").mean_confidence(), None);
    }
}
