// Synthetic roll pages and a scripted engine that "reads" them. Each filled
// cell is painted a distinct gray level; the engine maps that level back to a
// record, alternating Hindi and English layouts.

use crate::models::GridSpec;
use crate::processing::engine::mock::ScriptedEngine;
use crate::processing::engine::{EngineConfig, Recognition};
use crate::processing::recognizer::FULL_TEXT_CONFIG;
use crate::processing::{GridSegmenter, ImageProcessor};
use crate::utils::ExtractionError;
use image::{GrayImage, Luma};

pub const PAGE_WIDTH: u32 = 300;
pub const PAGE_HEIGHT: u32 = 1000;
const FILL_BASE: u8 = 100;

/// A 10x3 page; `filled[i]` paints the i-th cell in row-major order.
pub fn synthetic_page(filled: &[bool]) -> GrayImage {
    let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255u8]));
    let layout = GridSegmenter::new(GridSpec::default())
        .unwrap()
        .layout(PAGE_WIDTH, PAGE_HEIGHT)
        .unwrap();

    for (index, (_, _, bounds)) in layout.iter().enumerate() {
        if !filled.get(index).copied().unwrap_or(false) {
            continue;
        }
        let shade = Luma([FILL_BASE + index as u8]);
        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                page.put_pixel(x, y, shade);
            }
        }
    }
    page
}

pub fn record_text(index: usize) -> String {
    if index % 2 == 0 {
        format!(
            "नाम : व्यक्ति {i}\nपिता का नाम : अभिभावक {i}\nमकान संख्या : {house}\nआयु : {age} लिंग : पुरुष",
            i = index,
            house = index + 1,
            age = 20 + index
        )
    } else {
        format!(
            "Name: Person {i}\nHusband's Name: Spouse {i}\nHouse No: {house}\nAge: {age} Gender: Female",
            i = index,
            house = index + 1,
            age = 20 + index
        )
    }
}

type Script = fn(&GrayImage, &str, &EngineConfig) -> Result<Recognition, ExtractionError>;

fn read_roll(image: &GrayImage, _languages: &str, config: &EngineConfig) -> Result<Recognition, ExtractionError> {
    if config.label == FULL_TEXT_CONFIG.label {
        let shade = ImageProcessor::min_intensity(image);
        if shade == 255 {
            return Ok(Recognition::default());
        }
        return Ok(Recognition::text(record_text(shade.saturating_sub(FILL_BASE) as usize)));
    }
    if config.label.starts_with("identifier") {
        return Ok(Recognition::text("ABC1234567"));
    }
    Ok(Recognition::default())
}

pub fn roll_engine() -> ScriptedEngine<Script> {
    ScriptedEngine::new(read_roll as Script)
}
