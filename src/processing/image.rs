use crate::models::Region;
use crate::utils::ExtractionError;
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat};
use imageproc::contrast::{equalize_histogram, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{erode, open};
use std::path::Path;
use tempfile::NamedTempFile;

/// Preprocessing applied to a sub-region before it is handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessing {
    None,
    /// 3x upscale, Otsu
    Identifier,
    /// 4x upscale, light blur, Otsu
    HouseNumber,
    /// 3x upscale, Otsu
    Age,
    /// Equalize, 3x upscale, sharpen, thicken, Otsu. Recovers thin `1` strokes.
    OneSensitive,
    /// 2x upscale, Otsu, 2x2 opening
    SequenceLabel,
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn load_page(path: &Path) -> Result<GrayImage, ExtractionError> {
        let img = image::open(path)
            .map_err(|e| ExtractionError::DocumentLoad(format!("Failed to open {}: {}", path.display(), e)))?;
        Ok(img.to_luma8())
    }

    /// Crop a proportional region out of a cell.
    pub fn crop_region(img: &GrayImage, region: &Region) -> Result<GrayImage, ExtractionError> {
        let (x, y, w, h) = region.to_pixels(img.width(), img.height());
        if w == 0 || h == 0 {
            return Err(ExtractionError::DegenerateImage(format!(
                "region {:?} is empty in a {}x{} image",
                region,
                img.width(),
                img.height()
            )));
        }
        Ok(imageops::crop_imm(img, x, y, w, h).to_image())
    }

    pub fn prepare(img: &GrayImage, preprocessing: Preprocessing) -> GrayImage {
        match preprocessing {
            Preprocessing::None => img.clone(),
            Preprocessing::Identifier | Preprocessing::Age => Self::binarize(&Self::upscale(img, 3)),
            Preprocessing::HouseNumber => {
                let scaled = Self::upscale(img, 4);
                Self::binarize(&gaussian_blur_f32(&scaled, 0.8))
            }
            Preprocessing::OneSensitive => {
                let equalized = equalize_histogram(img);
                let scaled = Self::upscale(&equalized, 3);
                let sharpened = imageops::unsharpen(&scaled, 1.0, 2);
                Self::binarize(&Self::thicken_strokes(&sharpened))
            }
            Preprocessing::SequenceLabel => {
                let binary = Self::binarize(&Self::upscale(img, 2));
                open(&binary, Norm::LInf, 1)
            }
        }
    }

    pub fn upscale(img: &GrayImage, factor: u32) -> GrayImage {
        let (w, h) = img.dimensions();
        if factor <= 1 || w == 0 || h == 0 {
            return img.clone();
        }
        imageops::resize(img, w * factor, h * factor, FilterType::CatmullRom)
    }

    pub fn binarize(img: &GrayImage) -> GrayImage {
        let level = otsu_level(img);
        threshold(img, level)
    }

    // Text is dark on white, so eroding the white background widens the strokes.
    fn thicken_strokes(img: &GrayImage) -> GrayImage {
        erode(img, Norm::LInf, 1)
    }

    /// Darkest pixel value; 255 means the image is blank white.
    pub fn min_intensity(img: &GrayImage) -> u8 {
        img.pixels().map(|p| p[0]).min().unwrap_or(255)
    }

    /// Write the image to a temporary PNG for engines that read from disk.
    pub fn save_to_temp_file(img: &GrayImage) -> Result<NamedTempFile, ExtractionError> {
        let temp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
        img.save_with_format(temp_file.path(), ImageFormat::Png)?;
        Ok(temp_file)
    }
}
