use crate::models::{MaskLayout, Region};
use image::{GrayImage, Luma};

const WHITE: Luma<u8> = Luma([255u8]);

/// Blanks the serial-number box, the photo box and the border strip of a cell.
#[derive(Debug, Clone)]
pub struct CellSanitizer {
    layout: MaskLayout,
}

impl CellSanitizer {
    pub fn new(layout: MaskLayout) -> Self {
        CellSanitizer { layout }
    }

    /// Returns a masked copy; the input is left untouched.
    pub fn sanitize(&self, cell: &GrayImage) -> GrayImage {
        let mut masked = cell.clone();
        let (width, height) = masked.dimensions();
        if width == 0 || height == 0 {
            return masked;
        }

        Self::fill_region(&mut masked, &self.layout.serial_box);
        Self::fill_region(&mut masked, &self.layout.photo_box);

        let strip = (width.min(height) as f64 * self.layout.border_fraction).floor() as u32;
        if strip > 0 {
            for (x, y, pixel) in masked.enumerate_pixels_mut() {
                if x < strip || y < strip || x >= width.saturating_sub(strip) || y >= height.saturating_sub(strip) {
                    *pixel = WHITE;
                }
            }
        }
        masked
    }

    fn fill_region(image: &mut GrayImage, region: &Region) {
        let (x, y, w, h) = region.to_pixels(image.width(), image.height());
        for py in y..y + h {
            for px in x..x + w {
                image.put_pixel(px, py, WHITE);
            }
        }
    }
}
