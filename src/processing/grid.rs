use crate::models::{Cell, CellBounds, GridSpec};
use crate::utils::ExtractionError;
use image::{imageops, GrayImage};

/// Slices a page into the fixed record grid, row-major.
#[derive(Debug, Clone)]
pub struct GridSegmenter {
    spec: GridSpec,
}

impl GridSegmenter {
    pub fn new(spec: GridSpec) -> Result<Self, ExtractionError> {
        spec.validate()?;
        Ok(GridSegmenter { spec })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Cell rectangles for a page of the given size, without touching pixels.
    pub fn layout(&self, width: u32, height: u32) -> Result<Vec<(u32, u32, CellBounds)>, ExtractionError> {
        if width == 0 || height == 0 {
            return Err(ExtractionError::DegenerateImage(format!(
                "page has zero size ({}x{})",
                width, height
            )));
        }

        let top = (height as f64 * self.spec.top_margin).floor() as u32;
        let bottom = (height as f64 * self.spec.bottom_margin).floor() as u32;
        let side = (width as f64 * self.spec.side_margin).floor() as u32;

        let usable_h = height.saturating_sub(top + bottom);
        let usable_w = width.saturating_sub(side * 2);
        let cell_h = usable_h / self.spec.rows;
        let cell_w = usable_w / self.spec.cols;

        if cell_h == 0 || cell_w == 0 {
            return Err(ExtractionError::DegenerateImage(format!(
                "page {}x{} too small for a {}x{} grid",
                width, height, self.spec.rows, self.spec.cols
            )));
        }

        let mut cells = Vec::with_capacity(self.spec.cells_per_page() as usize);
        for row in 0..self.spec.rows {
            for col in 0..self.spec.cols {
                let bounds = CellBounds {
                    x: side + col * cell_w,
                    y: top + row * cell_h,
                    width: cell_w,
                    height: cell_h,
                };
                cells.push((row + 1, col + 1, bounds));
            }
        }
        Ok(cells)
    }

    pub fn segment(&self, page: &GrayImage) -> Result<Vec<Cell>, ExtractionError> {
        let cells = self
            .layout(page.width(), page.height())?
            .into_iter()
            .map(|(row, col, bounds)| Cell {
                row,
                col,
                bounds,
                image: imageops::crop_imm(page, bounds.x, bounds.y, bounds.width, bounds.height)
                    .to_image(),
            })
            .collect();
        Ok(cells)
    }
}
