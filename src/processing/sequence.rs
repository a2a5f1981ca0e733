use crate::models::config::SequenceSpec;
use crate::models::{FieldRecord, GridSpec, SequencedEntry};

/// Document-wide numbering of cells. Pure: depends only on the cell's
/// coordinates, never on the order in which pages finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceAssigner {
    first_content_page: u32,
    cells_per_page: u32,
    cols: u32,
    offset: i64,
}

impl SequenceAssigner {
    pub fn new(grid: &GridSpec, spec: &SequenceSpec) -> Self {
        SequenceAssigner {
            first_content_page: spec.first_content_page,
            cells_per_page: grid.cells_per_page(),
            cols: grid.cols,
            offset: spec.offset,
        }
    }

    /// `page` is the 1-based page number; `row` and `col` are 1-based.
    pub fn sequence(&self, page: u32, row: u32, col: u32) -> i64 {
        let page_delta = page as i64 - self.first_content_page as i64;
        page_delta * self.cells_per_page as i64
            + (row as i64 - 1) * self.cols as i64
            + (col as i64 - 1)
            - self.offset
    }

    pub fn assign(
        &self,
        document_tag: &str,
        page: u32,
        row: u32,
        col: u32,
        sequence_ocr: String,
        record: FieldRecord,
    ) -> SequencedEntry {
        SequencedEntry {
            sequence: self.sequence(page, row, col),
            sequence_ocr,
            page,
            row,
            col,
            document_tag: document_tag.to_string(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigner(offset: i64) -> SequenceAssigner {
        SequenceAssigner::new(&GridSpec::default(), &SequenceSpec { first_content_page: 3, offset })
    }

    #[test]
    fn test_sequence_formula() {
        let a = assigner(0);
        assert_eq!(a.sequence(3, 1, 1), 0);
        assert_eq!(a.sequence(3, 2, 2), 4);
        assert_eq!(a.sequence(3, 10, 3), 29);
        assert_eq!(a.sequence(4, 1, 1), 30);
        // pages before the first content page go negative
        assert_eq!(a.sequence(2, 1, 1), -30);
        assert_eq!(assigner(5).sequence(3, 1, 1), -5);
    }

    #[test]
    fn test_sequence_is_pure_and_strictly_increasing() {
        let a = assigner(7);
        let mut previous = None;
        for page in 1..=6 {
            for row in 1..=10 {
                for col in 1..=3 {
                    let s = a.sequence(page, row, col);
                    assert_eq!(s, a.sequence(page, row, col));
                    if let Some(p) = previous {
                        assert!(s > p);
                    }
                    previous = Some(s);
                }
            }
        }
    }

    #[test]
    fn test_assign_keeps_coordinates() {
        let entry = assigner(0).assign("doc", 5, 3, 2, "67".to_string(), FieldRecord::default());
        assert_eq!(entry.sequence, 2 * 30 + 2 * 3 + 1);
        assert_eq!((entry.page, entry.row, entry.col), (5, 3, 2));
        assert_eq!(entry.sequence_ocr, "67");
        assert_eq!(entry.document_tag, "doc");
    }
}
