//! Whitespace cleanup of text cells.

use crate::models::{Cell, Dataset};

/// Strip leading and trailing whitespace from every text cell.
///
/// Numbers, dates and empty cells are left as they are.
pub fn trim_text_cells(dataset: &mut Dataset) {
    dataset.map_cells(|cell| {
        if let Cell::Text(s) = cell {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    });
}
