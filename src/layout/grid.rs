//! # Page Grid
//!
//! Partitions the printable area of a page into `cols x rows` equal cells
//! separated by gutters. Row 1 is the top row. All coordinates are PDF
//! points with the origin at the bottom-left of the page.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Page size, margin and grid constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub cols: u32,
    pub rows: u32,
    pub gutter_x: f64,
    pub gutter_y: f64,
    /// Inset between a cell's edge and its content.
    pub padding: f64,
}

impl Default for GridConfig {
    /// A4 portrait, 48pt margins, 3 columns by 12 rows.
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 48.0,
            cols: 3,
            rows: 12,
            gutter_x: 12.0,
            gutter_y: 10.0,
            padding: 10.0,
        }
    }
}

/// A cell's rectangle. `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CellRect {
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

impl GridConfig {
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }

    pub fn cell_width(&self) -> f64 {
        (self.content_width() - (self.cols as f64 - 1.0) * self.gutter_x) / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        (self.content_height() - (self.rows as f64 - 1.0) * self.gutter_y) / self.rows as f64
    }

    /// Rectangle covering `col_span x row_span` units anchored at the
    /// 1-based `(col, row)`, extending right and down.
    pub fn rect(&self, col: u32, row: u32, col_span: u32, row_span: u32) -> CellRect {
        let (cell_w, cell_h) = (self.cell_width(), self.cell_height());
        let c0 = col.saturating_sub(1) as f64;
        let r0 = row.saturating_sub(1) as f64;

        let x = self.margin + c0 * (cell_w + self.gutter_x);
        let top = self.page_height - self.margin - r0 * (cell_h + self.gutter_y);

        let width = col_span as f64 * cell_w + (col_span as f64 - 1.0) * self.gutter_x;
        let height = row_span as f64 * cell_h + (row_span as f64 - 1.0) * self.gutter_y;

        CellRect {
            x,
            y: top - height,
            width,
            height,
        }
    }

    /// Check that the constants describe a usable grid.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let invalid = |msg: String| Err(LayoutError::InvalidGrid(msg));

        let finite = [
            self.page_width,
            self.page_height,
            self.margin,
            self.gutter_x,
            self.gutter_y,
            self.padding,
        ];
        if finite.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("dimensions must be finite and non-negative".to_string());
        }
        if self.cols == 0 || self.rows == 0 {
            return invalid(format!(
                "grid must have at least one column and row, got {}x{}",
                self.cols, self.rows
            ));
        }
        if self.cell_width() <= 2.0 * self.padding {
            return invalid(format!(
                "cell width {:.2}pt leaves no room inside {}pt padding",
                self.cell_width(),
                self.padding
            ));
        }
        if self.cell_height() <= 2.0 * self.padding {
            return invalid(format!(
                "cell height {:.2}pt leaves no room inside {}pt padding",
                self.cell_height(),
                self.padding
            ));
        }
        Ok(())
    }
}
