//! Structured error types for the sheet renderer.
//!
//! Authoring mistakes in a layout description are [`LayoutError`]s and are
//! reported once, at validation time. Everything that can go wrong while
//! turning input into bytes is a [`RenderError`].

use thiserror::Error;

/// A layout description that cannot be rendered as written.
///
/// Every cell-level variant carries the zero-based index of the offending
/// cell in the description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("layout has no cells")]
    EmptyLayout,

    #[error("cell {index}: page must be a positive integer, got {page}")]
    InvalidPage { index: usize, page: i64 },

    #[error("cell {index}: column {col} is outside 1..={cols}")]
    ColumnOutOfRange { index: usize, col: i64, cols: u32 },

    #[error("cell {index}: row {row} is outside 1..={rows}")]
    RowOutOfRange { index: usize, row: i64, rows: u32 },

    #[error("cell {index}: span {col_span}x{row_span} must be at least 1x1")]
    InvalidSpan {
        index: usize,
        col_span: i64,
        row_span: i64,
    },

    #[error("cell {index}: columns {col}..{end} overflow a {cols}-column grid")]
    OverflowsColumns {
        index: usize,
        col: u32,
        end: u32,
        cols: u32,
    },

    #[error("cell {index}: rows {row}..{end} overflow a {rows}-row grid")]
    OverflowsRows {
        index: usize,
        row: u32,
        end: u32,
        rows: u32,
    },

    #[error("cell {index}: unknown style \"{key}\" (expected h1, label, body or braille)")]
    UnknownStyle { index: usize, key: String },

    #[error("cell {index}: unknown cell type \"{kind}\" (expected text, labelValue or image)")]
    UnknownKind { index: usize, kind: String },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("style \"{key}\": {reason}")]
    InvalidStyle { key: &'static str, reason: String },
}

/// The unified error type returned by the public rendering API.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON input failed to parse.
    #[error("failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The layout description or grid failed validation.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A font could not be parsed or embedded.
    #[error("font error: {0}")]
    Font(String),

    /// An image asset could not be read.
    #[error("image error: {0}")]
    Image(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        RenderError::Parse { source: e, hint }
    }
}
