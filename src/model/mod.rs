//! # Sheet Model
//!
//! The input side of the renderer: the record being printed, the layout
//! description that places its fields on the page grid, and the sheet
//! configuration that bundles layout, grid, styles and page furniture.
//!
//! Layout descriptions are plain data. They arrive as JSON (or are built in
//! Rust with the [`LayoutCell`] helpers) and are validated exactly once into
//! a [`LayoutDescription`]. Rendering only ever sees validated layouts.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LayoutError, RenderError};
use crate::layout::grid::GridConfig;
use crate::style::{BoxStyle, StyleConfig, StyleKey};

/// One database row, keyed by column name. Read-only during rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insert, handy for tests and programmatic records.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The displayable text of a field. `null` and absent fields are `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// The record's `id` column as text, if present.
    pub fn id(&self) -> Option<String> {
        self.text("id")
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Computes a cell's value from the whole record.
pub type Resolver = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

/// Where a cell's value comes from.
#[derive(Clone)]
pub enum ValueSource {
    /// Read a single field of the record.
    Field(String),
    /// Derive the value from the record with a function.
    Computed(Resolver),
}

impl ValueSource {
    pub fn field(name: &str) -> Self {
        ValueSource::Field(name.to_string())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<String> + Send + Sync + 'static,
    {
        ValueSource::Computed(Arc::new(f))
    }

    pub fn resolve(&self, record: &Record) -> Option<String> {
        match self {
            ValueSource::Field(name) => record.text(name),
            ValueSource::Computed(f) => f(record),
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ValueSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// How a cell renders its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    /// Optional label, then the wrapped value, clipped at the cell bottom.
    Text,
    /// A label with a single value line beneath it.
    LabelValue,
    /// The value names an image asset, drawn scaled to fit the cell.
    Image,
}

impl CellKind {
    fn parse(kind: &str) -> Option<CellKind> {
        match kind {
            "text" => Some(CellKind::Text),
            "labelValue" => Some(CellKind::LabelValue),
            "image" => Some(CellKind::Image),
            _ => None,
        }
    }
}

/// A validated cell of a layout description.
#[derive(Debug, Clone)]
pub struct LayoutCell {
    /// 1-based page number.
    pub page: u32,
    pub kind: CellKind,
    pub source: ValueSource,
    pub label: Option<String>,
    /// 1-based column of the top-left grid unit.
    pub col: u32,
    /// 1-based row of the top-left grid unit; row 1 is the top.
    pub row: u32,
    pub col_span: u32,
    pub row_span: u32,
    pub style: StyleKey,
    pub rounded: bool,
}

impl LayoutCell {
    fn new(page: u32, kind: CellKind, source: ValueSource, col: u32, row: u32) -> Self {
        Self {
            page,
            kind,
            source,
            label: None,
            col,
            row,
            col_span: 1,
            row_span: 1,
            style: StyleKey::Body,
            rounded: false,
        }
    }

    pub fn text(page: u32, field: &str, col: u32, row: u32) -> Self {
        Self::new(page, CellKind::Text, ValueSource::field(field), col, row)
    }

    pub fn label_value(page: u32, label: &str, field: &str, col: u32, row: u32) -> Self {
        Self::new(page, CellKind::LabelValue, ValueSource::field(field), col, row).label(label)
    }

    pub fn image(page: u32, field: &str, col: u32, row: u32) -> Self {
        Self::new(page, CellKind::Image, ValueSource::field(field), col, row)
    }

    pub fn computed<F>(page: u32, col: u32, row: u32, f: F) -> Self
    where
        F: Fn(&Record) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(page, CellKind::Text, ValueSource::computed(f), col, row)
    }

    pub fn span(mut self, col_span: u32, row_span: u32) -> Self {
        self.col_span = col_span;
        self.row_span = row_span;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn style(mut self, style: StyleKey) -> Self {
        self.style = style;
        self
    }

    pub fn rounded(mut self) -> Self {
        self.rounded = true;
        self
    }
}

/// A layout cell exactly as written in JSON, before validation.
///
/// Numbers are signed so that negative input is reported as an authoring
/// error rather than a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLayoutCell {
    pub page: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub col: i64,
    pub row: i64,
    #[serde(default = "default_span")]
    pub col_span: i64,
    #[serde(default = "default_span")]
    pub row_span: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub rounded: bool,
}

fn default_span() -> i64 {
    1
}

impl RawLayoutCell {
    /// Validate this cell against `grid`. `index` is its position in the layout.
    pub fn validate(&self, index: usize, grid: &GridConfig) -> Result<LayoutCell, LayoutError> {
        let kind = CellKind::parse(&self.kind).ok_or_else(|| LayoutError::UnknownKind {
            index,
            kind: self.kind.clone(),
        })?;
        let style = match &self.style {
            Some(key) => StyleKey::parse(key).ok_or_else(|| LayoutError::UnknownStyle {
                index,
                key: key.clone(),
            })?,
            None => StyleKey::Body,
        };
        check_placement(
            index,
            grid,
            [self.page, self.col, self.row, self.col_span, self.row_span],
        )?;

        Ok(LayoutCell {
            page: self.page as u32,
            kind,
            source: ValueSource::Field(self.field.clone()),
            label: self.label.clone(),
            col: self.col as u32,
            row: self.row as u32,
            col_span: self.col_span as u32,
            row_span: self.row_span as u32,
            style,
            rounded: self.rounded,
        })
    }
}

/// Highest page number a cell may name. Every page up to the highest one
/// used is rendered, so this also bounds the document length.
pub const MAX_PAGES: u32 = 1000;

/// Check page, position and span of one cell. Values are
/// `[page, col, row, col_span, row_span]`.
fn check_placement(index: usize, grid: &GridConfig, values: [i64; 5]) -> Result<(), LayoutError> {
    let [page, col, row, col_span, row_span] = values;
    let (cols, rows) = (grid.cols, grid.rows);

    if page < 1 || page > MAX_PAGES as i64 {
        return Err(LayoutError::InvalidPage { index, page });
    }
    if col < 1 || col > cols as i64 {
        return Err(LayoutError::ColumnOutOfRange { index, col, cols });
    }
    if row < 1 || row > rows as i64 {
        return Err(LayoutError::RowOutOfRange { index, row, rows });
    }
    if col_span < 1 || row_span < 1 {
        return Err(LayoutError::InvalidSpan {
            index,
            col_span,
            row_span,
        });
    }

    // Compared as remaining room so that huge spans cannot overflow.
    if col_span > cols as i64 - col + 1 {
        return Err(LayoutError::OverflowsColumns {
            index,
            col: col as u32,
            end: span_end(col, col_span),
            cols,
        });
    }
    if row_span > rows as i64 - row + 1 {
        return Err(LayoutError::OverflowsRows {
            index,
            row: row as u32,
            end: span_end(row, row_span),
            rows,
        });
    }
    Ok(())
}

/// Last unit covered by a span, saturated for reporting.
fn span_end(start: i64, span: i64) -> u32 {
    start
        .saturating_add(span - 1)
        .min(u32::MAX as i64) as u32
}

/// An ordered list of cells, all known to fit the grid they were
/// validated against. The grid is kept alongside the cells and is the one
/// the renderer draws on.
#[derive(Debug, Clone)]
pub struct LayoutDescription {
    cells: Vec<LayoutCell>,
    grid: GridConfig,
}

impl LayoutDescription {
    /// Validate typed cells against `grid`.
    pub fn new(cells: Vec<LayoutCell>, grid: &GridConfig) -> Result<Self, LayoutError> {
        grid.validate()?;
        if cells.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }
        for (index, cell) in cells.iter().enumerate() {
            check_placement(
                index,
                grid,
                [
                    cell.page as i64,
                    cell.col as i64,
                    cell.row as i64,
                    cell.col_span as i64,
                    cell.row_span as i64,
                ],
            )?;
        }
        Ok(Self { cells, grid: *grid })
    }

    /// Validate cells as read from JSON.
    pub fn from_raw(raw: &[RawLayoutCell], grid: &GridConfig) -> Result<Self, LayoutError> {
        grid.validate()?;
        if raw.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }
        let cells = raw
            .iter()
            .enumerate()
            .map(|(index, cell)| cell.validate(index, grid))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cells, grid: *grid })
    }

    pub fn cells(&self) -> &[LayoutCell] {
        &self.cells
    }

    /// The grid every cell was checked against.
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// The highest page number referenced by any cell.
    pub fn page_count(&self) -> u32 {
        self.cells.iter().map(|c| c.page).max().unwrap_or(0)
    }

    /// Cells assigned to `page`, in description order.
    pub fn cells_on_page(&self, page: u32) -> impl Iterator<Item = &LayoutCell> {
        self.cells.iter().filter(move |c| c.page == page)
    }
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// The "Page n of m" footer drawn on every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterConfig {
    pub enabled: bool,
    /// Text template; `{page}` and `{total}` are substituted.
    pub template: String,
    pub size: f64,
    pub color: crate::style::Color,
    /// Distance of the text start from the right margin.
    pub offset_x: f64,
    /// Distance of the baseline below the bottom margin.
    pub offset_y: f64,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            template: "Page {page} of {total}".to_string(),
            size: 8.0,
            color: crate::style::Color::grey(0.35),
            offset_x: 80.0,
            offset_y: 24.0,
        }
    }
}

impl FooterConfig {
    pub fn text(&self, page: u32, total: u32) -> String {
        self.template
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

/// Everything needed to render a record: grid, styles, furniture and the
/// layout itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sheet {
    pub metadata: Metadata,
    pub grid: GridConfig,
    pub styles: StyleConfig,
    pub box_style: BoxStyle,
    pub footer: FooterConfig,
    /// Outline every cell rectangle, for designing layouts.
    pub show_grid: bool,
    pub layout: Vec<RawLayoutCell>,
}

impl Sheet {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the sheet's layout against its grid.
    pub fn layout_description(&self) -> Result<LayoutDescription, LayoutError> {
        LayoutDescription::from_raw(&self.layout, &self.grid)
    }

    /// The three-page mpop item sheet on a 3x12 A4 grid.
    pub fn reference() -> Self {
        let cell = |page,
                    kind: &str,
                    label: Option<&str>,
                    field: &str,
                    place: [i64; 4],
                    style: Option<&str>| RawLayoutCell {
            page,
            kind: kind.to_string(),
            field: field.to_string(),
            label: label.map(str::to_string),
            col: place[0],
            row: place[1],
            col_span: place[2],
            row_span: place[3],
            style: style.map(str::to_string),
            rounded: true,
        };
        let text = |page, label: &str, field: &str, place: [i64; 4], style: &str| {
            cell(page, "text", Some(label), field, place, Some(style))
        };

        let layout = vec![
            cell(1, "text", None, "title", [1, 1, 3, 1], Some("h1")),
            cell(1, "labelValue", Some("Code"), "code", [1, 2, 1, 1], None),
            cell(1, "labelValue", Some("Status"), "status", [2, 2, 1, 1], None),
            cell(1, "labelValue", Some("Version"), "version", [3, 2, 1, 1], None),
            text(1, "Verhaal", "story_text", [1, 3, 3, 3], "body"),
            text(1, "Titel letters (Pagina 4)", "page_a_title_letters", [1, 6, 2, 1], "body"),
            text(1, "Titel braille (Pagina 4)", "page_a_title_braille", [3, 6, 1, 1], "braille"),
            text(1, "Tekst letters (Pagina 4)", "page_a_text", [1, 7, 2, 3], "body"),
            text(1, "Tekst braille (Pagina 4)", "page_a_text_braille", [3, 7, 1, 3], "braille"),
            text(1, "Opmerkingen", "remarks_1", [1, 10, 3, 3], "body"),
            text(2, "Object beschrijving", "beschrijving_object", [1, 1, 3, 3], "body"),
            text(2, "Klankzuiver", "klankzuiver_text", [1, 4, 3, 2], "body"),
            text(2, "Opdracht 1", "opdracht1_text", [1, 6, 2, 3], "body"),
            text(2, "Opdracht 2", "opdracht2_text", [3, 6, 1, 3], "body"),
            text(2, "Opmerkingen", "remarks_2", [1, 9, 3, 4], "body"),
            text(3, "Opdracht 3", "opdracht3_text", [1, 1, 2, 3], "body"),
            text(3, "Opdracht 4", "opdracht4_text", [3, 1, 1, 3], "body"),
            text(3, "Opdracht 5", "opdracht5_text", [1, 4, 2, 3], "body"),
            text(3, "Opdracht 6", "opdracht6_text", [3, 4, 1, 3], "body"),
            text(3, "Opmerkingen", "remarks_3", [1, 7, 3, 6], "body"),
        ];

        Self {
            layout,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridConfig {
        GridConfig::default()
    }

    #[test]
    fn test_record_text_conversions() {
        let record = Record::new()
            .with("s", "hello")
            .with("n", 42)
            .with("f", 1.5)
            .with("b", true)
            .with("z", Value::Null);
        assert_eq!(record.text("s").as_deref(), Some("hello"));
        assert_eq!(record.text("n").as_deref(), Some("42"));
        assert_eq!(record.text("f").as_deref(), Some("1.5"));
        assert_eq!(record.text("b").as_deref(), Some("true"));
        assert_eq!(record.text("z"), None);
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn test_value_source_variants() {
        let record = Record::new().with("first", "Ada").with("last", "Lovelace");
        assert_eq!(
            ValueSource::field("first").resolve(&record).as_deref(),
            Some("Ada")
        );
        let full =
            ValueSource::computed(|r| Some(format!("{} {}", r.text("first")?, r.text("last")?)));
        assert_eq!(full.resolve(&record).as_deref(), Some("Ada Lovelace"));
        assert_eq!(format!("{:?}", full), "Computed(..)");
    }

    #[test]
    fn test_raw_cell_json_defaults() {
        let raw: RawLayoutCell = serde_json::from_str(
            r#"{ "page": 1, "type": "labelValue", "label": "Code", "field": "code", "col": 2, "row": 3 }"#,
        )
        .unwrap();
        let cell = raw.validate(0, &grid()).unwrap();
        assert_eq!(cell.kind, CellKind::LabelValue);
        assert_eq!((cell.col_span, cell.row_span), (1, 1));
        assert_eq!(cell.style, StyleKey::Body);
        assert!(!cell.rounded);
    }

    #[test]
    fn test_unknown_style_names_index() {
        let mut raw = Sheet::reference().layout;
        raw[3].style = Some("h7".to_string());
        let err = LayoutDescription::from_raw(&raw, &grid()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownStyle {
                index: 3,
                key: "h7".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut raw = Sheet::reference().layout;
        raw[0].kind = "table".to_string();
        let err = LayoutDescription::from_raw(&raw, &grid()).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownKind { index: 0, .. }));
    }

    #[test]
    fn test_overflow_rejected_not_clamped() {
        let cells = vec![
            LayoutCell::text(1, "a", 1, 1),
            LayoutCell::text(1, "b", 2, 1).span(3, 1),
        ];
        let err = LayoutDescription::new(cells, &grid()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::OverflowsColumns {
                index: 1,
                col: 2,
                end: 4,
                cols: 3
            }
        );

        let cells = vec![LayoutCell::text(1, "a", 1, 10).span(1, 4)];
        let err = LayoutDescription::new(cells, &grid()).unwrap_err();
        assert!(matches!(err, LayoutError::OverflowsRows { index: 0, end: 13, .. }));
    }

    #[test]
    fn test_huge_spans_reported_as_overflow() {
        let raw: Vec<RawLayoutCell> = serde_json::from_str(
            r#"[{ "page": 1, "type": "text", "field": "a", "col": 2, "row": 1,
                  "colSpan": 9223372036854775807 }]"#,
        )
        .unwrap();
        assert_eq!(
            LayoutDescription::from_raw(&raw, &grid()).unwrap_err(),
            LayoutError::OverflowsColumns {
                index: 0,
                col: 2,
                end: u32::MAX,
                cols: 3
            }
        );

        let mut raw = raw;
        raw[0].col_span = 1;
        raw[0].row = 12;
        raw[0].row_span = i64::MAX;
        assert!(matches!(
            LayoutDescription::from_raw(&raw, &grid()).unwrap_err(),
            LayoutError::OverflowsRows { index: 0, row: 12, rows: 12, .. }
        ));
    }

    #[test]
    fn test_page_zero_rejected() {
        let cells = vec![LayoutCell::text(0, "a", 1, 1)];
        let err = LayoutDescription::new(cells, &grid()).unwrap_err();
        assert_eq!(err, LayoutError::InvalidPage { index: 0, page: 0 });
    }

    #[test]
    fn test_page_beyond_limit_rejected() {
        let ok = vec![LayoutCell::text(MAX_PAGES, "a", 1, 1)];
        assert_eq!(LayoutDescription::new(ok, &grid()).unwrap().page_count(), MAX_PAGES);

        let mut raw = Sheet::reference().layout;
        raw[4].page = u32::MAX as i64;
        assert_eq!(
            LayoutDescription::from_raw(&raw, &grid()).unwrap_err(),
            LayoutError::InvalidPage {
                index: 4,
                page: u32::MAX as i64
            }
        );
    }

    #[test]
    fn test_layout_keeps_its_grid() {
        let narrow = GridConfig {
            cols: 2,
            rows: 6,
            ..GridConfig::default()
        };
        let layout = LayoutDescription::new(vec![LayoutCell::text(1, "a", 2, 6)], &narrow).unwrap();
        assert_eq!(layout.grid(), &narrow);
    }

    #[test]
    fn test_negative_and_zero_values_rejected() {
        let mut raw = Sheet::reference().layout;
        raw[2].col = -1;
        assert!(matches!(
            LayoutDescription::from_raw(&raw, &grid()).unwrap_err(),
            LayoutError::ColumnOutOfRange { index: 2, col: -1, cols: 3 }
        ));

        let mut raw = Sheet::reference().layout;
        raw[5].row_span = 0;
        assert!(matches!(
            LayoutDescription::from_raw(&raw, &grid()).unwrap_err(),
            LayoutError::InvalidSpan { index: 5, .. }
        ));
    }

    #[test]
    fn test_empty_layout_rejected() {
        assert_eq!(
            LayoutDescription::new(vec![], &grid()).unwrap_err(),
            LayoutError::EmptyLayout
        );
    }

    #[test]
    fn test_reference_sheet_is_valid() {
        let layout = Sheet::reference().layout_description().unwrap();
        assert_eq!(layout.cells().len(), 20);
        assert_eq!(layout.page_count(), 3);
        assert_eq!(layout.cells_on_page(2).count(), 5);
        assert_eq!(layout.grid(), &GridConfig::default());
    }

    #[test]
    fn test_sheet_json_round_trip_keeps_layout() {
        let sheet = Sheet::reference();
        let json = serde_json::to_string(&sheet).unwrap();
        let back = Sheet::from_json(&json).unwrap();
        assert_eq!(back, sheet);
    }

    #[test]
    fn test_footer_template() {
        let footer = FooterConfig::default();
        assert_eq!(footer.text(2, 5), "Page 2 of 5");
    }
}
