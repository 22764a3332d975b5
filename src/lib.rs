//! # mpop-pdf
//!
//! Renders a single mpop item record into a printable PDF sheet.
//!
//! The heart of the crate is a declarative grid layout: a list of cells,
//! each naming a record field, a page and a position on a `cols x rows`
//! grid. The renderer resolves each cell's value, wraps it to the cell and
//! draws it, silently dropping whatever does not fit. Layouts are plain
//! data, validated once, so they can live in JSON next to the code that
//! fetches records.
//!
//! ## Architecture
//!
//! ```text
//! Record + Sheet (JSON)
//!       ↓
//!   [model]     record, layout cells, validation
//!       ↓
//!   [style]     closed style table, fallback fonts
//!       ↓
//!   [layout]    grid geometry, word wrap, cell drawing, flow documents
//!       ↓
//!   [pdf]       serialize pages to PDF bytes
//! ```
//!
//! Two flowing (non-grid) documents are also provided: the item manual and
//! the per-page Braille transcript. See [`layout::flow`].

pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod output;
pub mod pdf;
pub mod style;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{LayoutError, RenderError};

use font::FontContext;
use image_loader::Assets;
use layout::flow::{braille_blocks, manual_blocks, FlowConfig, FlowRenderer};
use layout::grid::GridConfig;
use layout::{GridRenderer, LayoutPage};
use model::{LayoutDescription, Metadata, Record, Sheet};
use pdf::PdfWriter;
use style::StyleTable;

/// Lay out `record` with default furniture and no image assets.
///
/// This is the pure core: no I/O, no serialization. The result is one
/// [`LayoutPage`] per page number up to the highest one `layout` uses.
/// `grid` must be the grid `layout` was validated against; any other grid
/// could place cells off the page and is rejected.
pub fn render_record_to_pages(
    record: &Record,
    layout: &LayoutDescription,
    styles: &StyleTable,
    grid: &GridConfig,
    fonts: &FontContext,
) -> Result<Vec<LayoutPage>, LayoutError> {
    if grid != layout.grid() {
        return Err(LayoutError::InvalidGrid(
            "layout was validated against a different grid".to_string(),
        ));
    }
    Ok(GridRenderer::new(styles, fonts).render(record, layout))
}

/// Render `record` with a full sheet configuration to PDF bytes.
///
/// Fails only on layout, style and font embedding errors. Missing values,
/// fonts and assets degrade to placeholders.
pub fn render_sheet(
    record: &Record,
    sheet: &Sheet,
    fonts: &FontContext,
    assets: &Assets,
) -> Result<Vec<u8>, RenderError> {
    let layout = sheet.layout_description()?;
    let styles = StyleTable::resolve(&sheet.styles, fonts)?;

    let pages = GridRenderer::new(&styles, fonts)
        .with_assets(assets)
        .with_box_style(sheet.box_style)
        .with_footer(sheet.footer.clone())
        .show_grid(sheet.show_grid)
        .render(record, &layout);

    PdfWriter::new().write(&pages, &metadata_for(&sheet.metadata, record), fonts)
}

/// Render a JSON record with a JSON sheet, or the reference sheet when
/// `sheet_json` is `None`.
pub fn render_json(record_json: &str, sheet_json: Option<&str>) -> Result<Vec<u8>, RenderError> {
    render_json_with_assets(record_json, sheet_json, &Assets::new())
}

/// [`render_json`] with image assets for image cells.
pub fn render_json_with_assets(
    record_json: &str,
    sheet_json: Option<&str>,
    assets: &Assets,
) -> Result<Vec<u8>, RenderError> {
    let record = Record::from_json(record_json)?;
    let sheet = match sheet_json {
        Some(json) => Sheet::from_json(json)?,
        None => Sheet::reference(),
    };
    render_sheet(&record, &sheet, &FontContext::new(), assets)
}

/// Render the item manual: the centred title and the manual text on one
/// page, clipped at the bottom margin.
pub fn render_manual(record: &Record, fonts: &FontContext) -> Result<Vec<u8>, RenderError> {
    let config = FlowConfig::manual();
    let pages = FlowRenderer::new(&config, fonts).render(&manual_blocks(record));
    PdfWriter::new().write(&pages, &metadata_for(&Metadata::default(), record), fonts)
}

/// Render the Braille transcript of an item's child page rows.
pub fn render_braille_pages(
    item: &Record,
    pages: &[Record],
    fonts: &FontContext,
) -> Result<Vec<u8>, RenderError> {
    let config = FlowConfig::braille();
    let laid_out = FlowRenderer::new(&config, fonts).render(&braille_blocks(pages));
    PdfWriter::new().write(&laid_out, &metadata_for(&Metadata::default(), item), fonts)
}

/// Sheet metadata with the record's title filling in a missing title.
fn metadata_for(metadata: &Metadata, record: &Record) -> Metadata {
    let mut metadata = metadata.clone();
    if metadata.title.is_none() {
        metadata.title = record.text("title");
    }
    metadata
}
