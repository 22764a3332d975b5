//! Integration tests for the mpop-pdf rendering pipeline.
//!
//! These tests exercise the full path from record and sheet JSON to PDF
//! bytes. They verify:
//! - the reference sheet renders three structurally valid pages
//! - layout validation errors name the offending cell
//! - pages without cells are still emitted
//! - missing values and assets degrade to placeholders
//! - JPEG and PNG assets are embedded
//! - the manual and Braille documents paginate as expected

use base64::Engine;
use mpop_pdf::font::FontContext;
use mpop_pdf::image_loader::{Assets, ImageAsset};
use mpop_pdf::layout::grid::GridConfig;
use mpop_pdf::layout::{DrawCommand, LayoutPage};
use mpop_pdf::model::{LayoutCell, LayoutDescription, Record, Sheet};
use mpop_pdf::output::{manual_filename, sheet_filename};
use mpop_pdf::style::{StyleConfig, StyleKey, StyleTable};
use mpop_pdf::{LayoutError, RenderError};
use pretty_assertions::assert_eq;

// ─── Helpers ────────────────────────────────────────────────────

fn sample_record() -> Record {
    Record::new()
        .with("id", 17)
        .with("title", "De kleine kat")
        .with("code", "KAT-01")
        .with("status", "concept")
        .with("version", 3)
        .with(
            "story_text",
            "Er was eens een kleine kat die elke ochtend op de vensterbank zat \
             en naar de vogels in de tuin keek.",
        )
        .with("page_a_title_letters", "kat")
        .with("page_a_title_braille", "⠅⠁⠞")
        .with("opdracht1_text", "Voel aan de staart.")
}

fn layout_pages(record: &Record, cells: Vec<LayoutCell>) -> Vec<LayoutPage> {
    let grid = GridConfig::default();
    let fonts = FontContext::new();
    let styles = StyleTable::resolve(&StyleConfig::default(), &fonts).unwrap();
    let layout = LayoutDescription::new(cells, &grid).expect("layout should validate");
    mpop_pdf::render_record_to_pages(record, &layout, &styles, &grid, &fonts)
        .expect("grid matches the layout")
}

fn texts(page: &LayoutPage) -> Vec<&str> {
    page.text_runs().collect()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

fn page_object_count(bytes: &[u8]) -> usize {
    String::from_utf8_lossy(bytes)
        .matches("/Type /Page /Parent")
        .count()
}

fn tiny_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 60, 30]));
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgb8)
        .unwrap();
    buf
}

fn tiny_png_data_uri(width: u32, height: u32) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 200]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf)
    )
}

// ─── Reference Sheet ────────────────────────────────────────────

#[test]
fn test_reference_sheet_renders_three_pages() {
    let record_json = serde_json::to_string(&sample_record()).unwrap();
    let bytes = mpop_pdf::render_json(&record_json, None).unwrap();

    assert_valid_pdf(&bytes);
    assert_eq!(page_object_count(&bytes), 3);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 3"));
    assert!(text.contains("/Title (De kleine kat)"));
    assert!(text.contains("/MediaBox [0 0 595.00 842.00]"));
}

#[test]
fn test_reference_sheet_empty_record_still_renders() {
    let bytes = mpop_pdf::render_json("{}", None).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(page_object_count(&bytes), 3);
}

#[test]
fn test_reference_layout_draws_values_and_placeholders() {
    let sheet = Sheet::reference();
    let layout = sheet.layout_description().unwrap();
    let fonts = FontContext::new();
    let styles = StyleTable::resolve(&sheet.styles, &fonts).unwrap();
    let record = sample_record().with("status", serde_json::Value::Null);

    let pages = mpop_pdf::render_record_to_pages(&record, &layout, &styles, &sheet.grid, &fonts)
        .unwrap();
    assert_eq!(pages.len(), 3);

    let first = texts(&pages[0]);
    assert!(first.contains(&"De kleine kat"));
    assert!(first.contains(&"Code"));
    assert!(first.contains(&"KAT-01"));
    // Null status renders as the placeholder.
    assert!(first.contains(&"Status"));
    assert!(first.contains(&"-"));
    assert!(first.contains(&"3"));
    assert!(first.contains(&"Page 1 of 3"));

    assert!(texts(&pages[1]).contains(&"Voel aan de staart."));
    assert!(texts(&pages[2]).contains(&"Page 3 of 3"));
}

// ─── Grid Layout ────────────────────────────────────────────────

#[test]
fn test_gap_pages_are_emitted() {
    let pages = layout_pages(
        &sample_record(),
        vec![
            LayoutCell::text(1, "title", 1, 1),
            LayoutCell::text(5, "code", 1, 1),
        ],
    );
    assert_eq!(pages.len(), 5);
    let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    // Pages 2-4 carry only the footer.
    for page in &pages[1..4] {
        assert_eq!(page.elements.len(), 1);
    }
    assert_eq!(texts(&pages[2]), vec!["Page 3 of 5"]);
    assert!(texts(&pages[4]).contains(&"KAT-01"));
}

#[test]
fn test_cell_content_stays_inside_cell() {
    let long = "woord ".repeat(400);
    let record = Record::new().with("story", long.trim());
    let pages = layout_pages(&record, vec![LayoutCell::text(1, "story", 1, 3).span(1, 2)]);

    let grid = GridConfig::default();
    let rect = grid.rect(1, 3, 1, 2);
    let body: Vec<_> = pages[0]
        .elements
        .iter()
        .filter(|el| {
            matches!(&el.draw, DrawCommand::Text { text, .. } if text.starts_with("woord"))
        })
        .collect();

    assert!(!body.is_empty());
    for el in &body {
        assert!(el.x >= rect.x);
        assert!(el.x + el.width <= rect.right() + 1e-6);
        assert!(el.y >= rect.y);
        assert!(el.y + el.height <= rect.top() + 1e-6);
    }
    // The text is far longer than the cell, so lines were dropped.
    let drawn_words: usize = body
        .iter()
        .map(|el| match &el.draw {
            DrawCommand::Text { text, .. } => text.split_whitespace().count(),
            _ => 0,
        })
        .sum();
    assert!(drawn_words < 400);
}

#[test]
fn test_computed_cell_combines_fields() {
    let cell = LayoutCell::computed(1, 1, 1, |record: &Record| {
        Some(format!("{} / {}", record.text("code")?, record.text("version")?))
    })
    .span(3, 1)
    .style(StyleKey::H1);

    let pages = layout_pages(&sample_record(), vec![cell]);
    assert!(texts(&pages[0]).contains(&"KAT-01 / 3"));
}

#[test]
fn test_later_cells_draw_over_earlier_ones() {
    let pages = layout_pages(
        &sample_record(),
        vec![
            LayoutCell::text(1, "title", 1, 1).span(3, 2).rounded(),
            LayoutCell::text(1, "code", 2, 2).rounded(),
        ],
    );
    let order = texts(&pages[0]);
    let title = order.iter().position(|t| *t == "De kleine kat").unwrap();
    let code = order.iter().position(|t| *t == "KAT-01").unwrap();
    assert!(title < code);
}

// ─── Validation ─────────────────────────────────────────────────

#[test]
fn test_validation_error_names_cell_index() {
    let sheet_json = r#"{
        "layout": [
            { "page": 1, "type": "text", "field": "title", "col": 1, "row": 1, "colSpan": 3 },
            { "page": 1, "type": "text", "field": "code", "col": 3, "row": 2, "colSpan": 2 }
        ]
    }"#;
    let err = mpop_pdf::render_json("{}", Some(sheet_json)).unwrap_err();
    match err {
        RenderError::Layout(LayoutError::OverflowsColumns { index, col, end, cols }) => {
            assert_eq!((index, col, end, cols), (1, 3, 4, 3));
        }
        other => panic!("expected OverflowsColumns, got {other:?}"),
    }
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = [
        (r#"{ "page": 0, "type": "text", "field": "a", "col": 1, "row": 1 }"#, "page"),
        (r#"{ "page": 1, "type": "text", "field": "a", "col": 0, "row": 1 }"#, "column"),
        (r#"{ "page": 1, "type": "text", "field": "a", "col": 1, "row": 13 }"#, "row"),
        (r#"{ "page": 1, "type": "text", "field": "a", "col": 1, "row": 1, "rowSpan": 0 }"#, "span"),
        (r#"{ "page": 1, "type": "text", "field": "a", "col": 1, "row": 1, "style": "h9" }"#, "style"),
        (r#"{ "page": 1, "type": "chart", "field": "a", "col": 1, "row": 1 }"#, "cell type"),
    ];
    for (cell, needle) in cases {
        let sheet = format!(r#"{{ "layout": [{}] }}"#, cell);
        let msg = mpop_pdf::render_json("{}", Some(&sheet))
            .unwrap_err()
            .to_string();
        assert!(msg.starts_with("cell 0:"), "got: {msg}");
        assert!(msg.contains(needle), "expected '{needle}' in: {msg}");
    }
}

#[test]
fn test_huge_span_is_a_validation_error() {
    let sheet = r#"{ "layout": [
        { "page": 1, "type": "text", "field": "a", "col": 2, "row": 1, "colSpan": 9223372036854775807 }
    ] }"#;
    let err = mpop_pdf::render_json("{}", Some(sheet)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Layout(LayoutError::OverflowsColumns { index: 0, col: 2, cols: 3, .. })
    ));
}

#[test]
fn test_page_number_is_bounded() {
    let sheet = r#"{ "layout": [
        { "page": 4294967295, "type": "text", "field": "a", "col": 1, "row": 1 }
    ] }"#;
    let err = mpop_pdf::render_json("{}", Some(sheet)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Layout(LayoutError::InvalidPage { index: 0, page: 4294967295 })
    ));
}

#[test]
fn test_negative_line_height_is_rejected() {
    let sheet = r#"{
        "styles": { "body": { "fontFamily": "Helvetica", "size": 10, "lineHeight": -14 } },
        "layout": [{ "page": 1, "type": "text", "field": "a", "col": 1, "row": 1 }]
    }"#;
    let err = mpop_pdf::render_json(r#"{ "a": "een\ntwee" }"#, Some(sheet)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Layout(LayoutError::InvalidStyle { key: "body", .. })
    ));
}

#[test]
fn test_layout_cannot_render_on_another_grid() {
    let grid = GridConfig::default();
    let small = GridConfig {
        cols: 2,
        rows: 6,
        ..GridConfig::default()
    };
    let fonts = FontContext::new();
    let styles = StyleTable::resolve(&StyleConfig::default(), &fonts).unwrap();
    let layout = LayoutDescription::new(vec![LayoutCell::text(1, "title", 3, 12)], &grid).unwrap();

    let err = mpop_pdf::render_record_to_pages(&sample_record(), &layout, &styles, &small, &fonts)
        .unwrap_err();
    assert!(matches!(err, LayoutError::InvalidGrid(_)));

    let pages = mpop_pdf::render_record_to_pages(&sample_record(), &layout, &styles, &grid, &fonts)
        .unwrap();
    let corner = grid.rect(3, 12, 1, 1);
    let title = pages[0]
        .elements
        .iter()
        .find(|el| matches!(&el.draw, DrawCommand::Text { text, .. } if text == "De kleine kat"))
        .expect("title drawn in the corner cell");
    assert!(title.x >= corner.x && title.y >= corner.y);
}

#[test]
fn test_empty_layout_is_rejected() {
    let err = mpop_pdf::render_json("{}", Some(r#"{ "layout": [] }"#)).unwrap_err();
    assert!(matches!(err, RenderError::Layout(LayoutError::EmptyLayout)));
}

#[test]
fn test_malformed_record_json_carries_hint() {
    let err = mpop_pdf::render_json("{\"id\": 1,}", None).unwrap_err();
    assert!(matches!(err, RenderError::Parse { .. }));
    assert!(err.to_string().contains("Hint:"));
}

// ─── Custom Sheets ──────────────────────────────────────────────

#[test]
fn test_custom_sheet_from_json() {
    let sheet_json = r#"{
        "metadata": { "title": "Werkblad", "author": "Team MPOP" },
        "grid": { "cols": 2, "rows": 4 },
        "footer": { "enabled": false },
        "showGrid": true,
        "layout": [
            { "page": 1, "type": "labelValue", "label": "Code", "field": "code", "col": 1, "row": 1 },
            { "page": 2, "type": "text", "field": "story_text", "col": 1, "row": 1, "colSpan": 2, "rowSpan": 4, "rounded": true }
        ]
    }"#;
    let sheet = Sheet::from_json(sheet_json).unwrap();
    assert_eq!(sheet.grid.cols, 2);
    assert_eq!(sheet.grid.margin, 48.0);

    let bytes =
        mpop_pdf::render_sheet(&sample_record(), &sheet, &FontContext::new(), &Assets::new())
            .unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(page_object_count(&bytes), 2);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Title (Werkblad)"));
    assert!(text.contains("/Author (Team MPOP)"));
}

#[test]
fn test_image_cell_embeds_asset() {
    let sheet_json = r#"{
        "layout": [
            { "page": 1, "type": "image", "field": "photo_url", "col": 1, "row": 1, "rowSpan": 4 }
        ]
    }"#;
    let sheet = Sheet::from_json(sheet_json).unwrap();
    let record = Record::new().with("photo_url", "https://cdn.example/kat.jpg");

    let mut assets = Assets::new();
    assets.insert(
        "https://cdn.example/kat.jpg",
        ImageAsset::from_bytes(tiny_jpeg(40, 30)).unwrap(),
    );

    let bytes = mpop_pdf::render_sheet(&record, &sheet, &FontContext::new(), &assets).unwrap();
    assert_valid_pdf(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Subtype /Image"));
    assert!(text.contains("/Filter /DCTDecode"));
}

#[test]
fn test_png_data_uri_asset_embeds_with_soft_mask() {
    let sheet = r#"{ "layout": [
        { "page": 1, "type": "image", "field": "qr", "col": 3, "row": 11, "rowSpan": 2 }
    ] }"#;
    let uri = tiny_png_data_uri(12, 12);
    let assets = Assets::from_sources([("qr-17", uri.as_str()), ("broken", "%%%")]);
    assert_eq!(assets.len(), 1);

    let bytes =
        mpop_pdf::render_json_with_assets(r#"{ "qr": "qr-17" }"#, Some(sheet), &assets).unwrap();
    assert_valid_pdf(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Width 12 /Height 12 /ColorSpace /DeviceRGB"));
    assert!(text.contains("/SMask "));
    assert!(!text.contains("/DCTDecode"));
}

#[test]
fn test_missing_image_asset_falls_back_to_text() {
    let cells = vec![LayoutCell::image(1, "photo_url", 1, 1).label("Foto")];
    let record = Record::new().with("photo_url", "https://cdn.example/kat.jpg");
    let pages = layout_pages(&record, cells);

    assert!(texts(&pages[0]).contains(&"Foto"));
    assert!(!pages[0]
        .elements
        .iter()
        .any(|el| matches!(el.draw, DrawCommand::Image { .. })));
}

// ─── Flow Documents ─────────────────────────────────────────────

#[test]
fn test_manual_renders_single_page() {
    let record =
        sample_record().with("handleiding_text", "Lees eerst het verhaal voor. ".repeat(500));
    let bytes = mpop_pdf::render_manual(&record, &FontContext::new()).unwrap();
    assert_valid_pdf(&bytes);
    // Overflowing manual text is clipped, never paginated.
    assert_eq!(page_object_count(&bytes), 1);
}

#[test]
fn test_braille_transcript_one_page_per_row() {
    let rows = vec![
        Record::new()
            .with("page_no", 2)
            .with("title_letters", "hond")
            .with("text", "De hond blaft."),
        Record::new()
            .with("page_no", 1)
            .with("title_letters", "kat")
            .with("text", "De kat miauwt.")
            .with("remarks", "Extra reliëf."),
    ];
    let bytes =
        mpop_pdf::render_braille_pages(&sample_record(), &rows, &FontContext::new()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(page_object_count(&bytes), 2);
    assert!(String::from_utf8_lossy(&bytes).contains("/BaseFont /Courier"));
}

#[test]
fn test_braille_transcript_without_rows_is_one_blank_page() {
    let bytes = mpop_pdf::render_braille_pages(&sample_record(), &[], &FontContext::new()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(page_object_count(&bytes), 1);
}

// ─── Output Names ───────────────────────────────────────────────

#[test]
fn test_download_filenames() {
    let record = sample_record();
    assert_eq!(sheet_filename(&record), "mpop-17.pdf");
    assert_eq!(manual_filename(&record), "mpop-manual-De-kleine-kat.pdf");
    assert_eq!(manual_filename(&Record::new()), "mpop-manual-MPOP-item.pdf");
}
