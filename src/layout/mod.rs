//! # Grid Layout Renderer
//!
//! Turns a record and a validated [`LayoutDescription`] into a sequence of
//! [`LayoutPage`]s: flat lists of positioned drawing primitives that the
//! PDF writer serializes without further layout decisions.
//!
//! Pages are numbered `1..=max` where `max` is the highest page any cell
//! names. Every page gets its furniture first (footer, debug outlines),
//! then its cells in description order, so later cells overlay earlier ones.
//!
//! Coordinates are PDF points with the origin at the bottom-left. Text
//! elements are positioned at their baseline.

pub mod flow;
pub mod grid;

use std::sync::Arc;

use crate::font::{FontContext, FontKey};
use crate::image_loader::{Assets, ImageAsset};
use crate::model::{CellKind, FooterConfig, LayoutCell, LayoutDescription, Record};
use crate::style::{BoxStyle, Color, StyleKey, StyleTable};
use crate::text::wrap_to_width;
use grid::{CellRect, GridConfig};

/// Vertical distance from a label's baseline to its value's baseline.
pub const LABEL_VALUE_GAP: f64 = 18.0;

/// Placeholder drawn for a label/value cell without a value.
pub const MISSING_VALUE: &str = "-";

const DEBUG_GRID_COLOR: Color = Color {
    r: 0.9,
    g: 0.2,
    b: 0.2,
};
const DEBUG_GRID_WIDTH: f64 = 0.7;

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    /// 1-based page number.
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn new(number: u32, width: f64, height: f64) -> Self {
        Self {
            number,
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// The text of every text element, in drawing order.
    pub fn text_runs(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|el| match &el.draw {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        fonts: &FontContext,
        text: &str,
        x: f64,
        y: f64,
        font: &FontKey,
        size: f64,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        self.elements.push(LayoutElement {
            x,
            y,
            width: fonts.measure_string(text, font, size),
            height: size,
            draw: DrawCommand::Text {
                text: text.to_string(),
                font: font.clone(),
                size,
                color,
            },
        });
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Bottom-left corner; for text, the start of the baseline.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A single run of text on one baseline.
    Text {
        text: String,
        font: FontKey,
        size: f64,
        color: Color,
    },
    /// A rectangle, optionally filled, stroked and rounded.
    Rect {
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
        radius: f64,
    },
    /// An image stretched to the element's bounds.
    Image { image: Arc<ImageAsset> },
}

/// Draws records onto grid pages.
///
/// Holds only shared references, so one renderer can serve many records,
/// and several renderers can run in parallel. The grid comes from each
/// [`LayoutDescription`], so cells are always drawn on the grid they were
/// validated against.
pub struct GridRenderer<'a> {
    styles: &'a StyleTable,
    fonts: &'a FontContext,
    assets: Option<&'a Assets>,
    box_style: BoxStyle,
    footer: FooterConfig,
    show_grid: bool,
}

impl<'a> GridRenderer<'a> {
    pub fn new(styles: &'a StyleTable, fonts: &'a FontContext) -> Self {
        Self {
            styles,
            fonts,
            assets: None,
            box_style: BoxStyle::default(),
            footer: FooterConfig::default(),
            show_grid: false,
        }
    }

    pub fn with_assets(mut self, assets: &'a Assets) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn with_box_style(mut self, box_style: BoxStyle) -> Self {
        self.box_style = box_style;
        self
    }

    pub fn with_footer(mut self, footer: FooterConfig) -> Self {
        self.footer = footer;
        self
    }

    pub fn show_grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    /// Lay out every cell of `layout` for `record`.
    pub fn render(&self, record: &Record, layout: &LayoutDescription) -> Vec<LayoutPage> {
        let grid = layout.grid();
        let total = layout.page_count();
        let pages: Vec<LayoutPage> = (1..=total)
            .map(|number| {
                let mut page = LayoutPage::new(number, grid.page_width, grid.page_height);
                self.draw_footer(grid, &mut page, total);
                for cell in layout.cells_on_page(number) {
                    self.draw_cell(grid, &mut page, cell, record);
                }
                page
            })
            .collect();

        tracing::debug!(
            pages = pages.len(),
            cells = layout.cells().len(),
            "rendered grid layout"
        );
        pages
    }

    fn draw_footer(&self, grid: &GridConfig, page: &mut LayoutPage, total: u32) {
        if !self.footer.enabled {
            return;
        }
        let text = self.footer.text(page.number, total);
        let x = grid.page_width - grid.margin - self.footer.offset_x;
        let y = grid.margin - self.footer.offset_y;
        page.push_text(
            self.fonts,
            &text,
            x,
            y,
            self.styles.fallback(),
            self.footer.size,
            self.footer.color,
        );
    }

    fn draw_cell(
        &self,
        grid: &GridConfig,
        page: &mut LayoutPage,
        cell: &LayoutCell,
        record: &Record,
    ) {
        let rect = grid.rect(cell.col, cell.row, cell.col_span, cell.row_span);
        let pad = grid.padding;

        if self.show_grid {
            push_rect(page, &rect, None, Some(DEBUG_GRID_COLOR), DEBUG_GRID_WIDTH, 0.0);
        }

        if cell.rounded {
            let radius = self
                .styles
                .get(cell.style)
                .box_radius
                .unwrap_or(self.box_style.radius);
            push_rect(
                page,
                &rect,
                Some(self.box_style.fill),
                Some(self.box_style.stroke),
                self.box_style.stroke_width,
                radius,
            );
        }

        let value = cell.source.resolve(record);
        match cell.kind {
            CellKind::LabelValue => self.draw_label_value(page, &rect, pad, cell, value),
            CellKind::Text => self.draw_text_block(page, &rect, pad, cell, value),
            CellKind::Image => self.draw_image(page, &rect, pad, cell, value),
        }
    }

    /// Baseline of a label drawn at the top of `rect`.
    fn label_baseline(&self, rect: &CellRect, pad: f64) -> f64 {
        rect.top() - pad - self.styles.get(StyleKey::Label).size
    }

    fn draw_label(&self, page: &mut LayoutPage, rect: &CellRect, pad: f64, label: &str) {
        let style = self.styles.get(StyleKey::Label);
        page.push_text(
            self.fonts,
            label,
            rect.x + pad,
            self.label_baseline(rect, pad),
            self.styles.font_for(StyleKey::Label),
            style.size,
            style.color,
        );
    }

    fn draw_label_value(
        &self,
        page: &mut LayoutPage,
        rect: &CellRect,
        pad: f64,
        cell: &LayoutCell,
        value: Option<String>,
    ) {
        self.draw_label(page, rect, pad, cell.label.as_deref().unwrap_or_default());

        let body = self.styles.get(StyleKey::Body);
        let value = value.unwrap_or_else(|| MISSING_VALUE.to_string());
        page.push_text(
            self.fonts,
            &value,
            rect.x + pad,
            self.label_baseline(rect, pad) - LABEL_VALUE_GAP,
            self.styles.font_for(StyleKey::Body),
            body.size,
            body.color,
        );
    }

    fn draw_text_block(
        &self,
        page: &mut LayoutPage,
        rect: &CellRect,
        pad: f64,
        cell: &LayoutCell,
        value: Option<String>,
    ) {
        let mut y = rect.top() - pad;

        if let Some(label) = cell.label.as_deref().filter(|l| !l.is_empty()) {
            self.draw_label(page, rect, pad, label);
            y -= self.styles.get(StyleKey::Label).line_height;
        }

        let style = self.styles.get(cell.style);
        let font = self.styles.font_for(cell.style);
        let lines = wrap_to_width(
            &self.fonts.handle(font),
            style.size,
            value.as_deref().unwrap_or_default(),
            rect.width - 2.0 * pad,
        );

        let floor = rect.y + pad;
        for line in &lines {
            let baseline = y - style.size;
            if baseline < floor {
                break;
            }
            page.push_text(self.fonts, line, rect.x + pad, baseline, font, style.size, style.color);
            y -= style.line_height;
        }
    }

    fn draw_image(
        &self,
        page: &mut LayoutPage,
        rect: &CellRect,
        pad: f64,
        cell: &LayoutCell,
        key: Option<String>,
    ) {
        let image = key
            .as_deref()
            .and_then(|k| self.assets.and_then(|assets| assets.get(k)));

        let Some(image) = image else {
            tracing::debug!(asset = ?key, "image asset absent, drawing fallback text");
            let fallback = cell.label.as_deref().or(key.as_deref()).unwrap_or_default();
            let body = self.styles.get(StyleKey::Body);
            page.push_text(
                self.fonts,
                fallback,
                rect.x + pad,
                rect.top() - pad - body.size,
                self.styles.font_for(StyleKey::Body),
                body.size,
                body.color,
            );
            return;
        };

        let (inner_w, inner_h) = (rect.width - 2.0 * pad, rect.height - 2.0 * pad);
        let ratio = image.aspect_ratio();
        let width = inner_w.min(inner_h * ratio);
        let height = width / ratio;

        page.elements.push(LayoutElement {
            x: rect.x + pad + (inner_w - width) / 2.0,
            y: rect.y + pad + (inner_h - height) / 2.0,
            width,
            height,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
        });
    }
}

fn push_rect(
    page: &mut LayoutPage,
    rect: &CellRect,
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: f64,
    radius: f64,
) {
    page.elements.push(LayoutElement {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        draw: DrawCommand::Rect {
            fill,
            stroke,
            stroke_width,
            radius,
        },
    });
}
