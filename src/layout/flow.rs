//! # Flow Layout
//!
//! Sequential, top-down text layout for documents that do not use the page
//! grid: the item manual and the per-page Braille transcript. Blocks are
//! placed one after another from a configured top baseline; what happens at
//! the bottom margin depends on the [`OverflowPolicy`].

use crate::font::{FontContext, FontKey};
use crate::model::Record;
use crate::output::manual_title;
use crate::style::Color;
use crate::text::wrap_to_width;

use super::LayoutPage;

/// What to do when the cursor reaches the bottom margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Continue on a fresh page.
    Paginate,
    /// Drop everything that no longer fits on the current page.
    Clip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One unit of flowing content.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowBlock {
    /// A single line drawn at the cursor, followed by `space_after`.
    Heading {
        text: String,
        size: f64,
        font: FontKey,
        align: Align,
        space_after: f64,
    },
    /// Wrapped text, one line per line height. Blank lines are kept.
    Paragraph {
        text: String,
        size: f64,
        font: FontKey,
    },
    /// Move the cursor down without drawing.
    Spacer(f64),
    /// Start a new page.
    PageBreak,
    /// Right-aligned at the top margin of the current page.
    PageNumber(String),
}

/// Page geometry and line metrics for a flow document.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    /// Baseline of the first line on each page.
    pub top: f64,
    pub line_height: f64,
    pub overflow: OverflowPolicy,
    pub page_number_font: FontKey,
    pub page_number_size: f64,
}

impl FlowConfig {
    /// The item manual: one A4 page, text past the bottom margin is dropped.
    pub fn manual() -> Self {
        Self {
            top: 800.0,
            overflow: OverflowPolicy::Clip,
            ..Self::braille()
        }
    }

    /// The Braille transcript: Courier, paginating as needed.
    pub fn braille() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 48.0,
            top: 842.0 - 48.0,
            line_height: 14.0,
            overflow: OverflowPolicy::Paginate,
            page_number_font: FontKey::new("Courier", 700, false),
            page_number_size: 10.0,
        }
    }
}

/// Lays out [`FlowBlock`]s onto pages.
pub struct FlowRenderer<'a> {
    config: &'a FlowConfig,
    fonts: &'a FontContext,
}

struct Cursor {
    pages: Vec<LayoutPage>,
    y: f64,
    clipped: bool,
}

impl<'a> FlowRenderer<'a> {
    pub fn new(config: &'a FlowConfig, fonts: &'a FontContext) -> Self {
        Self { config, fonts }
    }

    /// Lay out `blocks`. Always yields at least one page.
    pub fn render(&self, blocks: &[FlowBlock]) -> Vec<LayoutPage> {
        let mut cursor = Cursor {
            pages: Vec::new(),
            y: self.config.top,
            clipped: false,
        };
        self.new_page(&mut cursor);

        for block in blocks {
            match block {
                FlowBlock::Heading {
                    text,
                    size,
                    font,
                    align,
                    space_after,
                } => {
                    if self.make_room(&mut cursor) {
                        let x = match align {
                            Align::Left => self.config.margin,
                            Align::Center => {
                                let width = self.fonts.measure_string(text, font, *size);
                                (self.config.page_width - width) / 2.0
                            }
                        };
                        self.push_text(&mut cursor, text, x, font, *size);
                    }
                    cursor.y -= size + space_after;
                }
                FlowBlock::Paragraph { text, size, font } => {
                    let max_width = self.config.page_width - 2.0 * self.config.margin;
                    let lines = wrap_to_width(&self.fonts.handle(font), *size, text, max_width);
                    for line in &lines {
                        if self.make_room(&mut cursor) {
                            self.push_text(&mut cursor, line, self.config.margin, font, *size);
                        }
                        cursor.y -= self.config.line_height;
                    }
                }
                FlowBlock::Spacer(amount) => cursor.y -= amount,
                FlowBlock::PageBreak => self.new_page(&mut cursor),
                FlowBlock::PageNumber(text) => {
                    let font = &self.config.page_number_font;
                    let size = self.config.page_number_size;
                    let width = self.fonts.measure_string(text, font, size);
                    let x = self.config.page_width - self.config.margin - width;
                    let y = self.config.page_height - self.config.margin;
                    if let Some(page) = cursor.pages.last_mut() {
                        page.push_text(self.fonts, text, x, y, font, size, Color::BLACK);
                    }
                }
            }
        }

        tracing::debug!(
            pages = cursor.pages.len(),
            blocks = blocks.len(),
            "rendered flow layout"
        );
        cursor.pages
    }

    fn new_page(&self, cursor: &mut Cursor) {
        let number = cursor.pages.len() as u32 + 1;
        cursor
            .pages
            .push(LayoutPage::new(number, self.config.page_width, self.config.page_height));
        cursor.y = self.config.top;
        cursor.clipped = false;
    }

    /// Whether a line may be drawn at the cursor, starting a new page first
    /// when paginating.
    fn make_room(&self, cursor: &mut Cursor) -> bool {
        match self.config.overflow {
            OverflowPolicy::Paginate => {
                if cursor.y - self.config.line_height < self.config.margin {
                    self.new_page(cursor);
                }
                true
            }
            OverflowPolicy::Clip => {
                if cursor.y < self.config.margin {
                    cursor.clipped = true;
                }
                !cursor.clipped
            }
        }
    }

    fn push_text(&self, cursor: &mut Cursor, text: &str, x: f64, font: &FontKey, size: f64) {
        let y = cursor.y;
        if let Some(page) = cursor.pages.last_mut() {
            page.push_text(self.fonts, text, x, y, font, size, Color::BLACK);
        }
    }
}

/// Title centred at 24pt, then the manual text at 12pt.
pub fn manual_blocks(record: &Record) -> Vec<FlowBlock> {
    let helvetica = FontKey::new("Helvetica", 400, false);
    let title = manual_title(record);
    // Older rows spell the column without the second "n".
    let body = record
        .text("handleiding_text")
        .or_else(|| record.text("handleidig_text"))
        .unwrap_or_default();

    vec![
        FlowBlock::Heading {
            text: title,
            size: 24.0,
            font: helvetica.clone(),
            align: Align::Center,
            space_after: 16.0,
        },
        FlowBlock::Paragraph {
            text: body,
            size: 12.0,
            font: helvetica,
        },
    ]
}

/// One section per child page row: page number, title, text and remarks.
///
/// Rows are ordered by `page_no`; rows without one keep their relative
/// order after the numbered ones.
pub fn braille_blocks(pages: &[Record]) -> Vec<FlowBlock> {
    let courier = FontKey::new("Courier", 400, false);
    let mut ordered: Vec<&Record> = pages.iter().collect();
    ordered.sort_by_key(|p| page_number(p).unwrap_or(i64::MAX));

    let mut blocks = Vec::new();
    for (i, page) in ordered.into_iter().enumerate() {
        if i > 0 {
            blocks.push(FlowBlock::PageBreak);
        }
        let number = page_number(page).map(|n| n.to_string()).unwrap_or_default();
        blocks.push(FlowBlock::PageNumber(number));

        for field in ["title_letters", "text", "remarks"] {
            blocks.push(FlowBlock::Paragraph {
                text: page.text(field).unwrap_or_default(),
                size: 10.0,
                font: courier.clone(),
            });
            blocks.push(FlowBlock::Spacer(4.0));
        }
    }
    blocks
}

fn page_number(page: &Record) -> Option<i64> {
    let value = page.get("page_no")?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
