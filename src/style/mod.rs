//! # Style Table
//!
//! A sheet has exactly four text styles: `h1`, `label`, `body` and
//! `braille`. Cells pick one by key. The table is closed on purpose: every
//! key a layout mentions is checked against [`StyleKey`] when the layout is
//! validated, so lookups at render time cannot miss.
//!
//! A style's font may be absent (the Braille font is optional). The
//! renderer substitutes [`StyleTable::fallback`] in that case.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::font::{FontContext, FontKey};

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A neutral grey with all three components set to `level`.
    pub fn grey(level: f64) -> Self {
        Self::rgb(level, level, level)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The closed set of style keys a layout cell may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKey {
    H1,
    Label,
    #[default]
    Body,
    Braille,
}

impl StyleKey {
    pub const ALL: [StyleKey; 4] = [
        StyleKey::H1,
        StyleKey::Label,
        StyleKey::Body,
        StyleKey::Braille,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKey::H1 => "h1",
            StyleKey::Label => "label",
            StyleKey::Body => "body",
            StyleKey::Braille => "braille",
        }
    }

    /// Parse a key as written in a layout description.
    pub fn parse(key: &str) -> Option<StyleKey> {
        StyleKey::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// A resolved text style: font, size and line advance.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// `None` when the font failed to load; the table's fallback is used.
    pub font: Option<FontKey>,
    pub size: f64,
    pub line_height: f64,
    pub color: Color,
    /// Corner radius for rounded boxes drawn behind cells of this style.
    pub box_radius: Option<f64>,
}

/// Configuration for one style entry, as written in a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    pub font_family: String,
    #[serde(default = "default_weight")]
    pub font_weight: u32,
    #[serde(default)]
    pub italic: bool,
    pub size: f64,
    pub line_height: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_radius: Option<f64>,
}

fn default_weight() -> u32 {
    400
}

impl StyleSpec {
    fn new(family: &str, weight: u32, size: f64, line_height: f64) -> Self {
        Self {
            font_family: family.to_string(),
            font_weight: weight,
            italic: false,
            size,
            line_height,
            color: Color::BLACK,
            box_radius: None,
        }
    }

    fn font_key(&self) -> FontKey {
        FontKey::new(&self.font_family, self.font_weight, self.italic)
    }
}

/// Font and size configuration for the four styles.
///
/// Defaults reproduce the reference grid sheet: bold 16pt titles, bold 8pt
/// labels, 10pt body text and a 22pt Braille face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    pub h1: StyleSpec,
    pub label: StyleSpec,
    pub body: StyleSpec,
    pub braille: StyleSpec,
    /// Font used whenever a style's own font is unavailable.
    pub fallback_family: String,
}

/// Family name the Braille style expects a custom font to be registered under.
pub const BRAILLE_FAMILY: &str = "NotoSansSymbols2";

impl Default for StyleConfig {
    fn default() -> Self {
        let mut h1 = StyleSpec::new("Helvetica", 700, 16.0, 18.0);
        h1.box_radius = Some(14.0);
        Self {
            h1,
            label: StyleSpec::new("Helvetica", 700, 8.0, 12.0),
            body: StyleSpec::new("Helvetica", 400, 10.0, 14.0),
            braille: StyleSpec::new(BRAILLE_FAMILY, 400, 22.0, 26.0),
            fallback_family: "Helvetica".to_string(),
        }
    }
}

impl StyleConfig {
    fn spec(&self, key: StyleKey) -> &StyleSpec {
        match key {
            StyleKey::H1 => &self.h1,
            StyleKey::Label => &self.label,
            StyleKey::Body => &self.body,
            StyleKey::Braille => &self.braille,
        }
    }

    /// Check that every style has a positive size and line height.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for key in StyleKey::ALL {
            let spec = self.spec(key);
            let invalid = |reason: String| {
                Err(LayoutError::InvalidStyle {
                    key: key.as_str(),
                    reason,
                })
            };
            if !spec.size.is_finite() || spec.size <= 0.0 {
                return invalid(format!("size must be positive, got {}", spec.size));
            }
            if !spec.line_height.is_finite() || spec.line_height <= 0.0 {
                return invalid(format!("lineHeight must be positive, got {}", spec.line_height));
            }
            if let Some(radius) = spec.box_radius.filter(|r| !r.is_finite() || *r < 0.0) {
                return invalid(format!("boxRadius must be non-negative, got {}", radius));
            }
        }
        Ok(())
    }
}

/// The resolved, closed style table handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    h1: TextStyle,
    label: TextStyle,
    body: TextStyle,
    braille: TextStyle,
    fallback: FontKey,
}

impl StyleTable {
    /// Resolve every style against the fonts actually available.
    ///
    /// A style whose family is neither a standard PDF font nor registered in
    /// `fonts` gets `font: None` and renders with the fallback. Sizes are
    /// validated first.
    pub fn resolve(config: &StyleConfig, fonts: &FontContext) -> Result<Self, LayoutError> {
        config.validate()?;
        let resolve_one = |key: StyleKey| {
            let spec = config.spec(key);
            let font_key = spec.font_key();
            let font = if fonts.has_font(&font_key) {
                Some(font_key)
            } else {
                tracing::warn!(
                    style = key.as_str(),
                    family = %spec.font_family,
                    "font unavailable, style will use the fallback font"
                );
                None
            };
            TextStyle {
                font,
                size: spec.size,
                line_height: spec.line_height,
                color: spec.color,
                box_radius: spec.box_radius,
            }
        };

        Ok(Self {
            h1: resolve_one(StyleKey::H1),
            label: resolve_one(StyleKey::Label),
            body: resolve_one(StyleKey::Body),
            braille: resolve_one(StyleKey::Braille),
            fallback: FontKey::new(&config.fallback_family, 400, false),
        })
    }

    pub fn get(&self, key: StyleKey) -> &TextStyle {
        match key {
            StyleKey::H1 => &self.h1,
            StyleKey::Label => &self.label,
            StyleKey::Body => &self.body,
            StyleKey::Braille => &self.braille,
        }
    }

    pub fn fallback(&self) -> &FontKey {
        &self.fallback
    }

    /// The font a style actually renders with.
    pub fn font_for(&self, key: StyleKey) -> &FontKey {
        self.get(key).font.as_ref().unwrap_or(&self.fallback)
    }
}

/// Decoration for cells with `rounded: true`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxStyle {
    pub radius: f64,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            radius: 12.0,
            fill: Color::WHITE,
            stroke: Color::grey(0.85),
            stroke_width: 1.0,
        }
    }
}
