//! # Font Management
//!
//! Fonts are looked up by family + weight + italic. The standard PDF fonts
//! the sheets use (Helvetica and Courier, regular and bold) are always
//! present and need no embedding. Custom TrueType fonts, such as the Braille
//! face, are registered at runtime and measured with ttf-parser.
//!
//! Text measurement is exposed through [`MeasureText`], which is the only
//! thing the line breaker needs from a font.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::error::RenderError;

/// Width measurement for a single resolved font.
pub trait MeasureText {
    /// Width of `text` in points when set at `size`.
    fn width_of_text_at_size(&self, text: &str, size: f64) -> f64;
}

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight,
            italic,
        }
    }

    /// The same key with its weight snapped to 400 or 700.
    pub fn snapped(&self) -> Self {
        Self {
            family: self.family.clone(),
            weight: if self.weight >= 600 { 700 } else { 400 },
            italic: self.italic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType/OpenType font that needs to be embedded.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self, ttf_parser::FaceParsingError> {
        let face = ttf_parser::Face::parse(data, 0)?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                glyph_ids.insert(ch, glyph_id.0);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

/// The standard PDF fonts available without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = [
            (("Helvetica", 400), StandardFont::Helvetica),
            (("Helvetica", 700), StandardFont::HelveticaBold),
            (("Courier", 400), StandardFont::Courier),
            (("Courier", 700), StandardFont::CourierBold),
        ];

        for ((family, weight), font) in standard_mappings {
            fonts.insert(FontKey::new(family, weight, false), FontData::Standard(font));
        }

        Self { fonts }
    }

    /// Exact or weight-snapped lookup, without any family fallback.
    pub fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&key.snapped()))
    }

    /// The key a lookup for `key` actually lands on: the key itself, its
    /// weight-snapped form, or Helvetica at the snapped weight.
    pub fn canonical_key(&self, key: &FontKey) -> FontKey {
        if self.fonts.contains_key(key) {
            return key.clone();
        }
        let snapped = key.snapped();
        if self.fonts.contains_key(&snapped) {
            return snapped;
        }
        FontKey::new("Helvetica", snapped.weight, false)
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, key: &FontKey) -> &FontData {
        if let Some(font) = self.get(key) {
            return font;
        }
        let weight = key.snapped().weight;
        self.fonts
            .get(&FontKey::new("Helvetica", weight, false))
            .unwrap_or_else(|| &self.fonts[&FontKey::new("Helvetica", 400, false)])
    }

    /// Register a custom font. The data must parse as TrueType/OpenType.
    pub fn register(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), RenderError> {
        let metrics = CustomFontMetrics::from_font_data(&data).map_err(|e| {
            RenderError::Font(format!("failed to parse font '{}': {}", family, e))
        })?;
        self.fonts.insert(
            FontKey::new(family, weight, italic),
            FontData::Custom { data, metrics },
        );
        Ok(())
    }
}

/// Shared font context used by layout and PDF serialization.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Register a custom TrueType font under `family`.
    pub fn register_font(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), RenderError> {
        self.registry.register(family, weight, italic, data)?;
        tracing::debug!(family, weight, italic, "registered custom font");
        Ok(())
    }

    /// Whether `key` names a font that is actually available.
    pub fn has_font(&self, key: &FontKey) -> bool {
        self.registry.get(key).is_some()
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        match self.registry.resolve(key) {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font_size, 0.0),
            FontData::Custom { metrics, .. } => {
                text.chars().map(|ch| metrics.char_width(ch, font_size)).sum()
            }
        }
    }

    /// A measuring handle for one font.
    pub fn handle<'a>(&'a self, key: &'a FontKey) -> FontHandle<'a> {
        FontHandle { context: self, key }
    }

    /// Resolve a font key to its font data.
    pub fn resolve(&self, key: &FontKey) -> &FontData {
        self.registry.resolve(key)
    }

    /// Access the underlying font registry.
    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }
}

/// A font resolved within a [`FontContext`], usable for measurement.
#[derive(Clone, Copy)]
pub struct FontHandle<'a> {
    context: &'a FontContext,
    key: &'a FontKey,
}

impl MeasureText for FontHandle<'_> {
    fn width_of_text_at_size(&self, text: &str, size: f64) -> f64 {
        self.context.measure_string(text, self.key, size)
    }
}
