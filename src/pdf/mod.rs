//! # PDF Serializer
//!
//! Takes laid-out pages and writes a PDF 1.7 file.
//!
//! Layout already happened, so this is a straight translation: every
//! [`LayoutElement`] becomes a few content-stream operators. Standard fonts
//! are referenced as Type1 with WinAnsiEncoding; custom TrueType fonts are
//! embedded as CIDFontType2 with Identity-H encoding and a ToUnicode CMap so
//! text stays extractable. JPEG images are embedded as-is with DCTDecode;
//! decoded PNG pixels are Flate-compressed, with alpha as a soft mask.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::RenderError;
use crate::font::{CustomFontMetrics, FontContext, FontData, FontKey};
use crate::image_loader::{ImageAsset, ImagePixelData};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::Metadata;
use crate::style::Color;

/// Bézier control point distance for a quarter circle of radius 1.
const KAPPA: f64 = 0.5522847498;

pub struct PdfWriter;

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font resources in `/F{index}` order.
    fonts: Vec<FontResource>,
    /// Image XObject ids in `/Im{index}` order.
    images: Vec<usize>,
    /// Maps an image's address to its index in `images`.
    image_index: HashMap<usize, usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

struct FontResource {
    key: FontKey,
    obj_id: usize,
    encoding: TextEncoding,
}

/// How text shown in a font is encoded in the content stream.
enum TextEncoding {
    /// Single-byte WinAnsi literal strings.
    WinAnsi,
    /// Two-byte glyph ids in hex strings.
    Identity(HashMap<char, u16>),
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let reserved = (0..3).map(|_| PdfObject { data: Vec::new() }).collect();
        Self {
            objects: reserved,
            fonts: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_extra: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} >>\nstream\n",
            payload.len(),
            dict_extra
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: &FontKey) -> usize {
        self.fonts.iter().position(|f| &f.key == key).unwrap_or(0)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        fonts: &FontContext,
    ) -> Result<Vec<u8>, RenderError> {
        let mut builder = PdfBuilder::new();

        self.register_fonts(&mut builder, pages, fonts)?;
        self.register_images(&mut builder, pages);

        let font_resources = self.build_font_resource_dict(&builder);
        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in pages {
            let (content, used_images) = self.build_content_stream(page, &builder, fonts);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.push_stream(" /Filter /FlateDecode", &compressed);

            let xobjects = if used_images.is_empty() {
                String::new()
            } else {
                let entries = used_images
                    .iter()
                    .map(|&idx| format!("/Im{} {} 0 R", idx, builder.images[idx]))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(" /XObject << {} >>", entries)
            };

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >>{} >> >>",
                page.width, page.height, content_obj_id, font_resources, xobjects
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.write_info(&mut builder, metadata);

        tracing::debug!(
            pages = pages.len(),
            fonts = builder.fonts.len(),
            images = builder.images.len(),
            objects = builder.objects.len() - 1,
            "serialized PDF"
        );
        Ok(self.serialize(&builder, info_obj_id))
    }

    fn write_info(&self, builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        if fields.iter().all(|(_, value)| value.is_none()) {
            return None;
        }

        let mut info = String::from("<< ");
        for (name, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} {} ", name, Self::pdf_text_string(value));
            }
        }
        let _ = write!(info, "/Producer (mpop-pdf {}) >>", env!("CARGO_PKG_VERSION"));
        Some(builder.push(info.into_bytes()))
    }

    /// Build the content stream for one page, returning it together with the
    /// image indices it references.
    fn build_content_stream(
        &self,
        page: &LayoutPage,
        builder: &PdfBuilder,
        fonts: &FontContext,
    ) -> (String, BTreeSet<usize>) {
        let mut stream = String::new();
        let mut used_images = BTreeSet::new();

        for element in &page.elements {
            self.write_element(&mut stream, element, builder, fonts, &mut used_images);
        }

        (stream, used_images)
    }

    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        builder: &PdfBuilder,
        fonts: &FontContext,
        used_images: &mut BTreeSet<usize>,
    ) {
        let (x, y, w, h) = (element.x, element.y, element.width, element.height);

        match &element.draw {
            DrawCommand::Rect {
                fill,
                stroke,
                stroke_width,
                radius,
            } => {
                if let Some(fill) = fill {
                    let _ = write!(stream, "q\n{}", fill_color(fill));
                    Self::write_rect_path(stream, x, y, w, h, *radius);
                    let _ = write!(stream, "f\nQ\n");
                }
                if let Some(stroke) = stroke.filter(|_| *stroke_width > 0.0) {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n",
                        stroke.r, stroke.g, stroke.b, stroke_width
                    );
                    Self::write_rect_path(stream, x, y, w, h, *radius);
                    let _ = write!(stream, "S\nQ\n");
                }
            }

            DrawCommand::Text {
                text,
                font,
                size,
                color,
            } => {
                let key = fonts.registry().canonical_key(font);
                let idx = builder.font_index(&key);
                let encoded = match builder.fonts.get(idx).map(|f| &f.encoding) {
                    Some(TextEncoding::Identity(map)) => Self::encode_glyph_ids(text, map),
                    _ => Self::encode_winansi(text),
                };
                let _ = write!(
                    stream,
                    "BT\n{}/F{} {:.1} Tf\n{:.2} {:.2} Td\n{} Tj\nET\n",
                    fill_color(color),
                    idx,
                    size,
                    x,
                    y,
                    encoded
                );
            }

            DrawCommand::Image { image } => {
                let Some(&idx) = builder.image_index.get(&image_key(image)) else {
                    return;
                };
                used_images.insert(idx);
                let _ = write!(
                    stream,
                    "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    w, h, x, y, idx
                );
            }
        }
    }

    fn write_rect_path(stream: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
        if radius > 0.0 {
            Self::write_rounded_rect(stream, x, y, w, h, radius);
        } else {
            let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", x, y, w, h);
        }
    }

    /// A closed rectangle path with four equal circular corners.
    fn write_rounded_rect(stream: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
        let r = radius.min(w / 2.0).min(h / 2.0);
        let c = r * (1.0 - KAPPA);

        let _ = writeln!(stream, "{:.2} {:.2} m", x + r, y);
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w - r, y);
        Self::write_curve(stream, (x + w - c, y), (x + w, y + c), (x + w, y + r));
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w, y + h - r);
        Self::write_curve(stream, (x + w, y + h - c), (x + w - c, y + h), (x + w - r, y + h));
        let _ = writeln!(stream, "{:.2} {:.2} l", x + r, y + h);
        Self::write_curve(stream, (x + c, y + h), (x, y + h - c), (x, y + h - r));
        let _ = writeln!(stream, "{:.2} {:.2} l", x, y + r);
        Self::write_curve(stream, (x, y + c), (x + c, y), (x + r, y));
        let _ = writeln!(stream, "h");
    }

    /// A cubic Bézier segment from the current point.
    fn write_curve(stream: &mut String, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) {
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            c1.0, c1.1, c2.0, c2.1, end.0, end.1
        );
    }

    /// Register one font resource per distinct font actually drawn.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        fonts: &FontContext,
    ) -> Result<(), RenderError> {
        // BTreeMap keeps resource numbering deterministic.
        let mut used: BTreeMap<(String, u32, bool), HashSet<char>> = BTreeMap::new();
        for element in pages.iter().flat_map(|p| &p.elements) {
            if let DrawCommand::Text { text, font, .. } = &element.draw {
                let key = fonts.registry().canonical_key(font);
                used.entry((key.family, key.weight, key.italic))
                    .or_default()
                    .extend(text.chars());
            }
        }

        for ((family, weight, italic), chars) in used {
            let key = FontKey::new(&family, weight, italic);
            let resource = match fonts.resolve(&key) {
                FontData::Standard(std_font) => {
                    let dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    FontResource {
                        obj_id: builder.push(dict.into_bytes()),
                        key,
                        encoding: TextEncoding::WinAnsi,
                    }
                }
                FontData::Custom { data, metrics } => {
                    let (obj_id, char_to_gid) =
                        Self::write_custom_font_objects(builder, &key, data, metrics, &chars)?;
                    FontResource {
                        key,
                        obj_id,
                        encoding: TextEncoding::Identity(char_to_gid),
                    }
                }
            };
            builder.fonts.push(resource);
        }
        Ok(())
    }

    /// Write the five objects of an embedded TrueType font and return the id
    /// of the Type0 root plus the glyph map used for encoding.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &FontKey,
        ttf_data: &[u8],
        metrics: &CustomFontMetrics,
        used_chars: &HashSet<char>,
    ) -> Result<(usize, HashMap<char, u16>), RenderError> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            RenderError::Font(format!("failed to parse font '{}' for embedding: {}", key.family, e))
        })?;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|&gid| (*ch, gid)))
            .collect();
        let missing = used_chars.len() - char_to_gid.len();
        if missing > 0 {
            tracing::warn!(family = %key.family, missing, "characters without glyphs in font");
        }

        let pdf_font_name = Self::sanitize_font_name(&key.family, key.weight, key.italic);
        let scale = 1000.0 / metrics.units_per_em as f64;

        // 1. FontFile2
        let compressed_ttf = compress_to_vec_zlib(ttf_data, 6);
        let fontfile2_id = builder.push_stream(
            &format!(" /Length1 {} /Filter /FlateDecode", ttf_data.len()),
            &compressed_ttf,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(metrics.ascender) as f64 * scale;
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            if key.italic { -12 } else { 0 },
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            cap_height as i32,
            if key.weight >= 700 { 120 } else { 80 },
            fontfile2_id,
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        // 3. CIDFont
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            pdf_font_name,
            descriptor_id,
            (metrics.default_advance as f64 * scale) as u32,
            Self::build_w_array(&char_to_gid, metrics),
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        // 4. ToUnicode
        let cmap = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap.as_bytes(), 6);
        let tounicode_id = builder.push_stream(" /Filter /FlateDecode", &compressed_cmap);

        // 5. Type0 root
        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0.into_bytes());

        Ok((type0_id, char_to_gid))
    }

    /// `/W` entries `gid [width]`, sorted by glyph id, in 1/1000 em.
    fn build_w_array(char_to_gid: &HashMap<char, u16>, metrics: &CustomFontMetrics) -> String {
        let scale = 1000.0 / metrics.units_per_em as f64;
        let widths: BTreeMap<u16, u32> = char_to_gid
            .iter()
            .map(|(ch, &gid)| {
                let advance = metrics
                    .advance_widths
                    .get(ch)
                    .copied()
                    .unwrap_or(metrics.default_advance);
                (gid, (advance as f64 * scale) as u32)
            })
            .collect();

        let mut result = String::from("[");
        for (gid, width) in &widths {
            let _ = write!(result, " {} [{}]", gid, width);
        }
        result.push_str(" ]");
        result
    }

    /// ToUnicode CMap mapping glyph ids back to characters.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, char)> =
            char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
        gid_to_unicode.sort();
        gid_to_unicode.dedup_by_key(|(gid, _)| *gid);

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // At most 100 entries per bfchar block.
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, ch) in chunk {
                let mut units = [0u16; 2];
                let hex: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for element in pages.iter().flat_map(|p| &p.elements) {
            let DrawCommand::Image { image } = &element.draw else {
                continue;
            };
            let key = image_key(image);
            if builder.image_index.contains_key(&key) {
                continue;
            }
            let obj_id = match &image.pixel_data {
                ImagePixelData::Jpeg { data, color_space } => builder.push_stream(
                    &format!(
                        " /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /{} /BitsPerComponent 8 /Filter /DCTDecode",
                        image.width_px,
                        image.height_px,
                        color_space.pdf_name()
                    ),
                    data,
                ),
                ImagePixelData::Decoded { rgb, alpha } => {
                    // The soft mask is its own grayscale image, written first.
                    let smask_ref = alpha
                        .as_ref()
                        .map(|alpha| {
                            let smask_id = builder.push_stream(
                                &format!(
                                    " /Type /XObject /Subtype /Image /Width {} /Height {} \
                                     /ColorSpace /DeviceGray /BitsPerComponent 8 \
                                     /Filter /FlateDecode",
                                    image.width_px, image.height_px
                                ),
                                &compress_to_vec_zlib(alpha, 6),
                            );
                            format!(" /SMask {} 0 R", smask_id)
                        })
                        .unwrap_or_default();
                    builder.push_stream(
                        &format!(
                            " /Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceRGB /BitsPerComponent 8 \
                             /Filter /FlateDecode{}",
                            image.width_px, image.height_px, smask_ref
                        ),
                        &compress_to_vec_zlib(rgb, 6),
                    )
                }
            };
            builder.image_index.insert(key, builder.images.len());
            builder.images.push(obj_id);
        }
    }

    fn build_font_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .fonts
            .iter()
            .enumerate()
            .map(|(i, font)| format!("/F{} {} 0 R", i, font.obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Sanitize a font name for use as a PDF name object.
    fn sanitize_font_name(family: &str, weight: u32, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }
        name
    }

    /// Escape special characters in a PDF literal string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// An Info dictionary string: literal when ASCII, UTF-16BE hex otherwise.
    fn pdf_text_string(s: &str) -> String {
        if s.is_ascii() {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }

    /// Encode text for a standard font. Unmappable characters become `?`.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('(');
        for ch in text.chars() {
            match Self::unicode_to_winansi(ch).unwrap_or(b'?') {
                b @ (b'(' | b')' | b'\\') => {
                    out.push('\\');
                    out.push(b as char);
                }
                b @ 0x20..=0x7E => out.push(b as char),
                b => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out.push(')');
        out
    }

    /// Encode text for an embedded font as big-endian glyph ids.
    fn encode_glyph_ids(text: &str, char_to_gid: &HashMap<char, u16>) -> String {
        let mut out = String::with_capacity(text.len() * 4 + 2);
        out.push('<');
        for ch in text.chars() {
            let _ = write!(out, "{:04X}", char_to_gid.get(&ch).copied().unwrap_or(0));
        }
        out.push('>');
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        // Windows-1252 specials in 0x80..=0x9F
        match cp {
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95),
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

fn fill_color(color: &Color) -> String {
    format!("{:.3} {:.3} {:.3} rg\n", color.r, color.g, color.b)
}

fn image_key(image: &Arc<ImageAsset>) -> usize {
    Arc::as_ptr(image) as usize
}
