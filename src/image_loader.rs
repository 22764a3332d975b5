//! # Image Assets
//!
//! Images are supplied by the caller, already fetched. They are loaded from
//! file paths, data URIs, or raw base64 strings.
//!
//! Two formats are accepted. JPEG bytes pass through to the PDF untouched
//! (DCTDecode): only the dimensions are read, never the pixels. PNG is
//! decoded to raw RGB plus an optional alpha channel, which the PDF writer
//! Flate-compresses and attaches as a soft mask. Logos and QR codes are
//! usually PNG.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::RenderError;

/// An image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel payload of an image, in the form the PDF writer embeds it.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded 8-bit RGB, three bytes per pixel, plus an optional 8-bit
    /// alpha channel. `alpha` is `None` when every pixel is opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
    DeviceCMYK,
}

impl JpegColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            JpegColorSpace::DeviceRGB => "DeviceRGB",
            JpegColorSpace::DeviceGray => "DeviceGray",
            JpegColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

impl ImageAsset {
    /// Detect the format from the magic bytes and load accordingly.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RenderError> {
        if data.len() < 4 {
            return Err(RenderError::Image("image data too short".to_string()));
        }
        let image = if is_jpeg(&data) {
            decode_jpeg(data)?
        } else if is_png(&data) {
            decode_png(&data)?
        } else {
            return Err(RenderError::Image(
                "unsupported image format (expected JPEG or PNG)".to_string(),
            ));
        };

        if image.width_px == 0 || image.height_px == 0 {
            return Err(RenderError::Image(format!(
                "image has empty dimensions {}x{}",
                image.width_px, image.height_px
            )));
        }
        Ok(image)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }
}

/// Load an image from a source string.
///
/// Supported `src` formats:
/// - `data:image/jpeg;base64,...` and `data:image/png;base64,...` data URIs
/// - file paths starting with `/`, `./` or `../`
/// - raw base64-encoded JPEG or PNG data
pub fn load_image(src: &str) -> Result<ImageAsset, RenderError> {
    let bytes = read_source_bytes(src)?;
    ImageAsset::from_bytes(bytes)
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, RenderError> {
    if src.starts_with("data:image/") {
        let comma = src
            .find(',')
            .ok_or_else(|| RenderError::Image("invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma + 1..]);
    }

    // Base64 may contain '/', so only explicit path prefixes count as paths.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src).map_err(|e| {
                RenderError::Image(format!("failed to read image file '{}': {}", src, e))
            });
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(RenderError::Image(format!(
                "file path images are not supported in WASM: '{}'",
                src
            )));
        }
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, RenderError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| RenderError::Image(format!("base64 decode error: {}", e)))
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

/// JPEG: read dimensions without decoding pixels.
fn decode_jpeg(data: Vec<u8>) -> Result<ImageAsset, RenderError> {
    let reader = image::io::Reader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| RenderError::Image(format!("JPEG format detection error: {}", e)))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| RenderError::Image(format!("failed to read JPEG dimensions: {}", e)))?;

    let color_space = detect_jpeg_color_space(&data);
    Ok(ImageAsset {
        pixel_data: ImagePixelData::Jpeg { data, color_space },
        width_px: width,
        height_px: height,
    })
}

/// Scan the marker segments for the first SOF and map its component
/// count to a color space. Anything unreadable is treated as RGB.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            // length(2) precision(1) height(2) width(2) components(1)
            return match data.get(i + 9) {
                Some(1) => JpegColorSpace::DeviceGray,
                Some(4) => JpegColorSpace::DeviceCMYK,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, then split into RGB and alpha.
fn decode_png(data: &[u8]) -> Result<ImageAsset, RenderError> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Image(format!("PNG format detection error: {}", e)))?
        .decode()
        .map_err(|e| RenderError::Image(format!("failed to decode PNG: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = width as usize * height as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != 255);

    Ok(ImageAsset {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}

/// Optional images keyed by the value a cell resolves to.
///
/// Absent keys are normal: the renderer draws fallback text instead.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    images: HashMap<String, Arc<ImageAsset>>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `key -> src` pair with [`Assets::load_optional`].
    pub fn from_sources<'s>(sources: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        let mut assets = Self::new();
        for (key, src) in sources {
            assets.load_optional(key, src);
        }
        assets
    }

    pub fn insert(&mut self, key: impl Into<String>, image: ImageAsset) {
        self.images.insert(key.into(), Arc::new(image));
    }

    /// Load `src` and store it under `key`. Failures are logged and the
    /// key is left absent.
    pub fn load_optional(&mut self, key: &str, src: &str) -> bool {
        match load_image(src) {
            Ok(image) => {
                self.insert(key, image);
                true
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "image asset unavailable");
                false
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<ImageAsset>> {
        self.images.get(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// A real baseline JPEG, grayscale when `components` is 1.
#[cfg(test)]
pub(crate) fn test_jpeg(width: u32, height: u32, components: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
    if components == 1 {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([128]));
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::L8)
            .unwrap();
    } else {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgb8,
        )
        .unwrap();
    }
    buf
}

/// An RGBA PNG filled with one color.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
        .unwrap();
    buf
}
