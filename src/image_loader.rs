//! # Image Loading
//!
//! Resolves an image field's `src` to pixels once, when the report is
//! loaded. Printers only ever see the decoded [`SourceImage`]; a source
//! that cannot be read or decoded is a configuration error.
//!
//! JPEG data is kept as-is (the PDF writer embeds it with DCTDecode) and
//! only its dimensions are read. PNG is decoded to RGB with a separate
//! alpha plane.

use std::io::Cursor;

use crate::error::PaginateError;

/// A loaded raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub pixels: ImagePixels,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixels {
    /// Undecoded JPEG bytes.
    Jpeg { data: Vec<u8>, grayscale: bool },
    /// `width * height * 3` RGB bytes, plus one alpha byte per pixel when
    /// any pixel is not fully opaque.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

impl SourceImage {
    /// Build an opaque image from raw RGB bytes.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, PaginateError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(PaginateError::Image(format!(
                "{width}x{height} image needs {expected} RGB bytes, got {}",
                rgb.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: ImagePixels::Rgb { rgb, alpha: None },
        })
    }

    /// A solid-colour placeholder, mostly useful in tests and demos.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: ImagePixels::Rgb {
                rgb: rgb.iter().copied().cycle().take(count * 3).collect(),
                alpha: None,
            },
        }
    }
}

/// Load an image from a source string.
///
/// Accepted forms:
/// - `data:image/...;base64,...`
/// - a file path starting with `/`, `./` or `../`
/// - bare base64
pub fn load_image(src: &str) -> Result<SourceImage, PaginateError> {
    let bytes = read_source_bytes(src)?;
    decode_image_bytes(&bytes)
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, PaginateError> {
    if let Some(rest) = src.strip_prefix("data:image/") {
        let comma = rest
            .find(',')
            .ok_or_else(|| PaginateError::Image("invalid data URI: missing comma".to_string()))?;
        return base64_decode(&rest[comma + 1..]);
    }

    // Base64 contains '/', so only explicit path prefixes count as paths
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| PaginateError::Image(format!("failed to read image file '{src}': {e}")));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, PaginateError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| PaginateError::Image(format!("base64 decode error: {e}")))
}

fn decode_image_bytes(data: &[u8]) -> Result<SourceImage, PaginateError> {
    if data.len() < 4 {
        return Err(PaginateError::Image("image data too short".to_string()));
    }
    if is_jpeg(data) {
        read_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else {
        Err(PaginateError::Image(
            "unsupported image format (expected JPEG or PNG)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
}

fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G'])
}

fn read_jpeg(data: &[u8]) -> Result<SourceImage, PaginateError> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PaginateError::Image(format!("JPEG format detection error: {e}")))?
        .into_dimensions()
        .map_err(|e| PaginateError::Image(format!("failed to read JPEG dimensions: {e}")))?;

    Ok(SourceImage {
        width,
        height,
        pixels: ImagePixels::Jpeg {
            data: data.to_vec(),
            grayscale: jpeg_component_count(data) == Some(1),
        },
    })
}

/// Walk the JPEG markers to the first SOF segment and read its component
/// count.
fn jpeg_component_count(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            // length(2) precision(1) height(2) width(2) components(1)
            return data.get(i + 9).copied();
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    None
}

fn decode_png(data: &[u8]) -> Result<SourceImage, PaginateError> {
    let decoded = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PaginateError::Image(format!("PNG format detection error: {e}")))?
        .decode()
        .map_err(|e| PaginateError::Image(format!("failed to decode PNG: {e}")))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixel_count = width as usize * height as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != 255);

    Ok(SourceImage {
        width,
        height,
        pixels: ImagePixels::Rgb {
            rgb,
            alpha: translucent.then_some(alpha),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(pixels: &[[u8; 4]], width: u32, height: u32) -> Vec<u8> {
        let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, &raw, width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_invalid_sources() {
        assert!(matches!(
            load_image("data:image/png;base64"),
            Err(PaginateError::Image(_))
        ));
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]).is_err());
        assert!(load_image("./definitely/not/here.png").is_err());
    }

    #[test]
    fn test_opaque_png_has_no_alpha() {
        let buf = png_bytes(&[[255, 0, 0, 255], [0, 0, 255, 255]], 2, 1);
        let img = decode_image_bytes(&buf).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        match img.pixels {
            ImagePixels::Rgb { rgb, alpha } => {
                assert_eq!(rgb, vec![255, 0, 0, 0, 0, 255]);
                assert!(alpha.is_none());
            }
            other => panic!("expected decoded pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_translucent_png_keeps_alpha() {
        let buf = png_bytes(&[[0, 255, 0, 128]], 1, 1);
        let img = decode_image_bytes(&buf).unwrap();
        match img.pixels {
            ImagePixels::Rgb { alpha, .. } => assert_eq!(alpha, Some(vec![128])),
            other => panic!("expected decoded pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_jpeg_passes_through() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!((loaded.width, loaded.height), (2, 2));
        match loaded.pixels {
            ImagePixels::Jpeg { data, grayscale } => {
                assert!(data.starts_with(&[0xFF, 0xD8]));
                assert!(!grayscale);
            }
            other => panic!("JPEG should stay encoded, got {other:?}"),
        }
    }

    #[test]
    fn test_data_uri() {
        use base64::Engine;
        let buf = png_bytes(&[[0, 0, 0, 255]], 1, 1);
        let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
        let img = load_image(&format!("data:image/png;base64,{b64}")).unwrap();
        assert_eq!((img.width, img.height), (1, 1));
    }

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(SourceImage::from_rgb(2, 2, vec![0; 12]).is_ok());
        assert!(SourceImage::from_rgb(2, 2, vec![0; 11]).is_err());
        let solid = SourceImage::solid(3, 1, [1, 2, 3]);
        assert_eq!(
            solid.pixels,
            ImagePixels::Rgb { rgb: vec![1, 2, 3, 1, 2, 3, 1, 2, 3], alpha: None }
        );
    }
}
