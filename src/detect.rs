//! # Format Detection Module
//!
//! Rileva il vero formato immagine dai byte del file, mai dall'estensione.
//!
//! ## Responsabilità:
//! - Sniffing strutturale dei magic byte tramite il crate `image`
//! - Conteggio frame per le GIF (serve a distinguere input animati)
//! - Riconoscimento SVG tramite sniffing testuale del prologo
//! - Mai errori: input non parsabile produce `None`
//!
//! L'estensione del file viene usata altrove solo per il naming dell'output;
//! un `.png` che contiene byte JPEG viene trattato come JPEG.

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use std::io::Cursor;

/// Structural image format, detected from file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Jpeg,
    Png,
    Webp,
    Gif { frames: u32 },
    Svg,
}

impl DetectedFormat {
    /// Lowercase format tag, as used in user-facing error messages.
    pub fn name(&self) -> &'static str {
        match self {
            DetectedFormat::Jpeg => "jpeg",
            DetectedFormat::Png => "png",
            DetectedFormat::Webp => "webp",
            DetectedFormat::Gif { .. } => "gif",
            DetectedFormat::Svg => "svg",
        }
    }

    /// Temp-file extension handed to invokers that sniff input by name.
    pub fn file_ext(&self) -> &'static str {
        match self {
            DetectedFormat::Jpeg => "jpg",
            DetectedFormat::Png => "png",
            DetectedFormat::Webp => "webp",
            DetectedFormat::Gif { .. } => "gif",
            DetectedFormat::Svg => "svg",
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, DetectedFormat::Svg)
    }

    /// Multi-frame input. Vector formats are never probed for animation.
    pub fn is_animated(&self) -> bool {
        matches!(self, DetectedFormat::Gif { frames } if *frames > 1)
    }
}

/// Best-effort structural detection. Returns `None` for unparseable or
/// unrecognized input instead of an error.
pub fn detect(buffer: &[u8]) -> Option<DetectedFormat> {
    if let Ok(format) = image::guess_format(buffer) {
        return match format {
            image::ImageFormat::Jpeg => Some(DetectedFormat::Jpeg),
            image::ImageFormat::Png => Some(DetectedFormat::Png),
            image::ImageFormat::WebP => Some(DetectedFormat::Webp),
            image::ImageFormat::Gif => Some(DetectedFormat::Gif {
                frames: count_gif_frames(buffer),
            }),
            _ => None,
        };
    }

    if looks_like_svg(buffer) {
        return Some(DetectedFormat::Svg);
    }

    None
}

/// Counts decodable GIF frames. A header that parses but yields no frames
/// still counts as a single-frame image.
fn count_gif_frames(buffer: &[u8]) -> u32 {
    match GifDecoder::new(Cursor::new(buffer)) {
        Ok(decoder) => {
            let frames = decoder
                .into_frames()
                .take_while(|frame| frame.is_ok())
                .count() as u32;
            frames.max(1)
        }
        Err(_) => 1,
    }
}

/// Text sniff for SVG documents: an `<svg` root element within the leading
/// chunk, optionally preceded by a BOM, an XML declaration or comments.
fn looks_like_svg(buffer: &[u8]) -> bool {
    let head = &buffer[..buffer.len().min(1024)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !(trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") || trimmed.starts_with("<!--"))
    {
        return false;
    }
    trimmed.contains("<svg")
}
