//! # Transform Routing Module
//!
//! Questo modulo mappa il formato rilevato sull'invoker corretto.
//!
//! ## Responsabilità:
//! - Dispatch per formato rilevato + modalità lossy/lossless (optimize)
//! - Dispatch per codec target (convert), con i casi speciali animazione
//! - Errori descrittivi per formati sconosciuti o non supportati
//!
//! ## Macchina a stati per task:
//! ```text
//! DETECT → (unknown)     → ERROR "Unknown file format"
//!        → (unsupported) → ERROR "Unsupported image format: \"<fmt>\""
//!        → (supported)   → INVOKE(formato, modalità) → DECIDE | ERROR
//! ```
//!
//! ## Casi speciali:
//! - GIF multi-frame → AVIF: errore esplicito, mai un frame statico silenzioso
//! - GIF → WebP: instradato su gif2webp con flag `animated`, i frame
//!   sopravvivono alla conversione
//! - SVG: mai sondato per animazione; consuma l'intero sub-tree vettoriale
//! - GIF: riceve un hint `threads` derivato dai core disponibili, come
//!   opzione dell'invoker e non come concern dello scheduler

use serde_json::Value;

use crate::config::ConfigProvider;
use crate::context::{Mode, TargetCodec};
use crate::detect::DetectedFormat;
use crate::error::TaskError;
use crate::invoker::{InvokeRequest, Invoker};

/// Extensions accepted by the discovery step in optimize mode.
pub const OPTIMIZE_EXTENSIONS: &[&str] = &["gif", "jpeg", "jpg", "png", "svg"];
/// Extensions accepted by the discovery step in convert mode.
pub const CONVERT_EXTENSIONS: &[&str] = &["gif", "jpeg", "jpg", "png", "webp"];

/// A resolved dispatch: which encoder to run and with what.
#[derive(Debug, Clone)]
pub struct Route {
    pub invoker: Invoker,
    pub request: InvokeRequest,
}

/// Routes one optimize-mode task. Detection is authoritative: the extension
/// never participates.
pub fn route_optimize(
    detected: Option<DetectedFormat>,
    mode: Mode,
    config: &ConfigProvider,
) -> Result<Route, TaskError> {
    let format = detected.ok_or(TaskError::UnknownFormat)?;

    let route = match format {
        DetectedFormat::Jpeg => {
            let invoker = match mode {
                Mode::Lossy => Invoker::Jpegoptim,
                Mode::Lossless => Invoker::Guetzli,
            };
            Route {
                invoker,
                request: request_for(format, config.options("jpeg", mode), false),
            }
        }
        DetectedFormat::Png => {
            let invoker = match mode {
                Mode::Lossy => Invoker::Pngquant,
                Mode::Lossless => Invoker::Oxipng,
            };
            Route {
                invoker,
                request: request_for(format, config.options("png", mode), false),
            }
        }
        DetectedFormat::Gif { frames } => {
            let mut options = config.options("gif", mode);
            // Frame recompression parallelizes internally; the scheduler
            // still sees one normal task.
            options
                .entry("threads".to_string())
                .or_insert_with(|| Value::from(num_cpus::get() as u64));
            Route {
                invoker: Invoker::Gifsicle,
                request: request_for(format, options, frames > 1),
            }
        }
        DetectedFormat::Svg => Route {
            invoker: Invoker::Svgo,
            request: request_for(format, config.vector_options(), false),
        },
        DetectedFormat::Webp => {
            return Err(TaskError::UnsupportedFormat(format.name().to_string()))
        }
    };

    Ok(route)
}

/// Routes one convert-mode task for a single target codec.
pub fn route_convert(
    target: TargetCodec,
    detected: Option<DetectedFormat>,
    mode: Mode,
    config: &ConfigProvider,
) -> Result<Route, TaskError> {
    let format = detected.ok_or(TaskError::UnknownFormat)?;

    if !matches!(
        format,
        DetectedFormat::Jpeg | DetectedFormat::Png | DetectedFormat::Gif { .. } | DetectedFormat::Webp
    ) {
        return Err(TaskError::UnsupportedFormat(format.name().to_string()));
    }

    let route = match target {
        TargetCodec::Avif => {
            // libheif cannot encode image sequences; fail loudly instead of
            // emitting a single-frame artifact.
            if format.is_animated() {
                return Err(TaskError::AnimatedAvif);
            }
            Route {
                invoker: Invoker::Avifenc,
                request: request_for(format, config.options("avif", mode), false),
            }
        }
        TargetCodec::Webp => match format {
            DetectedFormat::Gif { .. } => Route {
                invoker: Invoker::Gif2Webp,
                request: request_for(format, config.options("webp_gif", mode), format.is_animated()),
            },
            _ => Route {
                invoker: Invoker::Cwebp,
                request: request_for(format, config.options("webp", mode), false),
            },
        },
    };

    Ok(route)
}

fn request_for(
    format: DetectedFormat,
    options: serde_json::Map<String, Value>,
    animated: bool,
) -> InvokeRequest {
    InvokeRequest {
        options,
        animated,
        input_ext: format.file_ext(),
    }
}
