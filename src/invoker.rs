//! # Transform Invokers Module
//!
//! Questo modulo incapsula gli encoder esterni, uno per formato × modalità.
//!
//! ## Architettura
//!
//! Nessuna elaborazione pixel in-process: ogni invoker delega a un tool
//! specializzato tramite `exec::exec_buffer`, costruendo la riga di comando
//! dal bag di opzioni della configurazione.
//!
//! | Invoker    | Tool       | Ruolo                                   |
//! |------------|------------|------------------------------------------|
//! | Jpegoptim  | jpegoptim  | JPEG lossy, ottimizzazione in-place      |
//! | Guetzli    | guetzli    | JPEG lossless (pesante: CPU + memoria)   |
//! | Pngquant   | pngquant   | PNG lossy, riduzione palette             |
//! | Oxipng     | oxipng     | PNG lossless                             |
//! | Gifsicle   | gifsicle   | GIF, ricompressione frame/palette        |
//! | Svgo       | svgo       | Rewrite vettoriale                       |
//! | Avifenc    | avifenc    | Conversione → AVIF                       |
//! | Cwebp      | cwebp      | Conversione → WebP (statico)             |
//! | Gif2Webp   | gif2webp   | Conversione → WebP (preserva animazione) |
//!
//! Guetzli è l'unico invoker `Heavy`: lo scheduler lo instrada su una coda
//! singleton separata invece di dimezzare il pool (vedi `scheduler`).

use serde_json::{Map, Value};

use crate::error::TaskError;
use crate::exec::{exec_buffer, INPUT_TOKEN, OUTPUT_TOKEN};

/// Scheduler capability tag: `Heavy` invokers run on the singleton queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Normal,
    Heavy,
}

/// Everything an invoker needs besides the input bytes.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// Tool-native options bag, consumed verbatim.
    pub options: Map<String, Value>,
    /// Multi-frame input; set by the router for animation-capable targets.
    pub animated: bool,
    /// Extension for the temp input file (some tools sniff by name).
    pub input_ext: &'static str,
}

/// One external encoder, selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invoker {
    Jpegoptim,
    Guetzli,
    Pngquant,
    Oxipng,
    Gifsicle,
    Svgo,
    Avifenc,
    Cwebp,
    Gif2Webp,
}

impl Invoker {
    pub fn tool(&self) -> &'static str {
        match self {
            Invoker::Jpegoptim => "jpegoptim",
            Invoker::Guetzli => "guetzli",
            Invoker::Pngquant => "pngquant",
            Invoker::Oxipng => "oxipng",
            Invoker::Gifsicle => "gifsicle",
            Invoker::Svgo => "svgo",
            Invoker::Avifenc => "avifenc",
            Invoker::Cwebp => "cwebp",
            Invoker::Gif2Webp => "gif2webp",
        }
    }

    pub fn resource_class(&self) -> ResourceClass {
        match self {
            Invoker::Guetzli => ResourceClass::Heavy,
            _ => ResourceClass::Normal,
        }
    }

    /// Runs the encoder over `buffer` and returns the transformed bytes.
    pub async fn invoke(&self, buffer: &[u8], request: &InvokeRequest) -> Result<Vec<u8>, TaskError> {
        let (args, output_ext) = self.build_args(request);
        exec_buffer(self.tool(), &args, buffer, request.input_ext, output_ext).await
    }

    fn build_args(&self, request: &InvokeRequest) -> (Vec<String>, &'static str) {
        let options = &request.options;
        match self {
            // In-place: no output token, the rewritten input is read back.
            Invoker::Jpegoptim => {
                let mut args = options_to_arguments(options, "--", true);
                args.push(INPUT_TOKEN.to_string());
                (args, "jpg")
            }
            Invoker::Guetzli => {
                let mut args = options_to_arguments(options, "--", false);
                args.push(INPUT_TOKEN.to_string());
                args.push(OUTPUT_TOKEN.to_string());
                (args, "jpg")
            }
            Invoker::Pngquant => {
                let mut args = options_to_arguments(options, "--", true);
                args.push("--output".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                args.push(INPUT_TOKEN.to_string());
                (args, "png")
            }
            Invoker::Oxipng => {
                let mut args = options_to_arguments(options, "--", false);
                args.push("--out".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                args.push(INPUT_TOKEN.to_string());
                (args, "png")
            }
            Invoker::Gifsicle => {
                let mut args = options_to_arguments(options, "--", true);
                args.push("--no-warnings".to_string());
                args.push("--output".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                args.push(INPUT_TOKEN.to_string());
                (args, "gif")
            }
            Invoker::Svgo => {
                let mut args = options_to_arguments(options, "--", false);
                args.push("--input".to_string());
                args.push(INPUT_TOKEN.to_string());
                args.push("--output".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                (args, "svg")
            }
            Invoker::Avifenc => {
                let mut args = options_to_arguments(options, "--", false);
                args.push(INPUT_TOKEN.to_string());
                args.push(OUTPUT_TOKEN.to_string());
                (args, "avif")
            }
            Invoker::Cwebp => {
                let mut args = options_to_arguments(options, "-", false);
                args.push(INPUT_TOKEN.to_string());
                args.push("-o".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                (args, "webp")
            }
            Invoker::Gif2Webp => {
                let mut args = options_to_arguments(options, "-", false);
                args.push(INPUT_TOKEN.to_string());
                args.push("-o".to_string());
                args.push(OUTPUT_TOKEN.to_string());
                (args, "webp")
            }
        }
    }
}

/// Turns an options bag into CLI arguments.
///
/// `false` drops the flag, `true` emits a bare flag, any other value emits
/// flag + value (`--key=value` when `concat`, `--key value` otherwise).
pub fn options_to_arguments(options: &Map<String, Value>, prefix: &str, concat: bool) -> Vec<String> {
    let mut arguments = Vec::new();

    for (key, value) in options {
        let rendered = match value {
            Value::Bool(false) => continue,
            Value::Bool(true) => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        };

        match rendered {
            None => arguments.push(format!("{prefix}{key}")),
            Some(text) if concat => arguments.push(format!("{prefix}{key}={text}")),
            Some(text) => {
                arguments.push(format!("{prefix}{key}"));
                arguments.push(text);
            }
        }
    }

    arguments
}
