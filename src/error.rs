//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore per-task della pipeline.
//!
//! ## Responsabilità:
//! - Definisce `TaskError` enum per categorizzare gli errori di un singolo task
//! - Fornisce messaggi user-facing esatti per i casi di routing
//! - Integra con `thiserror` per automatic error conversion
//! - Distingue in fase di costruzione gli errori con messaggio mostrabile
//!   da quelli "muti" (encoder fallito senza stderr)
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (lettura input, scrittura output, mkdir)
//! - `UnknownFormat`: I byte del file non corrispondono a nessun formato noto
//! - `UnsupportedFormat`: Formato riconosciuto ma non gestito dalla modalità
//! - `AnimatedAvif`: Input multi-frame indirizzato al codec AVIF
//! - `Encoder`: Tool esterno fallito con stderr leggibile
//! - `EncoderSilent`: Tool esterno fallito senza alcun messaggio
//! - `ToolUnavailable`: Tool esterno non trovato nel PATH
//!
//! Ogni errore viene catturato al boundary del task e convertito in un
//! `TaskOutcome`; niente propaga mai fino ad abortire il batch.

/// Per-task error type for the transformation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown file format")]
    UnknownFormat,

    #[error("Unsupported image format: \"{0}\"")]
    UnsupportedFormat(String),

    #[error("Animated AVIF is not supported")]
    AnimatedAvif,

    #[error("Scheduler queue closed")]
    Scheduler(#[from] tokio::sync::AcquireError),

    #[error("Required tool is not available: {tool}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Encoder { tool: &'static str, message: String },

    /// External tool failed without producing any diagnostic output. The
    /// "no displayable message" property is decided here, at construction,
    /// never by inspecting message contents at the catch site.
    #[error("{tool} exited with {status}")]
    EncoderSilent {
        tool: &'static str,
        status: std::process::ExitStatus,
    },
}

impl TaskError {
    /// Builds an encoder error from captured stderr, selecting the silent
    /// variant when the tool produced no output at all.
    pub fn from_tool_failure(
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: &[u8],
    ) -> Self {
        let message = String::from_utf8_lossy(stderr).trim().to_string();
        if message.is_empty() {
            TaskError::EncoderSilent { tool, status }
        } else {
            TaskError::Encoder { tool, message }
        }
    }

    /// The human-readable message for the outcome line, or `None` when the
    /// error must be logged as a raw diagnostic instead.
    pub fn display_message(&self) -> Option<String> {
        match self {
            TaskError::EncoderSilent { .. } => None,
            other => Some(other.to_string()),
        }
    }
}
