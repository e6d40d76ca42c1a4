//! # Run Context Module
//!
//! Valore di contesto esplicito passato per riferimento attraverso le
//! pipeline, al posto di un singleton globale di opzioni: così due batch
//! possono girare concorrenti (nei test e non solo) senza stato nascosto.

use std::sync::Arc;

use crate::config::ConfigProvider;
use crate::report::Reporter;
use crate::scheduler::Scheduler;

/// Quality preset, selected once per batch run and applied uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lossy,
    Lossless,
}

impl Mode {
    /// Key of this mode inside the configuration tree.
    pub fn config_key(&self) -> &'static str {
        match self {
            Mode::Lossy => "lossy",
            Mode::Lossless => "lossless",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Lossy => "lossy",
            Mode::Lossless => "lossless",
        }
    }
}

/// Target codec for convert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCodec {
    Avif,
    Webp,
}

impl TargetCodec {
    /// Display name used in outcome messages ("Conversion to AVIF skipped").
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetCodec::Avif => "AVIF",
            TargetCodec::Webp => "WebP",
        }
    }

    /// Output file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetCodec::Avif => "avif",
            TargetCodec::Webp => "webp",
        }
    }
}

/// Request-scoped state shared by every task of one batch run.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Arc<ConfigProvider>,
    pub mode: Mode,
    /// Convert mode only: overwrite existing outputs and keep results that
    /// did not shrink.
    pub forced: bool,
    pub reporter: Arc<dyn Reporter>,
    pub scheduler: Scheduler,
}

impl PipelineContext {
    pub fn new(
        config: ConfigProvider,
        mode: Mode,
        forced: bool,
        reporter: Arc<dyn Reporter>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            config: Arc::new(config),
            mode,
            forced,
            reporter,
            scheduler,
        }
    }
}
