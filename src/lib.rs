//! # Batch Image Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Provider delle opzioni encoder per formato e modalità
//! - `context`: Contesto di run esplicito passato attraverso le pipeline
//! - `error`: Tipi di errore per-task
//! - `detect`: Detection strutturale del formato dai byte
//! - `paths`: Costruzione delle coppie (input, output) e naming
//! - `exec`: Runner buffer-in/buffer-out per i tool esterni
//! - `invoker`: Encoder esterni, uno per formato × modalità
//! - `router`: Dispatch formato rilevato → invoker
//! - `decision`: Politica write/skip e calcolo ratio
//! - `outcome` / `aggregate` / `report`: Record per task, totali, rendering
//! - `scheduler`: Concorrenza limitata con coda singleton per i tool pesanti
//! - `optimize` / `convert`: Le due pipeline batch
//!
//! ## Utilizzo:
//! ```no_run
//! use batch_image_optimizer::{
//!     collect_path_pairs, optimize, ConfigProvider, Mode, OutputNaming,
//!     PipelineContext, ProgressReporter, Scheduler, OPTIMIZE_EXTENSIONS,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pairs = collect_path_pairs(
//!     &[std::path::PathBuf::from("photos")],
//!     OPTIMIZE_EXTENSIONS,
//!     &OutputNaming::default(),
//! )?;
//! let reporter = Arc::new(ProgressReporter::new(pairs.len() as u64, false));
//! let ctx = PipelineContext::new(
//!     ConfigProvider::default(),
//!     Mode::Lossy,
//!     false,
//!     reporter,
//!     Scheduler::with_default_cap(),
//! );
//! optimize(pairs, &ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod context;
pub mod convert;
pub mod decision;
pub mod detect;
pub mod error;
pub mod exec;
pub mod invoker;
pub mod optimize;
pub mod outcome;
pub mod paths;
pub mod report;
pub mod router;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_images;

pub use aggregate::AggregateSize;
pub use config::ConfigProvider;
pub use context::{Mode, PipelineContext, TargetCodec};
pub use convert::convert;
pub use decision::calculate_ratio;
pub use detect::{detect, DetectedFormat};
pub use error::TaskError;
pub use invoker::{Invoker, ResourceClass};
pub use optimize::optimize;
pub use outcome::{OutcomeKind, TaskOutcome};
pub use paths::{collect_path_pairs, format_size, OutputNaming, PathPair};
pub use report::{ProgressReporter, Reporter};
pub use router::{CONVERT_EXTENSIONS, OPTIMIZE_EXTENSIONS};
pub use scheduler::Scheduler;
