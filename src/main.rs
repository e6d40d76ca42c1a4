//! # Batch Image Optimizer - Main Entry Point
//!
//! Punto di ingresso dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Costruzione del contesto di run e avvio della pipeline
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (path, --avif/--webp, --lossless, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica la configurazione (file utente o default embedded)
//! 4. Espande i path in coppie (input, output)
//! 5. Avvia la pipeline optimize oppure convert
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer photos/ --lossless --verbose
//! image-optimizer photos/ --avif --webp --force -o converted/
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use batch_image_optimizer::{
    collect_path_pairs, convert, optimize, ConfigProvider, Mode, OutputNaming, PipelineContext,
    ProgressReporter, Scheduler, TargetCodec, CONVERT_EXTENSIONS, OPTIMIZE_EXTENSIONS,
};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(version)]
#[command(about = "Batch image optimization and conversion with external codec tools")]
struct Args {
    /// Files and directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Create AVIF versions of the input images
    #[arg(long)]
    avif: bool,

    /// Create WebP versions of the input images
    #[arg(long)]
    webp: bool,

    /// Force conversion: overwrite existing files and keep results that did
    /// not shrink
    #[arg(short, long)]
    force: bool,

    /// Perform lossless optimizations
    #[arg(short, long)]
    lossless: bool,

    /// Use this configuration file, overriding default options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write output to this directory instead of next to the inputs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Add prefix to output file names
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Add suffix to output file names
    #[arg(short = 's', long, default_value = "")]
    suffix: String,

    /// Verbose logging, including per-file skip reasons
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate and create output directory if specified
    if let Some(ref output_dir) = args.output {
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
            info!("Created output directory: {}", output_dir.display());
        }
        if !output_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "Output path is not a directory: {}",
                output_dir.display()
            ));
        }
    }

    let config = match args.config {
        Some(ref path) => ConfigProvider::from_file(path).await?,
        None => ConfigProvider::default(),
    };

    let mode = if args.lossless {
        Mode::Lossless
    } else {
        Mode::Lossy
    };

    let mut targets = Vec::new();
    if args.avif {
        targets.push(TargetCodec::Avif);
    }
    if args.webp {
        targets.push(TargetCodec::Webp);
    }

    let extensions = if targets.is_empty() {
        OPTIMIZE_EXTENSIONS
    } else {
        CONVERT_EXTENSIONS
    };
    let naming = OutputNaming {
        output_dir: args.output,
        prefix: args.prefix,
        suffix: args.suffix,
    };
    let pairs = collect_path_pairs(&args.paths, extensions, &naming)?;

    if pairs.is_empty() {
        info!("No images found to process");
        return Ok(());
    }

    let task_count = if targets.is_empty() {
        pairs.len()
    } else {
        pairs.len() * targets.len()
    };
    let reporter = Arc::new(ProgressReporter::new(task_count as u64, args.verbose));
    let ctx = PipelineContext::new(
        config,
        mode,
        args.force,
        reporter,
        Scheduler::with_default_cap(),
    );

    if targets.is_empty() {
        optimize(pairs, &ctx).await?;
    } else {
        convert(pairs, &targets, &ctx).await?;
    }

    Ok(())
}
