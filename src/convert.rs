//! # Convert Pipeline Module
//!
//! Orchestratore della modalità convert: produce versioni AVIF e/o WebP
//! degli input, una task per coppia (file × codec richiesto).
//!
//! ## Pipeline per task:
//! 1. Pre-flight: se l'output esiste e non c'è `--force`, skip PRIMA di
//!    leggere o trasformare qualunque byte
//! 2. Acquisizione slot, lettura buffer, detection
//! 3. Routing sul codec target (reject AVIF animato, gif2webp per le GIF)
//! 4. Invocazione encoder, decisione write/skip, aggregato, outcome
//!
//! Con entrambi i codec richiesti il numero totale di task è
//! `file × codec`; ogni task è indipendente anche rispetto al gemello
//! dello stesso file.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::aggregate::AggregateSize;
use crate::context::{PipelineContext, TargetCodec};
use crate::decision::decide_convert;
use crate::detect::detect;
use crate::error::TaskError;
use crate::invoker::ResourceClass;
use crate::outcome::TaskOutcome;
use crate::paths::{display_path, ensure_parent_dirs, PathPair};
use crate::router::route_convert;

/// Runs the convert pipeline: every pair crossed with every requested codec.
pub async fn convert(
    pairs: Vec<PathPair>,
    targets: &[TargetCodec],
    ctx: &PipelineContext,
) -> anyhow::Result<()> {
    let total = pairs.len();
    if total == 0 || targets.is_empty() {
        return Ok(());
    }

    info!(
        "Converting {} {} ({})...",
        total,
        if total == 1 { "image" } else { "images" },
        ctx.mode.label()
    );

    let aggregate = Arc::new(AggregateSize::new());

    let mut tasks: Vec<BoxFuture<'static, ()>> = Vec::with_capacity(total * targets.len());
    for pair in pairs {
        for &target in targets {
            let pair = pair.clone();
            let ctx = ctx.clone();
            let aggregate = Arc::clone(&aggregate);
            tasks.push(
                async move {
                    let display_name = display_path(&pair.input);
                    match process_file(&pair, target, &ctx, &aggregate).await {
                        Ok(outcome) => ctx.reporter.task_outcome(&display_name, &outcome),
                        Err(task_error) => match task_error.display_message() {
                            Some(message) => ctx
                                .reporter
                                .task_outcome(&display_name, &TaskOutcome::error(message)),
                            None => {
                                error!("{}: {:?}", display_name, task_error);
                                ctx.reporter.task_discarded();
                            }
                        },
                    }
                }
                .boxed(),
            );
        }
    }

    ctx.scheduler.run(tasks).await;

    let (before, after) = aggregate.totals();
    ctx.reporter.finish(before, after);

    Ok(())
}

/// Derives the per-codec output path: original extension stripped, codec
/// extension appended.
pub fn target_output_path(pair: &PathPair, target: TargetCodec) -> PathBuf {
    pair.output.with_extension(target.extension())
}

async fn process_file(
    pair: &PathPair,
    target: TargetCodec,
    ctx: &PipelineContext,
    aggregate: &AggregateSize,
) -> Result<TaskOutcome, TaskError> {
    let output_path = target_output_path(pair, target);

    // Collision pre-flight: no CPU is spent on a conversion that would not
    // be written anyway.
    if !ctx.forced && tokio::fs::metadata(&output_path).await.is_ok() {
        return Ok(TaskOutcome::skipped(format!(
            "File already exists, '{}'",
            display_path(&output_path)
        )));
    }

    let permit = ctx.scheduler.acquire(ResourceClass::Normal).await?;

    let buffer = tokio::fs::read(&pair.input).await?;
    let size_before = buffer.len() as u64;

    let route = route_convert(target, detect(&buffer), ctx.mode, &ctx.config)?;
    debug!(
        "Converting {} to {} via {}",
        pair.input.display(),
        target.display_name(),
        route.invoker.tool()
    );

    let _slot = ctx
        .scheduler
        .slot_for(route.invoker.resource_class(), permit)
        .await?;

    let produced = route.invoker.invoke(&buffer, &route.request).await?;
    let size_after = produced.len() as u64;
    let bytes_changed = produced != buffer;

    let decision = decide_convert(target, size_before, size_after, bytes_changed, ctx.forced);
    if decision.write {
        ensure_parent_dirs(&output_path).await?;
        tokio::fs::write(&output_path, &produced).await?;
    }
    aggregate.record(size_before, size_after, decision.write);

    Ok(decision.outcome)
}
