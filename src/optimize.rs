//! # Optimize Pipeline Module
//!
//! Orchestratore della modalità optimize: re-encoding in-place (o verso una
//! output root) nel formato originale di ogni file.
//!
//! ## Pipeline per file:
//! 1. Acquisizione slot dal pool normal
//! 2. Lettura buffer e detection strutturale del formato
//! 3. Routing sull'invoker (eventuale scambio slot verso la coda heavy)
//! 4. Invocazione encoder esterno
//! 5. Decisione write/skip e aggiornamento aggregato
//! 6. Outcome al reporter
//!
//! ## Error handling:
//! - Ogni errore viene convertito in outcome al boundary del task
//! - Un file che fallisce su mille produce una riga di errore e gli altri
//!   999 vengono comunque processati e riportati

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::aggregate::AggregateSize;
use crate::context::PipelineContext;
use crate::decision::decide_optimize;
use crate::detect::detect;
use crate::error::TaskError;
use crate::invoker::ResourceClass;
use crate::outcome::TaskOutcome;
use crate::paths::{display_path, ensure_parent_dirs, PathPair};
use crate::router::route_optimize;

/// Runs the optimize pipeline over the whole batch.
pub async fn optimize(pairs: Vec<PathPair>, ctx: &PipelineContext) -> anyhow::Result<()> {
    let total = pairs.len();
    if total == 0 {
        return Ok(());
    }

    info!(
        "Optimizing {} {} ({})...",
        total,
        if total == 1 { "image" } else { "images" },
        ctx.mode.label()
    );
    if ctx.mode == crate::context::Mode::Lossless {
        info!("Lossless optimization may take a long time");
    }

    let aggregate = Arc::new(AggregateSize::new());

    let tasks: Vec<BoxFuture<'static, ()>> = pairs
        .into_iter()
        .map(|pair| {
            let ctx = ctx.clone();
            let aggregate = Arc::clone(&aggregate);
            async move {
                let display_name = display_path(&pair.input);
                match process_file(&pair, &ctx, &aggregate).await {
                    Ok(outcome) => ctx.reporter.task_outcome(&display_name, &outcome),
                    Err(task_error) => match task_error.display_message() {
                        Some(message) => ctx
                            .reporter
                            .task_outcome(&display_name, &TaskOutcome::error(message)),
                        None => {
                            // No displayable message: raw diagnostic only.
                            error!("{}: {:?}", display_name, task_error);
                            ctx.reporter.task_discarded();
                        }
                    },
                }
            }
            .boxed()
        })
        .collect();

    ctx.scheduler.run(tasks).await;

    let (before, after) = aggregate.totals();
    ctx.reporter.finish(before, after);

    Ok(())
}

async fn process_file(
    pair: &PathPair,
    ctx: &PipelineContext,
    aggregate: &AggregateSize,
) -> Result<TaskOutcome, TaskError> {
    let permit = ctx.scheduler.acquire(ResourceClass::Normal).await?;

    let buffer = tokio::fs::read(&pair.input).await?;
    let size_before = buffer.len() as u64;

    let detected = detect(&buffer);
    let route = route_optimize(detected, ctx.mode, &ctx.config)?;
    let is_vector = detected.map(|format| format.is_vector()).unwrap_or(false);
    debug!(
        "Routing {} as {} via {}",
        pair.input.display(),
        detected.map(|format| format.name()).unwrap_or("unknown"),
        route.invoker.tool()
    );

    // Heavy invokers trade the normal slot for the singleton queue.
    let _slot = ctx
        .scheduler
        .slot_for(route.invoker.resource_class(), permit)
        .await?;

    let produced = route.invoker.invoke(&buffer, &route.request).await?;
    let size_after = produced.len() as u64;
    let bytes_changed = produced != buffer;

    let decision = decide_optimize(size_before, size_after, bytes_changed, is_vector);
    if decision.write {
        ensure_parent_dirs(&pair.output).await?;
        tokio::fs::write(&pair.output, &produced).await?;
    }
    aggregate.record(size_before, size_after, decision.write);

    Ok(decision.outcome)
}
