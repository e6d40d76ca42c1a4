//! # Progress Reporting Module
//!
//! Boundary di reporting della pipeline: il core produce record di outcome
//! strutturati, questo modulo li rende visibili.
//!
//! ## Responsabilità:
//! - Trait `Reporter` consumato dalle pipeline (un evento per task + un
//!   riepilogo finale dopo la join barrier)
//! - Implementazione `ProgressReporter` con barra `indicatif`: le righe di
//!   outcome passano da `ProgressBar::println` per non strappare il rendering
//! - Filtro degli outcome verbose-only quando il run non è verbose
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [============>---------------------------] 45/150 (30%) ✔ photo.jpg
//! ✔ photos/IMG_001.jpg
//!   312.40 KB → 198.22 KB. Ratio: 37%
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

use crate::decision::calculate_ratio;
use crate::outcome::{OutcomeKind, TaskOutcome};
use crate::paths::format_size;

/// Narrow reporting interface between the pipeline core and the terminal.
pub trait Reporter: Send + Sync {
    /// One event per completed task.
    fn task_outcome(&self, display_path: &str, outcome: &TaskOutcome);

    /// A task that failed without a displayable message: it counts toward
    /// progress but produces no outcome line.
    fn task_discarded(&self) {}

    /// Final summary, emitted strictly after every task has completed.
    fn finish(&self, total_before: u64, total_after: u64);
}

/// Terminal reporter backed by an indicatif progress bar.
pub struct ProgressReporter {
    bar: ProgressBar,
    verbose: bool,
}

impl ProgressReporter {
    pub fn new(total_tasks: u64, verbose: bool) -> Self {
        let bar = ProgressBar::new(total_tasks);

        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                )
                .unwrap()
                .progress_chars("=>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, verbose }
    }

    fn symbol(kind: OutcomeKind) -> &'static str {
        match kind {
            OutcomeKind::Success => "✔",
            OutcomeKind::Warning => "⚠",
            OutcomeKind::Info => "ℹ",
            OutcomeKind::Error => "✖",
        }
    }
}

impl Reporter for ProgressReporter {
    fn task_outcome(&self, display_path: &str, outcome: &TaskOutcome) {
        self.bar.inc(1);
        self.bar
            .set_message(format!("{} {}", Self::symbol(outcome.kind), display_path));

        if outcome.verbose_only && !self.verbose {
            return;
        }

        self.bar.println(format!(
            "{} {}\n  {}",
            Self::symbol(outcome.kind),
            display_path,
            outcome.description
        ));
    }

    fn task_discarded(&self) {
        self.bar.inc(1);
    }

    fn finish(&self, total_before: u64, total_after: u64) {
        self.bar.finish_and_clear();

        let ratio = calculate_ratio(total_before, total_after);
        if ratio > 0 {
            info!(
                "Yay! You saved {} ({}%)",
                format_size(total_before - total_after),
                ratio
            );
        } else {
            info!("Done!");
        }
    }
}
