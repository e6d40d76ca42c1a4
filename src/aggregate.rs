//! # Size Aggregation Module
//!
//! Accumulatore unico per batch delle dimensioni prima/dopo.
//!
//! ## Responsabilità:
//! - Somma `before`/`after` per ogni task che ha prodotto un risultato
//! - Clamp per-task: un risultato non scritto non può mai accreditare
//!   risparmio né penalizzare il totale (`after += min(before, after)`)
//! - Accumulo serializzato: add atomici, sicuri sotto esecuzione parallela
//!
//! Il totale finale alimenta l'unica riga di riepilogo del reporter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Batch-wide before/after byte totals. One instance per run, shared by
/// every task.
#[derive(Debug, Default)]
pub struct AggregateSize {
    before: AtomicU64,
    after: AtomicU64,
}

impl AggregateSize {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one transform result. `written` tells whether the produced
    /// buffer was persisted; unwritten results are clamped so the headline
    /// total never credits savings for untouched files.
    pub fn record(&self, size_before: u64, size_after: u64, written: bool) {
        let credited = if written {
            size_after
        } else {
            size_after.min(size_before)
        };
        self.before.fetch_add(size_before, Ordering::Relaxed);
        self.after.fetch_add(credited, Ordering::Relaxed);
    }

    /// Final `(before, after)` totals for the summary line.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.before.load(Ordering::Relaxed),
            self.after.load(Ordering::Relaxed),
        )
    }
}
