//! # Write/Skip Decision Module
//!
//! Politica che decide se persistere il risultato di una trasformazione.
//!
//! ## Regole (in ordine):
//! 1. `ratio = round((before − after) / before × 100)`
//! 2. Optimize: scrive su ratio positivo; un rewrite vettoriale che cambia i
//!    byte senza rimpicciolire viene comunque scritto, con livello warning
//! 3. Convert: scrive su ratio positivo oppure con `--force`; altrimenti
//!    skip verbose-only con il nome del codec nel messaggio
//! 4. L'aggregato viene aggiornato dal chiamante per ogni risultato,
//!    scritto o no (clamp in `aggregate`)

use crate::context::TargetCodec;
use crate::outcome::TaskOutcome;
use crate::paths::format_size;

/// Percentage size reduction, rounded; negative means growth.
pub fn calculate_ratio(before: u64, after: u64) -> i64 {
    if before == 0 {
        return 0;
    }
    (((before as f64 - after as f64) / before as f64) * 100.0).round() as i64
}

/// Outcome of the decision policy: whether to persist, and what to report.
#[derive(Debug, Clone)]
pub struct Decision {
    pub write: bool,
    pub outcome: TaskOutcome,
}

/// Optimize mode: persist real wins, persist meaningful vector rewrites,
/// skip the rest quietly.
pub fn decide_optimize(
    size_before: u64,
    size_after: u64,
    bytes_changed: bool,
    is_vector: bool,
) -> Decision {
    let ratio = calculate_ratio(size_before, size_after);
    let optimized = ratio > 0;

    if optimized || (bytes_changed && is_vector) {
        let description = format!(
            "{} → {}. Ratio: {}%",
            format_size(size_before),
            format_size(size_after),
            ratio
        );
        let outcome = if optimized {
            TaskOutcome::success(description)
        } else {
            TaskOutcome::warning(description)
        };
        Decision { write: true, outcome }
    } else {
        let reason = if bytes_changed {
            "File size increased"
        } else {
            "Nothing changed"
        };
        Decision {
            write: false,
            outcome: TaskOutcome::skipped(format!("{reason}. Skipped")),
        }
    }
}

/// Convert mode: persist on a real win or when forced.
pub fn decide_convert(
    target: TargetCodec,
    size_before: u64,
    size_after: u64,
    bytes_changed: bool,
    forced: bool,
) -> Decision {
    let ratio = calculate_ratio(size_before, size_after);

    if ratio > 0 || forced {
        let description = format!(
            "{} → {} {}. Ratio: {}%",
            format_size(size_before),
            target.display_name(),
            format_size(size_after),
            ratio
        );
        Decision {
            write: true,
            outcome: TaskOutcome::success(description),
        }
    } else {
        let reason = if bytes_changed {
            "File size increased"
        } else {
            "Nothing changed"
        };
        Decision {
            write: false,
            outcome: TaskOutcome::skipped(format!(
                "{reason}. Conversion to {} skipped",
                target.display_name()
            )),
        }
    }
}
