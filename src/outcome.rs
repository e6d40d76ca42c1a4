//! # Task Outcome Module
//!
//! Record strutturato prodotto da ogni task completato; il rendering è a
//! carico del reporter, qui ci sono solo i dati.

/// Severity of a completed task, mapped by the reporter onto its symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    /// Written, but not an actual size win (vector rewrites that reformat
    /// without shrinking).
    Warning,
    /// Skipped without writing anything.
    Info,
    Error,
}

/// One outcome per task, consumed by the `Reporter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub kind: OutcomeKind,
    pub description: String,
    /// Shown only when the run is verbose.
    pub verbose_only: bool,
}

impl TaskOutcome {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Success,
            description: description.into(),
            verbose_only: false,
        }
    }

    pub fn warning(description: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Warning,
            description: description.into(),
            verbose_only: false,
        }
    }

    pub fn skipped(description: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Info,
            description: description.into(),
            verbose_only: true,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Error,
            description: description.into(),
            verbose_only: false,
        }
    }
}
