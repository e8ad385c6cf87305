use tracing::{debug, info, warn};

/// Structured events emitted during a remediation pass.
#[derive(Debug, Clone)]
pub enum FixEvent<'a> {
    PassStarted {
        candidates: usize,
    },
    StrategySelected {
        code: &'a str,
        strategy: &'a str,
    },
    NoStrategy {
        code: &'a str,
        recognized: bool,
    },
    FixApplied {
        strategy: &'a str,
        code: &'a str,
        changed_files: &'a [String],
    },
    FixFailed {
        strategy: &'a str,
        code: &'a str,
        message: &'a str,
    },
    Propagated {
        code: &'a str,
        marked: usize,
    },
    PassFinished {
        applied: usize,
        failed: usize,
    },
}

/// Observability capability handed to the orchestrator at construction.
/// The engine itself never logs ambiently.
pub trait FixEventSink {
    fn event(&self, event: &FixEvent<'_>);
}

/// Discards everything. Handy for tests and embedders that do their own
/// reporting off the result list.
pub struct NullSink;

impl FixEventSink for NullSink {
    fn event(&self, _event: &FixEvent<'_>) {}
}

/// Forwards events to `tracing`.
pub struct TracingSink;

impl FixEventSink for TracingSink {
    fn event(&self, event: &FixEvent<'_>) {
        match event {
            FixEvent::PassStarted { candidates } => {
                info!(candidates, "remediation pass started");
            }
            FixEvent::StrategySelected { code, strategy } => {
                debug!(code, strategy, "strategy selected");
            }
            FixEvent::NoStrategy { code, recognized } => {
                debug!(code, recognized, "no strategy accepted issue");
            }
            FixEvent::FixApplied {
                strategy,
                code,
                changed_files,
            } => {
                info!(strategy, code, files = changed_files.len(), "fix applied");
            }
            FixEvent::FixFailed {
                strategy,
                code,
                message,
            } => {
                warn!(strategy, code, message, "fix did not apply");
            }
            FixEvent::Propagated { code, marked } => {
                debug!(code, marked, "equivalent issues marked resolved");
            }
            FixEvent::PassFinished { applied, failed } => {
                info!(applied, failed, "remediation pass finished");
            }
        }
    }
}
