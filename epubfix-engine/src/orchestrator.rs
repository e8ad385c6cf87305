use crate::context::ProcessingContext;
use crate::dispatch::Dispatcher;
use crate::propagation::propagate;
use crate::sink::{FixEvent, FixEventSink};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use epubfix_types::report::StrategyAssignment;

/// Read-only partition of the issue list, for preview and reporting.
#[derive(Debug, Clone, Default)]
pub struct DryRunPartition {
    pub fixable: Vec<StrategyAssignment>,
    pub unfixable: Vec<ValidationIssue>,
}

/// Drives the full remediation pass: filters eligible issues, dispatches
/// each to at most one strategy, isolates per-issue failures, and marks
/// logically-identical reports resolved after every success.
pub struct Orchestrator<'a> {
    dispatcher: &'a Dispatcher,
    sink: &'a dyn FixEventSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(dispatcher: &'a Dispatcher, sink: &'a dyn FixEventSink) -> Self {
        Self { dispatcher, sink }
    }

    /// One pass over `ctx.issues`, input order. Returns every dispatch
    /// outcome; successful ones are also appended to `ctx.fixes`.
    ///
    /// A strategy error never aborts the batch: it becomes a failed
    /// [`FixResult`] carrying the error text and the pass continues. There
    /// is no retry and no rollback of whatever a failing strategy wrote
    /// before it errored.
    pub fn run(&self, ctx: &mut ProcessingContext) -> Vec<FixResult> {
        let candidates: Vec<usize> = ctx
            .issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| issue.fixable && !issue.fixed)
            .map(|(idx, _)| idx)
            .collect();

        self.sink.event(&FixEvent::PassStarted {
            candidates: candidates.len(),
        });

        let mut attempted = vec![false; ctx.issues.len()];
        let mut results = Vec::new();
        let mut applied = 0usize;
        let mut failed = 0usize;

        for idx in candidates {
            // An earlier repair in this same loop may have resolved it.
            if ctx.issues[idx].fixed {
                continue;
            }
            attempted[idx] = true;
            let issue = ctx.issues[idx].clone();

            let Some(strategy) = self.dispatcher.select(&issue) else {
                let recognized = self.dispatcher.recognizes(&issue);
                self.sink.event(&FixEvent::NoStrategy {
                    code: &issue.code,
                    recognized,
                });
                let message = if recognized {
                    format!("no strategy accepted code {} (recognized, declined)", issue.code)
                } else {
                    format!("no strategy for code {}", issue.code)
                };
                failed += 1;
                results.push(FixResult::unchanged("none", message));
                continue;
            };

            self.sink.event(&FixEvent::StrategySelected {
                code: &issue.code,
                strategy: strategy.name(),
            });

            let result = match strategy.apply(&issue, ctx) {
                Ok(result) => result,
                Err(err) => {
                    FixResult::unchanged(strategy.name(), format!("strategy error: {err:#}"))
                }
            };

            if result.success {
                applied += 1;
                ctx.issues[idx].fixed = true;
                self.sink.event(&FixEvent::FixApplied {
                    strategy: &result.strategy,
                    code: &issue.code,
                    changed_files: &result.changed_files,
                });
                let marked = propagate(&mut ctx.issues, idx, &attempted);
                if marked > 0 {
                    self.sink.event(&FixEvent::Propagated {
                        code: &issue.code,
                        marked,
                    });
                }
                ctx.fixes.push(result.clone());
            } else {
                failed += 1;
                self.sink.event(&FixEvent::FixFailed {
                    strategy: &result.strategy,
                    code: &issue.code,
                    message: &result.message,
                });
            }

            results.push(result);
        }

        self.sink.event(&FixEvent::PassFinished { applied, failed });
        results
    }

    /// Partition the full issue list into fixable (with the strategy the
    /// dispatcher would pick) and unfixable — without invoking any `apply`.
    pub fn dry_run(&self, ctx: &ProcessingContext) -> DryRunPartition {
        let mut partition = DryRunPartition::default();
        for issue in &ctx.issues {
            let assigned = (issue.fixable && !issue.fixed)
                .then(|| self.dispatcher.select(issue))
                .flatten();
            match assigned {
                Some(strategy) => partition.fixable.push(StrategyAssignment {
                    strategy: strategy.name().to_string(),
                    issue: issue.clone(),
                }),
                None => partition.unfixable.push(issue.clone()),
            }
        }
        partition
    }
}
