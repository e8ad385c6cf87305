//! Remediation engine: match reported issues to repair strategies, run one
//! deterministic pass over a shared document set, and deduplicate
//! logically-identical reports.
//!
//! This crate owns *which* repair runs and *when*. It does not own how
//! markup is rewritten (that's `epubfix-doc`) or where packages and reports
//! come from (that's `epubfix-core`).
//!
//! The pass is strictly sequential: one `apply` finishes before the next
//! issue is dispatched, because strategies share and mutate the same
//! document store by path.

mod context;
mod dispatch;
mod orchestrator;
mod propagation;
mod sink;
pub mod strategies;
mod strategy;
mod validate;

pub use context::{ProcessingContext, join_href};
pub use dispatch::Dispatcher;
pub use orchestrator::{DryRunPartition, Orchestrator};
pub use propagation::{PropagationScope, propagate, scope_for};
pub use sink::{FixEvent, FixEventSink, NullSink, TracingSink};
pub use strategies::builtin_strategies;
pub use strategy::{Acceptance, FixStrategy, IssueMatcher, glob_match};
pub use validate::validate_modified;
