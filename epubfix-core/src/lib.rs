//! Embeddable core library for epubfix.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`PackageSource`](ports::PackageSource) — load an extracted package
//! - [`IssueSource`](ports::IssueSource) — load validator reports
//! - [`WritePort`](ports::WritePort) — write files and create directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_fix`](pipeline::run_fix) — apply repairs + build a report
//! - [`run_check`](pipeline::run_check) — partition issues without mutating

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the engine surface so embedders don't need epubfix-engine directly.
pub use epubfix_engine::{FixEvent, FixEventSink, NullSink, ProcessingContext, TracingSink};
