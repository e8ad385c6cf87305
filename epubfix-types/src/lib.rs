//! Shared DTOs (schemas-as-code) for the epubfix workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod document;
pub mod fix;
pub mod issue;
pub mod package;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const EPUBFIX_FIX_V1: &str = "epubfix.fix.v1";
    pub const EPUBFIX_CHECK_V1: &str = "epubfix.check.v1";
}
