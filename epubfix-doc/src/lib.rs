//! Markup editing layer for epubfix.
//!
//! Responsibilities:
//! - Parse a text document into an editable form ([`MarkupDoc`]).
//! - Apply targeted mutations as event-level rewrites that leave every
//!   untouched byte alone (XML declaration, attribute spacing, self-closing
//!   tags all survive).
//! - Re-check well-formedness of documents after a repair pass.
//!
//! Read-only structural queries over XHTML content go through `scraper`;
//! queries that must respect XML semantics (package documents) go through
//! the event scanners in [`query`].

mod error;
mod markup;
pub mod query;

pub use error::MarkupError;
pub use markup::{ElementView, MarkupDoc, check_well_formed, escape_text, is_xml_media_type};
