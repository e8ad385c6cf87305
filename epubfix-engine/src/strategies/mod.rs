//! Builtin repair strategies.
//!
//! Registration order is the dispatch priority: structural/validation
//! repairs, then package metadata, then presentation-level accessibility,
//! then link/landmark/ARIA repairs. Overlapping code ranges are
//! disambiguated by this order alone — the page-map cleanup must sit above
//! the generic RSC-005 handler.

use crate::strategy::FixStrategy;

mod epub_type_role;
mod heading_order;
mod image_alt;
mod invalid_attribute;
mod landmark_unique;
mod language;
mod link_name;
mod metadata;
mod page_map;
mod title;

pub use epub_type_role::EpubTypeRoleFixer;
pub use heading_order::HeadingOrderFixer;
pub use image_alt::ImageAltFixer;
pub use invalid_attribute::InvalidAttributeFixer;
pub use landmark_unique::LandmarkFixer;
pub use language::DocumentLanguageFixer;
pub use link_name::LinkNameFixer;
pub use metadata::AccessibilityMetadataFixer;
pub use page_map::PageMapFixer;
pub use title::DocumentTitleFixer;

pub fn builtin_strategies() -> Vec<Box<dyn FixStrategy>> {
    vec![
        Box::new(PageMapFixer),
        Box::new(InvalidAttributeFixer),
        Box::new(AccessibilityMetadataFixer),
        Box::new(DocumentLanguageFixer),
        Box::new(DocumentTitleFixer),
        Box::new(ImageAltFixer),
        Box::new(HeadingOrderFixer),
        Box::new(LinkNameFixer),
        Box::new(LandmarkFixer),
        Box::new(EpubTypeRoleFixer),
    ]
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::context::ProcessingContext;
    use epubfix_types::document::Document;
    use epubfix_types::issue::{IssueLocation, Severity, ValidationIssue};
    use epubfix_types::package::{PackageManifest, PackageMetadata};

    pub fn context() -> ProcessingContext {
        ProcessingContext::new(
            "OEBPS/content.opf",
            PackageManifest::default(),
            PackageMetadata::default(),
        )
    }

    pub fn context_with_doc(path: &str, media_type: &str, content: &str) -> ProcessingContext {
        let mut ctx = context();
        ctx.insert_document(Document::text(path, media_type, content));
        ctx
    }

    pub fn issue(code: &str, message: &str, file: &str) -> ValidationIssue {
        ValidationIssue {
            code: code.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
            fixable: true,
            fixed: false,
            location: Some(IssueLocation {
                file: file.to_string(),
                line: None,
            }),
        }
    }

    pub fn stored_text<'a>(ctx: &'a ProcessingContext, path: &str) -> &'a str {
        ctx.document(path)
            .and_then(|d| d.as_text())
            .expect("stored text document")
    }
}
