use crate::context::ProcessingContext;
use epubfix_doc::check_well_formed;
use epubfix_types::report::{PostValidation, ValidationFailure};

/// Re-parse every document flagged modified to confirm it is still
/// well-formed markup.
///
/// A failure is reported per path; the mutation is kept either way — there
/// is no rollback.
pub fn validate_modified(ctx: &ProcessingContext) -> PostValidation {
    let mut out = PostValidation::default();
    for (path, document) in &ctx.contents {
        if !document.modified {
            continue;
        }
        let Some(text) = document.as_text() else {
            continue;
        };
        match check_well_formed(text, &document.media_type) {
            Ok(()) => out.validated_files.push(path.clone()),
            Err(err) => out.errors.push(ValidationFailure {
                path: path.clone(),
                error: err.to_string(),
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use epubfix_types::document::Document;
    use epubfix_types::package::{PackageManifest, PackageMetadata};
    use pretty_assertions::assert_eq;

    fn context() -> ProcessingContext {
        ProcessingContext::new(
            "content.opf",
            PackageManifest::default(),
            PackageMetadata::default(),
        )
    }

    #[test]
    fn only_modified_documents_are_checked() {
        let mut ctx = context();
        ctx.insert_document(Document::text(
            "a.xhtml",
            "application/xhtml+xml",
            "<html/>",
        ));
        let mut touched = Document::text("b.xhtml", "application/xhtml+xml", "<html><p/></html>");
        touched.modified = true;
        ctx.insert_document(touched);

        let outcome = validate_modified(&ctx);
        assert_eq!(outcome.validated_files, vec!["b.xhtml"]);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn reparse_failure_is_reported_not_reverted() {
        let mut ctx = context();
        let mut broken = Document::text("a.xhtml", "application/xhtml+xml", "<html><p></html>");
        broken.modified = true;
        ctx.insert_document(broken);

        let outcome = validate_modified(&ctx);
        assert!(outcome.validated_files.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].path, "a.xhtml");
        // Content untouched.
        assert_eq!(
            ctx.document("a.xhtml").expect("doc").as_text(),
            Some("<html><p></html>")
        );
    }
}
