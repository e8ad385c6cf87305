use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_doc::query::xml_has_element;
use epubfix_doc::{ElementView, escape_text};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// Declares the document language: `lang`/`xml:lang` on the root `html`
/// element of a content document, or `dc:language` in the package document
/// for `epub-lang` reports.
pub struct DocumentLanguageFixer;

impl DocumentLanguageFixer {
    const MATCHER: IssueMatcher =
        IssueMatcher::new(&["html-has-lang", "valid-lang", "epub-lang"], &[]);
}

fn package_language(ctx: &ProcessingContext) -> String {
    ctx.metadata
        .language
        .as_deref()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_string()
}

fn lang_updates(el: &ElementView, lang: &str, overwrite: bool) -> Option<Vec<(String, String)>> {
    let mut updates = Vec::new();
    for attr in ["lang", "xml:lang"] {
        let current = el.attr(attr).map(str::trim);
        let keep = match current {
            Some(value) if value == lang => true,
            Some(value) => !overwrite && !value.is_empty(),
            None => false,
        };
        if !keep {
            updates.push((attr.to_string(), lang.to_string()));
        }
    }
    (!updates.is_empty()).then_some(updates)
}

impl FixStrategy for DocumentLanguageFixer {
    fn name(&self) -> &'static str {
        "document-language"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        let lang = package_language(ctx);

        if issue.code == "epub-lang" {
            let mut changed_files = Vec::new();

            let path = ctx.package_path.clone();
            let mut markup = ctx.load_markup(&path)?;
            if !xml_has_element(markup.source(), "language") {
                let fragment = format!("<dc:language>{}</dc:language>", escape_text(&lang));
                if markup.insert_into("metadata", &fragment)? {
                    ctx.save_markup(&path, markup)?;
                    changed_files.push(path);
                }
            }

            // One declaration covers the package, but readers look at each
            // content document too.
            for doc_path in ctx.content_documents() {
                let mut markup = ctx.load_markup(&doc_path)?;
                let changed =
                    markup.edit_elements(Some("html"), |el| lang_updates(el, &lang, false))?;
                if changed > 0 {
                    ctx.save_markup(&doc_path, markup)?;
                    changed_files.push(doc_path);
                }
            }

            if changed_files.is_empty() {
                return Ok(FixResult::unchanged(
                    self.name(),
                    "package and content documents already declare a language",
                ));
            }
            return Ok(FixResult::applied(
                self.name(),
                format!("declared language \"{lang}\" in {} file(s)", changed_files.len()),
                changed_files,
            ));
        }

        let path = ctx.issue_target(issue)?;
        let mut markup = ctx.load_markup(&path)?;

        // valid-lang means the value is wrong, so overwrite; the other
        // codes only fill in what is missing or empty.
        let overwrite = issue.code == "valid-lang";
        let changed = markup.edit_elements(Some("html"), |el| lang_updates(el, &lang, overwrite))?;

        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("{path} already carries language attributes"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("set lang=\"{lang}\" on the html element of {path}"),
            vec![path],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testutil::{context_with_doc, issue, stored_text};

    #[test]
    fn fills_missing_lang_attributes() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"><head/><body/></html>",
        );
        ctx.metadata.language = Some("fr".to_string());
        let report = issue("html-has-lang", "<html> element must have a lang attribute", "ch1.xhtml");

        let result = DocumentLanguageFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        let text = stored_text(&ctx, "OEBPS/ch1.xhtml");
        assert!(text.contains("lang=\"fr\""));
        assert!(text.contains("xml:lang=\"fr\""));
    }

    #[test]
    fn present_lang_is_left_alone_for_missing_lang_reports() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html lang=\"de\" xml:lang=\"de\"><body/></html>",
        );
        let report = issue("html-has-lang", "", "ch1.xhtml");

        let result = DocumentLanguageFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!result.success);
        assert!(stored_text(&ctx, "OEBPS/ch1.xhtml").contains("lang=\"de\""));
    }

    #[test]
    fn valid_lang_overwrites_a_bad_value() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html lang=\"xx-bogus\"><body/></html>",
        );
        ctx.metadata.language = Some("en".to_string());
        let report = issue("valid-lang", "lang attribute has an invalid value", "ch1.xhtml");

        let result = DocumentLanguageFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        let text = stored_text(&ctx, "OEBPS/ch1.xhtml");
        assert!(text.contains("lang=\"en\""));
        assert!(!text.contains("xx-bogus"));
    }

    #[test]
    fn epub_lang_declares_dc_language_and_covers_content_documents() {
        let mut ctx = context_with_doc(
            "OEBPS/content.opf",
            "application/oebps-package+xml",
            "<package><metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\"><dc:title>T</dc:title></metadata></package>",
        );
        ctx.insert_document(epubfix_types::document::Document::text(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html><body/></html>",
        ));
        let report = issue("epub-lang", "package has no language", "content.opf");

        let result = DocumentLanguageFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert_eq!(
            result.changed_files,
            vec!["OEBPS/content.opf", "OEBPS/ch1.xhtml"]
        );
        assert!(stored_text(&ctx, "OEBPS/content.opf").contains("<dc:language>en</dc:language>"));
        assert!(stored_text(&ctx, "OEBPS/ch1.xhtml").contains("lang=\"en\""));

        // A second application sees the declarations and stands down.
        let again = DocumentLanguageFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!again.success);
    }
}
