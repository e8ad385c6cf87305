use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_doc::escape_text;
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use scraper::{Html, Selector};

/// Gives a content document a `<title>`, taking the text from its first
/// heading, then the package title, then the file name.
pub struct DocumentTitleFixer;

impl DocumentTitleFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["document-title"], &[]);
}

fn existing_title(html: &Html) -> Option<String> {
    static SELECTOR: std::sync::OnceLock<Selector> = std::sync::OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("head > title").expect("valid selector"));
    html.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn first_heading(html: &Html) -> Option<String> {
    static SELECTOR: std::sync::OnceLock<Selector> = std::sync::OnceLock::new();
    let selector =
        SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector"));
    html.select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

fn title_from_path(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    let cleaned = stem.replace(['-', '_'], " ").trim().to_string();
    if cleaned.is_empty() {
        "Untitled".to_string()
    } else {
        cleaned
    }
}

impl FixStrategy for DocumentTitleFixer {
    fn name(&self) -> &'static str {
        "document-title"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        let path = ctx.issue_target(issue)?;
        let mut markup = ctx.load_markup(&path)?;

        let html = Html::parse_document(markup.source());
        if matches!(existing_title(&html), Some(text) if !text.is_empty()) {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("{path} already has a non-empty title"),
            ));
        }

        let text = first_heading(&html)
            .or_else(|| ctx.metadata.title.clone())
            .unwrap_or_else(|| title_from_path(&path));

        let fragment = format!("<title>{}</title>", escape_text(&text));
        if !markup.insert_into("head", &fragment)? {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("{path} has no head element"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("inserted <title>{text}</title> into {path}"),
            vec![path],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testutil::{context_with_doc, issue, stored_text};

    #[test]
    fn takes_the_title_from_the_first_heading() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html><head><meta charset=\"utf-8\"/></head><body><h1>Chapter One</h1></body></html>",
        );
        let report = issue("document-title", "document has no title", "ch1.xhtml");

        let result = DocumentTitleFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert!(stored_text(&ctx, "OEBPS/ch1.xhtml").contains("<title>Chapter One</title>"));
    }

    #[test]
    fn falls_back_to_package_title_then_file_name() {
        let mut ctx = context_with_doc(
            "OEBPS/front-matter.xhtml",
            "application/xhtml+xml",
            "<html><head/><body><p>no headings</p></body></html>",
        );
        ctx.metadata.title = Some("The Book".to_string());
        let report = issue("document-title", "", "front-matter.xhtml");

        let result = DocumentTitleFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert!(stored_text(&ctx, "OEBPS/front-matter.xhtml").contains("<title>The Book</title>"));

        assert_eq!(title_from_path("OEBPS/front-matter.xhtml"), "front matter");
    }

    #[test]
    fn existing_title_is_respected() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html><head><title>Kept</title></head><body/></html>",
        );
        let report = issue("document-title", "", "ch1.xhtml");

        let result = DocumentTitleFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!result.success);
        assert!(stored_text(&ctx, "OEBPS/ch1.xhtml").contains("<title>Kept</title>"));
    }

    #[test]
    fn heading_text_is_escaped() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html><head/><body><h1>Q &amp; A</h1></body></html>",
        );
        let report = issue("document-title", "", "ch1.xhtml");

        let result = DocumentTitleFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert!(stored_text(&ctx, "OEBPS/ch1.xhtml").contains("<title>Q &amp; A</title>"));
    }
}
