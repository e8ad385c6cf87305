use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Gives links without discernible text an `aria-label` derived from their
/// target: the fragment id when the href carries one, otherwise the target
/// file's stem.
pub struct LinkNameFixer;

impl LinkNameFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["link-name"], &[]);
}

fn anchors(html: &Html) -> Vec<scraper::ElementRef<'_>> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a").expect("valid selector"));
    html.select(selector).collect()
}

fn has_discernible_text(el: &scraper::ElementRef<'_>) -> bool {
    let value = el.value();
    for attr in ["aria-label", "aria-labelledby", "title"] {
        if value.attr(attr).is_some_and(|v| !v.trim().is_empty()) {
            return true;
        }
    }
    if !el.text().collect::<String>().trim().is_empty() {
        return true;
    }
    // An image with alt text names the link too.
    static IMG: OnceLock<Selector> = OnceLock::new();
    let img = IMG.get_or_init(|| Selector::parse("img").expect("valid selector"));
    el.select(img)
        .any(|i| i.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty()))
}

fn label_from_target(href: Option<&str>) -> String {
    let href = href.unwrap_or("").trim();
    let (path, fragment) = href.split_once('#').unwrap_or((href, ""));
    let base = if !fragment.is_empty() {
        fragment
    } else {
        let file = path.rsplit('/').next().unwrap_or(path);
        file.split('.').next().unwrap_or(file)
    };
    let cleaned = base.replace(['-', '_'], " ").trim().to_string();
    if cleaned.is_empty() {
        "link".to_string()
    } else {
        cleaned
    }
}

impl FixStrategy for LinkNameFixer {
    fn name(&self) -> &'static str {
        "link-name"
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

        // Decide per anchor up front; the edit pass walks anchors in the
        // same document order.
        let labels: Vec<Option<String>> = {
            let html = Html::parse_document(markup.source());
            anchors(&html)
                .iter()
                .map(|a| {
                    (!has_discernible_text(a))
                        .then(|| label_from_target(a.value().attr("href")))
                })
                .collect()
        };

        let mut next = 0usize;
        let changed = markup.edit_elements(Some("a"), |el| {
            let label = labels.get(next).cloned().flatten();
            next += 1;
            match label {
                Some(label) if !el.has_attr("aria-label") => {
                    Some(vec![("aria-label".to_string(), label)])
                }
                _ => None,
            }
        })?;

        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("every link in {path} already has discernible text"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("labelled {changed} link(s) in {path}"),
            vec![path],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testutil::{context_with_doc, issue, stored_text};

    #[test]
    fn labels_come_from_the_target() {
        assert_eq!(label_from_target(Some("ch2.xhtml")), "ch2");
        assert_eq!(label_from_target(Some("text/back-matter.xhtml")), "back matter");
        assert_eq!(label_from_target(Some("ch2.xhtml#notes_1")), "notes 1");
        assert_eq!(label_from_target(Some("")), "link");
        assert_eq!(label_from_target(None), "link");
    }

    #[test]
    fn only_empty_links_are_labelled() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            concat!(
                "<html><body>",
                "<a href=\"ch2.xhtml\"></a>",
                "<a href=\"ch3.xhtml\">Chapter Three</a>",
                "<a href=\"ch4.xhtml\" aria-label=\"notes\"></a>",
                "</body></html>"
            ),
        );
        let report = issue("link-name", "links must have discernible text", "ch1.xhtml");

        let result = LinkNameFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert!(result.message.contains("1 link"));

        let text = stored_text(&ctx, "OEBPS/ch1.xhtml");
        assert!(text.contains("<a href=\"ch2.xhtml\" aria-label=\"ch2\"></a>"));
        assert!(text.contains("<a href=\"ch3.xhtml\">Chapter Three</a>"));
        assert!(text.contains("aria-label=\"notes\""));
    }

    #[test]
    fn an_image_link_with_alt_counts_as_named() {
        let mut ctx = context_with_doc(
            "OEBPS/ch1.xhtml",
            "application/xhtml+xml",
            "<html><body><a href=\"cover.xhtml\"><img src=\"cover.png\" alt=\"Cover\"/></a></body></html>",
        );
        let report = issue("link-name", "", "ch1.xhtml");

        let result = LinkNameFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!result.success);
        assert!(!ctx.document("OEBPS/ch1.xhtml").expect("doc").modified);
    }
}
