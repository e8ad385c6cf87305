use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use regex::Regex;
use std::sync::OnceLock;

/// Generic RSC-005 repair for "attribute X not allowed" reports: parses the
/// offending attribute name out of the message and strips every occurrence
/// in the located file.
pub struct InvalidAttributeFixer;

impl InvalidAttributeFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["RSC-005"], &["not allowed"]);
}

fn attribute_in_message(message: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"attribute "([^"]+)" not allowed"#).expect("attribute pattern")
    });
    re.captures(message).map(|caps| caps[1].to_string())
}

impl FixStrategy for InvalidAttributeFixer {
    fn name(&self) -> &'static str {
        "invalid-attribute"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        let Some(attribute) = attribute_in_message(&issue.message) else {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("could not extract an attribute name from: {}", issue.message),
            ));
        };

        let path = ctx.issue_target(issue)?;
        let mut markup = ctx.load_markup(&path)?;
        let removed = markup.strip_attrs(|_, attr| attr == attribute)?;

        if removed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("attribute \"{attribute}\" not present in {path}"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("removed {removed} occurrence(s) of attribute \"{attribute}\" from {path}"),
            vec![path],
        )
        .with_details(serde_json::json!({
            "attribute": attribute,
            "removed": removed,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testutil::{context_with_doc, issue, stored_text};
    use crate::strategy::Acceptance;

    const XHTML: &str = concat!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\">\n",
        "<body><ol hidden=\"hidden\"><li hidden=\"hidden\">a</li><li>b</li></ol></body>\n",
        "</html>\n"
    );

    #[test]
    fn parses_the_attribute_out_of_the_message() {
        assert_eq!(
            attribute_in_message("attribute \"hidden\" not allowed here").as_deref(),
            Some("hidden")
        );
        assert_eq!(
            attribute_in_message("attribute \"epub:type\" not allowed here; expected ...")
                .as_deref(),
            Some("epub:type")
        );
        assert_eq!(attribute_in_message("element \"x\" not allowed"), None);
    }

    #[test]
    fn strips_every_occurrence() {
        let mut ctx = context_with_doc("OEBPS/ch1.xhtml", "application/xhtml+xml", XHTML);
        let report = issue("RSC-005", "attribute \"hidden\" not allowed here", "ch1.xhtml");

        let result = InvalidAttributeFixer.apply(&report, &mut ctx).expect("apply");
        assert!(result.success);
        assert!(result.message.contains("2 occurrence"));
        assert_eq!(
            result.details.as_ref().and_then(|d| d["attribute"].as_str()),
            Some("hidden")
        );
        assert!(!stored_text(&ctx, "OEBPS/ch1.xhtml").contains("hidden"));
    }

    #[test]
    fn unparseable_message_is_a_plain_non_fix() {
        let mut ctx = context_with_doc("OEBPS/ch1.xhtml", "application/xhtml+xml", XHTML);
        let report = issue("RSC-005", "element \"ol\" not allowed here", "ch1.xhtml");

        let result = InvalidAttributeFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!result.success);
        assert!(!ctx.document("OEBPS/ch1.xhtml").expect("doc").modified);
    }

    #[test]
    fn absent_attribute_reports_unchanged() {
        let mut ctx = context_with_doc("OEBPS/ch1.xhtml", "application/xhtml+xml", XHTML);
        let report = issue("RSC-005", "attribute \"onclick\" not allowed here", "ch1.xhtml");

        let result = InvalidAttributeFixer.apply(&report, &mut ctx).expect("apply");
        assert!(!result.success);
        assert!(result.message.contains("onclick"));
    }

    #[test]
    fn declines_messages_about_other_defects() {
        let report = issue("RSC-005", "element \"section\" incomplete", "ch1.xhtml");
        assert_eq!(InvalidAttributeFixer.accept(&report), Acceptance::Declines);
    }
}
