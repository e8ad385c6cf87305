use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_doc::escape_text;
use epubfix_doc::query::xml_attr_values;
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// Adds missing schema.org accessibility metadata to the package document.
/// One application per property; the whole package is covered, so these
/// codes propagate globally.
pub struct AccessibilityMetadataFixer;

impl AccessibilityMetadataFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["metadata-*"], &[]);
}

/// (code suffix, property, default value) — defaults describe the package
/// structurally, they make no claim a reviewer hasn't verified.
const PROPERTIES: &[(&str, &str, &str)] = &[
    ("accessmode", "schema:accessMode", "textual"),
    ("accessmodesufficient", "schema:accessModeSufficient", "textual"),
    (
        "accessibilityfeature",
        "schema:accessibilityFeature",
        "structuralNavigation",
    ),
    ("accessibilityhazard", "schema:accessibilityHazard", "none"),
    (
        "accessibilitysummary",
        "schema:accessibilitySummary",
        "This publication includes structural navigation markup.",
    ),
];

fn property_for_code(code: &str) -> Option<(&'static str, &'static str)> {
    let suffix = code.strip_prefix("metadata-")?.to_ascii_lowercase();
    PROPERTIES
        .iter()
        .find(|(key, _, _)| *key == suffix)
        .map(|(_, property, value)| (*property, *value))
}

impl FixStrategy for AccessibilityMetadataFixer {
    fn name(&self) -> &'static str {
        "accessibility-metadata"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        let Some((property, default)) = property_for_code(&issue.code) else {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("no metadata default known for code {}", issue.code),
            ));
        };

        let path = ctx.package_path.clone();
        let mut markup = ctx.load_markup(&path)?;

        let declared = xml_attr_values(markup.source(), "meta", "property");
        if declared.iter().any(|p| p == property) {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("{property} already declared in {path}"),
            ));
        }

        let fragment = format!(
            "<meta property=\"{property}\">{}</meta>",
            escape_text(default)
        );
        if !markup.insert_into("metadata", &fragment)? {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("{path} has no metadata element to extend"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("declared {property} = \"{default}\" in {path}"),
            vec![path],
        ))
    }
}
