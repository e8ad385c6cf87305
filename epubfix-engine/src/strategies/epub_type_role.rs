use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// Adds the ARIA `role` matching an element's `epub:type`, so assistive
/// technology sees the structure the publisher already marked up.
pub struct EpubTypeRoleFixer;

impl EpubTypeRoleFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["epub-type-has-matching-role"], &[]);
}

/// DPUB-ARIA mapping, epub:type vocabulary token to role. Tokens without a
/// row have no defined role and are left alone.
const EPUB_TYPE_ROLES: &[(&str, &str)] = &[
    ("abstract", "doc-abstract"),
    ("acknowledgments", "doc-acknowledgments"),
    ("afterword", "doc-afterword"),
    ("appendix", "doc-appendix"),
    ("backlink", "doc-backlink"),
    ("biblioentry", "doc-biblioentry"),
    ("bibliography", "doc-bibliography"),
    ("biblioref", "doc-biblioref"),
    ("chapter", "doc-chapter"),
    ("colophon", "doc-colophon"),
    ("conclusion", "doc-conclusion"),
    ("cover", "doc-cover"),
    ("credit", "doc-credit"),
    ("credits", "doc-credits"),
    ("dedication", "doc-dedication"),
    ("endnote", "doc-endnote"),
    ("endnotes", "doc-endnotes"),
    ("epigraph", "doc-epigraph"),
    ("epilogue", "doc-epilogue"),
    ("errata", "doc-errata"),
    ("footnote", "doc-footnote"),
    ("foreword", "doc-foreword"),
    ("glossary", "doc-glossary"),
    ("glossdef", "definition"),
    ("glossref", "doc-glossref"),
    ("glossterm", "term"),
    ("index", "doc-index"),
    ("introduction", "doc-introduction"),
    ("noteref", "doc-noteref"),
    ("notice", "doc-notice"),
    ("pagebreak", "doc-pagebreak"),
    ("page-list", "doc-pagelist"),
    ("part", "doc-part"),
    ("preface", "doc-preface"),
    ("prologue", "doc-prologue"),
    ("pullquote", "doc-pullquote"),
    ("qna", "doc-qna"),
    ("subtitle", "doc-subtitle"),
    ("tip", "doc-tip"),
    ("toc", "doc-toc"),
];

/// Role for the first mapped token in a space-separated `epub:type` value.
pub(crate) fn role_for_epub_type(value: &str) -> Option<&'static str> {
    value.split_whitespace().find_map(|token| {
        EPUB_TYPE_ROLES
            .iter()
            .find(|(t, _)| token.eq_ignore_ascii_case(t))
            .map(|(_, role)| *role)
    })
}

impl FixStrategy for EpubTypeRoleFixer {
    fn name(&self) -> &'static str {
        "epub-type-role"
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

        let changed = markup.edit_elements(None, |el| {
            if el.has_attr("role") {
                return None;
            }
            let role = el.attr("epub:type").and_then(role_for_epub_type)?;
            Some(vec![("role".to_string(), role.to_string())])
        })?;

        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("no epub:type in {path} needs a role"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("added matching role to {changed} element(s) in {path}"),
            vec![path],
        ))
    }
}
