use crate::context::ProcessingContext;
use crate::strategies::epub_type_role::role_for_epub_type;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_doc::ElementView;
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use std::collections::BTreeMap;

/// Disambiguates repeated landmarks with `aria-label`. A landmark is a
/// `nav`-family element, an element with a landmark or `doc-*` role, or an
/// element whose `epub:type` maps onto one. Duplicate banners are the
/// special case: a page gets one banner, so extras are demoted to labelled
/// regions instead of merely named.
pub struct LandmarkFixer;

impl LandmarkFixer {
    const MATCHER: IssueMatcher =
        IssueMatcher::new(&["landmark-unique", "landmark-no-duplicate-banner"], &[]);
}

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "complementary",
    "contentinfo",
    "form",
    "main",
    "navigation",
    "region",
    "search",
];

/// Landmark identity of an element, if it has one. An explicit role always
/// wins over the tag's implicit role and over `epub:type`.
fn landmark_key(el: &ElementView) -> Option<String> {
    if let Some(role) = el.attr("role") {
        let role = role.trim();
        if LANDMARK_ROLES.iter().any(|r| role.eq_ignore_ascii_case(r)) || role.starts_with("doc-") {
            return Some(role.to_ascii_lowercase());
        }
        return None;
    }
    match el.local_name().to_ascii_lowercase().as_str() {
        "nav" => return Some("navigation".to_string()),
        "header" => return Some("banner".to_string()),
        "footer" => return Some("contentinfo".to_string()),
        "main" => return Some("main".to_string()),
        "aside" => return Some("complementary".to_string()),
        _ => {}
    }
    el.attr("epub:type")
        .and_then(role_for_epub_type)
        .map(str::to_string)
}

fn label_for(key: &str, ordinal: usize) -> String {
    let base = key.strip_prefix("doc-").unwrap_or(key).replace('-', " ");
    format!("{base} {ordinal}")
}

impl FixStrategy for LandmarkFixer {
    fn name(&self) -> &'static str {
        "landmark-unique"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        let demote_extra_banners = issue.code == "landmark-no-duplicate-banner";
        let path = ctx.issue_target(issue)?;
        let mut markup = ctx.load_markup(&path)?;

        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let changed = markup.edit_elements(None, |el| {
            let key = landmark_key(el)?;
            let count = seen.entry(key.clone()).or_insert(0);
            *count += 1;
            // The first occurrence of each landmark keeps its identity.
            if *count == 1 || el.has_attr("aria-label") || el.has_attr("aria-labelledby") {
                return None;
            }
            let mut updates = vec![("aria-label".to_string(), label_for(&key, *count))];
            if demote_extra_banners && key == "banner" {
                updates.push(("role".to_string(), "region".to_string()));
            }
            Some(updates)
        })?;

        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("no ambiguous landmarks left in {path}"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("disambiguated {changed} landmark(s) in {path}"),
            vec![path],
        ))
    }
}
