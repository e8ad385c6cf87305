use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Renumbers headings so no level is skipped on the way down: an `h4`
/// directly under an `h2` becomes an `h3`. The first heading keeps its
/// level; only forward jumps are clamped. Each file needs its own look at
/// the text, so this category never propagates across files.
pub struct HeadingOrderFixer;

impl HeadingOrderFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["heading-order"], &[]);
}

fn heading_levels(html: &Html) -> Vec<u8> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector =
        SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector"));
    html.select(selector)
        .filter_map(|el| el.value().name().strip_prefix('h'))
        .filter_map(|digit| digit.parse::<u8>().ok())
        .collect()
}

/// Clamp every level to at most one below its predecessor's target.
fn normalized_levels(current: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len());
    let mut prev: Option<u8> = None;
    for &level in current {
        let target = match prev {
            Some(p) if level > p + 1 => p + 1,
            _ => level,
        };
        out.push(target);
        prev = Some(target);
    }
    out
}

impl FixStrategy for HeadingOrderFixer {
    fn name(&self) -> &'static str {
        "heading-order"
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

        let current = heading_levels(&Html::parse_document(markup.source()));
        let targets = normalized_levels(&current);
        if current == targets {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("heading levels in {path} are already in order"),
            ));
        }

        let changed = markup.renumber_headings(&targets)?;
        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("no headings renumbered in {path}"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("renumbered {changed} heading(s) in {path}"),
            vec![path],
        ))
    }
}
