use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_doc::query::xml_first_attr;
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// Removes the legacy `page-map` spine attribute and the manifest item it
/// points at. Accepts RSC-005 only when the message is actually about
/// page-map markup; everything else is declined for the generic handler.
pub struct PageMapFixer;

impl PageMapFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["RSC-005"], &["page-map"]);
}

impl FixStrategy for PageMapFixer {
    fn name(&self) -> &'static str {
        "page-map-cleanup"
    }

    fn matcher(&self) -> &'static IssueMatcher {
        &Self::MATCHER
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult> {
        // The defect lives in the package document even when the report
        // carries no usable location.
        let path = issue
            .file()
            .and_then(|file| ctx.resolve_path(file))
            .unwrap_or_else(|| ctx.package_path.clone());

        let mut markup = ctx.load_markup(&path)?;

        let map_id = xml_first_attr(markup.source(), "spine", "page-map");
        let removed_attrs =
            markup.strip_attrs(|el, attr| el.local_name() == "spine" && attr == "page-map")?;
        let mut removed_items = 0;
        if let Some(id) = &map_id {
            removed_items =
                markup.remove_elements_where("item", |el| el.attr("id") == Some(id.as_str()))?;
        }

        if removed_attrs + removed_items == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("no page-map markup left in {path}"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!(
                "removed page-map spine attribute and {removed_items} manifest item(s) from {path}"
            ),
            vec![path],
        )
        .with_details(serde_json::json!({
            "spine_attrs_removed": removed_attrs,
            "manifest_items_removed": removed_items,
        })))
    }
}
