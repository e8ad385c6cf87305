use crate::context::ProcessingContext;
use crate::strategy::{FixStrategy, IssueMatcher};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// Adds `alt=""` to images that have no alt attribute at all. An empty alt
/// marks the image decorative, which is a structural repair only — writing
/// a real description needs a human (or a pipeline this tool does not own).
pub struct ImageAltFixer;

impl ImageAltFixer {
    const MATCHER: IssueMatcher = IssueMatcher::new(&["image-alt"], &[]);
}

impl FixStrategy for ImageAltFixer {
    fn name(&self) -> &'static str {
        "image-alt"
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

        let changed = markup.edit_elements(Some("img"), |el| {
            (!el.has_attr("alt")).then(|| vec![("alt".to_string(), String::new())])
        })?;

        if changed == 0 {
            return Ok(FixResult::unchanged(
                self.name(),
                format!("every img in {path} already has an alt attribute"),
            ));
        }

        ctx.save_markup(&path, markup)?;
        Ok(FixResult::applied(
            self.name(),
            format!("added empty alt to {changed} image(s) in {path}"),
            vec![path],
        ))
    }
}
