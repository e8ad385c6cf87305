//! Rendering helpers (markdown) for human-readable artifacts.

use epubfix_types::issue::ValidationIssue;
use epubfix_types::report::{CheckReport, FixReport};

pub fn render_fix_md(report: &FixReport) -> String {
    let mut out = String::new();
    out.push_str("# epubfix fix\n\n");
    out.push_str(&format!(
        "- Issues: {} (attempted {})\n",
        report.summary.issues_total, report.summary.attempted
    ));
    out.push_str(&format!(
        "- Fixed: {} (failed {}, unfixable {})\n",
        report.summary.fixed, report.summary.failed, report.summary.unfixable
    ));
    out.push_str(&format!(
        "- Files modified: {}\n\n",
        report.summary.files_modified
    ));

    out.push_str("## Results\n\n");
    if report.results.is_empty() {
        out.push_str("_No repairs attempted._\n");
    }
    for (i, r) in report.results.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, r.strategy));
        out.push_str(&format!(
            "- Outcome: `{}`\n",
            if r.success { "applied" } else { "unchanged" }
        ));
        out.push_str(&format!("- Message: {}\n", r.message));
        if !r.changed_files.is_empty() {
            out.push_str("\n**Files changed**\n\n");
            for path in &r.changed_files {
                out.push_str(&format!("- `{}`\n", path));
            }
        }
        out.push('\n');
    }

    if let Some(post) = &report.post_validation {
        out.push_str("## Post-validation\n\n");
        out.push_str(&format!(
            "- Re-parsed: {} modified file(s)\n",
            post.validated_files.len() + post.errors.len()
        ));
        if post.errors.is_empty() {
            out.push_str("- All modified files are still well-formed.\n");
        } else {
            out.push_str("\n**Failures**\n\n");
            for failure in &post.errors {
                out.push_str(&format!("- `{}`: {}\n", failure.path, failure.error));
            }
        }
    }

    out
}

pub fn render_check_md(report: &CheckReport) -> String {
    let mut out = String::new();
    out.push_str("# epubfix check\n\n");
    out.push_str(&format!(
        "- Fixable: {}\n- Unfixable: {}\n\n",
        report.fixable.len(),
        report.unfixable.len()
    ));

    out.push_str("## Fixable\n\n");
    if report.fixable.is_empty() {
        out.push_str("_Nothing to repair._\n");
    }
    for assignment in &report.fixable {
        out.push_str(&format!(
            "- `{}` {} — `{}`\n",
            assignment.issue.code,
            issue_location(&assignment.issue),
            assignment.strategy
        ));
    }
    out.push('\n');

    out.push_str("## Unfixable\n\n");
    if report.unfixable.is_empty() {
        out.push_str("_None._\n");
    }
    for issue in &report.unfixable {
        out.push_str(&format!(
            "- `{}` {} — {}\n",
            issue.code,
            issue_location(issue),
            truncated(&issue.message)
        ));
    }

    out
}

fn issue_location(issue: &ValidationIssue) -> String {
    match &issue.location {
        Some(loc) => match loc.line {
            Some(line) => format!("at `{}:{}`", loc.file, line),
            None => format!("at `{}`", loc.file),
        },
        None => "(no location)".to_string(),
    }
}

fn truncated(message: &str) -> &str {
    match message.char_indices().nth(120) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}
