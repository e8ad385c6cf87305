//! Core fix and check pipelines.
//!
//! These entry points are I/O-agnostic: packages and reports come in through
//! the port traits, artifacts go out through [`WritePort`]. The engine runs
//! entirely in memory; persisting modified documents back to the package
//! directory is a separate, explicit step.

use crate::ports::{IssueSource, PackageSource, WritePort};
use crate::settings::{CheckSettings, FixSettings};
use anyhow::Context;
use chrono::Utc;
use diffy::PatchFormatter;
use epubfix_engine::{
    Dispatcher, DryRunPartition, FixEventSink, FixStrategy, NullSink, Orchestrator,
    ProcessingContext, builtin_strategies, glob_match, validate_modified,
};
use epubfix_issues::flatten_issues;
use epubfix_render::{render_check_md, render_fix_md};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::Severity;
use epubfix_types::report::{CheckReport, FixReport, RunInfo, ToolInfo};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of [`run_fix`].
pub struct FixOutcome {
    /// The mutated document set. Documents flagged `modified` have not been
    /// written anywhere yet.
    pub context: ProcessingContext,
    pub results: Vec<FixResult>,
    pub report: FixReport,
    pub patch: String,
    /// Error-severity issues are still unfixed; callers map this to exit 2.
    pub unresolved_errors: bool,
}

/// Run the fix pipeline: load the package and reports, apply repairs in
/// memory, re-check modified documents, and build the report artifacts.
pub fn run_fix(
    settings: &FixSettings,
    package: &dyn PackageSource,
    issues: &dyn IssueSource,
    sink: &dyn FixEventSink,
    tool: ToolInfo,
) -> anyhow::Result<FixOutcome> {
    let started = Utc::now();

    let mut ctx = package.load_package().context("load package")?;
    let loaded = issues.load_issues().context("load issue reports")?;
    for record in &loaded {
        if let Err(err) = &record.report {
            warn!(path = %record.path, %err, "skipping unreadable report");
        }
    }
    ctx.issues = flatten_issues(&loaded);

    apply_fix_cap(&mut ctx, settings.max_fixes);

    let originals = text_snapshot(&ctx);

    let dispatcher =
        Dispatcher::with_strategies(filtered_strategies(&settings.allow, &settings.deny));
    let orchestrator = Orchestrator::new(&dispatcher, sink);
    let results = orchestrator.run(&mut ctx);

    let post = validate_modified(&ctx);
    let patch = render_patch(&originals, &ctx);

    let ended = Utc::now();
    let mut report = FixReport::new(
        tool,
        RunInfo {
            started_at: Some(started),
            ended_at: Some(ended),
            duration_ms: Some((ended - started).num_milliseconds().max(0) as u64),
        },
    );
    report.summary.issues_total = ctx.issues.len() as u64;
    report.summary.attempted = results.len() as u64;
    report.summary.fixed = ctx.issues.iter().filter(|i| i.fixed).count() as u64;
    report.summary.failed = results.iter().filter(|r| !r.success).count() as u64;
    report.summary.unfixable = report.summary.issues_total - report.summary.fixed;
    report.summary.files_modified = ctx.contents.values().filter(|d| d.modified).count() as u64;
    report.results = results.clone();
    report.post_validation = Some(post);

    let unresolved_errors = ctx
        .issues
        .iter()
        .any(|i| i.severity == Severity::Error && !i.fixed);

    Ok(FixOutcome {
        context: ctx,
        results,
        report,
        patch,
        unresolved_errors,
    })
}

/// Write `fixes.json`, `fixes.md`, and `patch.diff` to the output directory.
pub fn write_fix_artifacts(
    outcome: &FixOutcome,
    out_dir: &camino::Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(&outcome.report).context("serialize fix report")?;
    writer.write_file(&out_dir.join("fixes.json"), json.as_bytes())?;
    writer.write_file(
        &out_dir.join("fixes.md"),
        render_fix_md(&outcome.report).as_bytes(),
    )?;
    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;
    Ok(())
}

/// Persist every modified document back under the package directory.
/// Returns the number of files written.
pub fn write_modified_documents(
    ctx: &ProcessingContext,
    package_dir: &camino::Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<u64> {
    let mut written = 0;
    for (path, document) in &ctx.contents {
        if !document.modified {
            continue;
        }
        let target = package_dir.join(path);
        match document.as_text() {
            Some(text) => writer.write_file(&target, text.as_bytes())?,
            None => continue,
        }
        debug!(%target, "wrote repaired document");
        written += 1;
    }
    Ok(written)
}

/// Outcome of [`run_check`].
pub struct CheckOutcome {
    pub partition: DryRunPartition,
    pub report: CheckReport,
    /// Error-severity issues have no strategy; callers map this to exit 2.
    pub unresolved_errors: bool,
}

/// Run the check pipeline: partition issues into fixable and unfixable
/// without applying anything.
pub fn run_check(
    settings: &CheckSettings,
    package: &dyn PackageSource,
    issues: &dyn IssueSource,
    tool: ToolInfo,
) -> anyhow::Result<CheckOutcome> {
    let started = Utc::now();

    let mut ctx = package.load_package().context("load package")?;
    let loaded = issues.load_issues().context("load issue reports")?;
    ctx.issues = flatten_issues(&loaded);

    let dispatcher =
        Dispatcher::with_strategies(filtered_strategies(&settings.allow, &settings.deny));
    let orchestrator = Orchestrator::new(&dispatcher, &NullSink);
    let partition = orchestrator.dry_run(&ctx);

    let ended = Utc::now();
    let mut report = CheckReport::new(
        tool,
        RunInfo {
            started_at: Some(started),
            ended_at: Some(ended),
            duration_ms: Some((ended - started).num_milliseconds().max(0) as u64),
        },
    );
    report.fixable = partition.fixable.clone();
    report.unfixable = partition.unfixable.clone();

    let unresolved_errors = partition
        .unfixable
        .iter()
        .any(|i| i.severity == Severity::Error && !i.fixed);

    Ok(CheckOutcome {
        partition,
        report,
        unresolved_errors,
    })
}

/// Write `check.json` and `check.md` to the output directory.
pub fn write_check_artifacts(
    outcome: &CheckOutcome,
    out_dir: &camino::Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(&outcome.report).context("serialize check report")?;
    writer.write_file(&out_dir.join("check.json"), json.as_bytes())?;
    writer.write_file(
        &out_dir.join("check.md"),
        render_check_md(&outcome.report).as_bytes(),
    )?;
    Ok(())
}

/// Builtin strategies narrowed by allow/deny name patterns. An empty allow
/// list keeps everything; deny wins over allow.
fn filtered_strategies(allow: &[String], deny: &[String]) -> Vec<Box<dyn FixStrategy>> {
    builtin_strategies()
        .into_iter()
        .filter(|s| {
            let name = s.name();
            let allowed = allow.is_empty() || allow.iter().any(|p| glob_match(p, name));
            let denied = deny.iter().any(|p| glob_match(p, name));
            allowed && !denied
        })
        .collect()
}

/// Mark fixable candidates beyond the cap unfixable so the orchestrator
/// never dispatches them.
fn apply_fix_cap(ctx: &mut ProcessingContext, max_fixes: Option<u64>) {
    let Some(cap) = max_fixes else { return };
    let mut budget = cap;
    let mut capped = 0u64;
    for issue in ctx.issues.iter_mut() {
        if !issue.fixable || issue.fixed {
            continue;
        }
        if budget == 0 {
            issue.fixable = false;
            capped += 1;
        } else {
            budget -= 1;
        }
    }
    if capped > 0 {
        debug!(cap, capped, "fix cap left issues undispatched");
    }
}

fn text_snapshot(ctx: &ProcessingContext) -> BTreeMap<String, String> {
    ctx.contents
        .iter()
        .filter_map(|(path, doc)| doc.as_text().map(|t| (path.clone(), t.to_string())))
        .collect()
}

/// Unified diff over every modified text document, `diff --git` style.
fn render_patch(before: &BTreeMap<String, String>, ctx: &ProcessingContext) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (path, document) in &ctx.contents {
        if !document.modified {
            continue;
        }
        let Some(new) = document.as_text() else {
            continue;
        };
        let old = before.get(path).map(String::as_str).unwrap_or("");
        if old == new {
            continue;
        }

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));
        let patch = diffy::create_patch(old, new);
        out.push_str(&formatter.fmt_patch(&patch).to_string());
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}
