mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use epubfix_core::adapters::{FsIssueSource, FsPackageSource, FsWritePort};
use epubfix_core::pipeline::{
    run_check, run_fix, write_check_artifacts, write_fix_artifacts, write_modified_documents,
};
use epubfix_core::settings::{CheckSettings, FixSettings};
use epubfix_core::TracingSink;
use epubfix_engine::Dispatcher;
use epubfix_types::report::ToolInfo;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "epubfix",
    version,
    about = "Repairs machine-reported accessibility and structural defects in EPUB packages."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply repairs to an extracted package and write report artifacts.
    Fix(FixArgs),
    /// Partition reported issues into fixable and unfixable, without mutating.
    Check(CheckArgs),
    /// List the registered repair strategies in dispatch order.
    ListStrategies(ListStrategiesArgs),
}

#[derive(Debug, Parser)]
struct FixArgs {
    /// Extracted package root, the directory holding META-INF/ (default: current directory).
    #[arg(long, default_value = ".")]
    package_dir: Utf8PathBuf,

    /// Directory containing validator report JSON files (default: <package_dir>/reports).
    #[arg(long)]
    reports_dir: Option<Utf8PathBuf>,

    /// Output directory for epubfix artifacts (default: <package_dir>/artifacts/epubfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Allowlist patterns for strategy names.
    #[arg(long)]
    allow: Vec<String>,

    /// Denylist patterns for strategy names.
    #[arg(long)]
    deny: Vec<String>,

    /// Maximum number of repairs dispatched in this run.
    #[arg(long)]
    max_fixes: Option<u64>,

    /// Build artifacts only; do not write repaired documents back.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// Extracted package root (default: current directory).
    #[arg(long, default_value = ".")]
    package_dir: Utf8PathBuf,

    /// Directory containing validator report JSON files (default: <package_dir>/reports).
    #[arg(long)]
    reports_dir: Option<Utf8PathBuf>,

    /// Output directory for epubfix artifacts (default: <package_dir>/artifacts/epubfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Allowlist patterns for strategy names.
    #[arg(long)]
    allow: Vec<String>,

    /// Denylist patterns for strategy names.
    #[arg(long)]
    deny: Vec<String>,
}

#[derive(Debug, Parser)]
struct ListStrategiesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Fix(args) => cmd_fix(args),
        Command::Check(args) => cmd_check(args),
        Command::ListStrategies(args) => cmd_list_strategies(args),
    }
}

fn cmd_fix(args: FixArgs) -> anyhow::Result<ExitCode> {
    let package_dir = args.package_dir;
    let reports_dir = args
        .reports_dir
        .unwrap_or_else(|| package_dir.join("reports"));
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| package_dir.join("artifacts/epubfix"));

    let file_config = config::load_or_default(&package_dir).context("load epubfix.toml config")?;
    let policy = config::merge_policy(file_config, &args.allow, &args.deny, args.max_fixes);

    let settings = FixSettings {
        package_dir: package_dir.clone(),
        reports_dir: reports_dir.clone(),
        out_dir: out_dir.clone(),
        allow: policy.allow,
        deny: policy.deny,
        max_fixes: policy.max_fixes,
        dry_run: args.dry_run,
    };

    let package = FsPackageSource::new(package_dir.clone());
    let issues = FsIssueSource::new(reports_dir);
    let writer = FsWritePort;

    let outcome = run_fix(&settings, &package, &issues, &TracingSink, tool_info())?;
    write_fix_artifacts(&outcome, &out_dir, &writer)?;

    if settings.dry_run {
        info!("dry-run: repaired documents not written back");
    } else {
        let written = write_modified_documents(&outcome.context, &package_dir, &writer)?;
        info!(written, "wrote repaired documents to {}", package_dir);
    }
    info!("wrote fix artifacts to {}", out_dir);

    Ok(exit_for(outcome.unresolved_errors))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let package_dir = args.package_dir;
    let reports_dir = args
        .reports_dir
        .unwrap_or_else(|| package_dir.join("reports"));
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| package_dir.join("artifacts/epubfix"));

    let file_config = config::load_or_default(&package_dir).context("load epubfix.toml config")?;
    let policy = config::merge_policy(file_config, &args.allow, &args.deny, None);

    let settings = CheckSettings {
        package_dir: package_dir.clone(),
        reports_dir: reports_dir.clone(),
        out_dir: out_dir.clone(),
        allow: policy.allow,
        deny: policy.deny,
    };

    let package = FsPackageSource::new(package_dir);
    let issues = FsIssueSource::new(reports_dir);

    let outcome = run_check(&settings, &package, &issues, tool_info())?;
    write_check_artifacts(&outcome, &out_dir, &FsWritePort)?;
    info!(
        fixable = outcome.partition.fixable.len(),
        unfixable = outcome.partition.unfixable.len(),
        "wrote check artifacts to {}",
        out_dir
    );

    Ok(exit_for(outcome.unresolved_errors))
}

fn cmd_list_strategies(args: ListStrategiesArgs) -> anyhow::Result<ExitCode> {
    let dispatcher = Dispatcher::builtin();
    match args.format {
        OutputFormat::Text => {
            println!("Registered strategies, dispatch order:\n");
            println!("  {:<26} CODES", "NAME");
            println!("  {:<26} -----", "----");
            for strategy in dispatcher.strategies() {
                println!(
                    "  {:<26} {}",
                    strategy.name(),
                    strategy.handled_codes().join(", ")
                );
            }
            println!();
            println!("Use --allow/--deny with these names to narrow a run.");
        }
        OutputFormat::Json => {
            let strategies: Vec<_> = dispatcher
                .strategies()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name(),
                        "codes": s.handled_codes(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&strategies)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// 0 = done, 2 = error-severity issues remain unrepaired.
fn exit_for(unresolved_errors: bool) -> ExitCode {
    if unresolved_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "epubfix".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
