//! repotidy - find redundancy in a source tree and clean it up in two steps.
//!
//! Usage:
//!   repotidy plan [PATH]     Scan, analyze and write .repotidy/plan.json + report.md
//!   repotidy apply [PATH]    Apply a previously written plan
//!   repotidy verify [PATH]   Check that an applied plan took effect
//!   repotidy revert [PATH]   Undo the moves and archives of the last apply
//!   repotidy --help          Show help

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};

use repotidy_core::{Classifier, TidyConfig};
use repotidy_ops::{
    ApplyEvent, ApplyReport, ConflictResolution, Journal, PlanExecutor, StdFileSystem,
    default_journal_path, revert, verify_plan,
};
use repotidy_plan::{PlanBuilder, default_plan_path, load_plan, write_artifacts};
use repotidy_scan::{ScanProgress, TreeWalker};

#[derive(Parser)]
#[command(
    name = "repotidy",
    version,
    about = "Find redundancy in a source tree and produce a reviewable cleanup plan",
    long_about = "repotidy scans a repository, classifies every file, finds duplicate \
                  content and unreferenced components, and writes a cleanup plan.\n\n\
                  Review .repotidy/report.md, then run `repotidy apply` to carry it out."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). REPOTIDY_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a tree and write a cleanup plan and report
    Plan {
        /// Root of the tree to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file (defaults to <PATH>/repotidy.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Do not print scan progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Apply a cleanup plan
    Apply {
        /// Root the plan's paths are relative to
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Plan document (defaults to <PATH>/.repotidy/plan.json)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Send deleted files to the trash
        #[arg(long)]
        trash: bool,

        /// What to do when a target already exists
        #[arg(long, default_value = "fail")]
        on_conflict: ConflictPolicy,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that every action of an applied plan took effect
    Verify {
        /// Root the plan's paths are relative to
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Plan document (defaults to <PATH>/.repotidy/plan.json)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Undo the moves and archives recorded by the last apply
    Revert {
        /// Root the journal was written under
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictPolicy {
    Fail,
    AutoRename,
}

impl From<ConflictPolicy> for ConflictResolution {
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::Fail => Self::Fail,
            ConflictPolicy::AutoRename => Self::AutoRename,
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Plan {
            path,
            config,
            format,
            quiet,
        } => run_plan(&path, config.as_deref(), format, quiet),
        Command::Apply {
            path,
            plan,
            trash,
            on_conflict,
            format,
        } => run_apply(&path, plan, trash, on_conflict.into(), format),
        Command::Verify { path, plan, format } => run_verify(&path, plan, format),
        Command::Revert { path } => run_revert(&path),
    }
}

/// Scan, analyze, and write the plan artifacts.
fn run_plan(
    path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let config = TidyConfig::discover(&root, config_path).context("Invalid configuration")?;
    let classifier = Classifier::new(config.rules.clone()).context("Invalid classification rules")?;

    eprintln!("Scanning {}...", root.display());

    let walker = TreeWalker::new();
    let progress = (!quiet).then(|| spawn_progress_printer(walker.subscribe()));
    let files = walker
        .scan(&config.scan_config(&root), &classifier)
        .context("Scan failed")?;
    drop(walker);
    if let Some(handle) = progress {
        let _ = handle.join();
    }

    let plan = PlanBuilder::new(&config.plan).plan(&files);
    let artifacts = write_artifacts(&plan, &root).context("Failed to write plan")?;

    match format {
        OutputFormat::Text => {
            let summary = &plan.summary;
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} - {} files, {}",
                root.display(),
                summary.total_files,
                format_size(summary.total_bytes)
            );
            println!(" Scanned in {:.2}s", files.scan_duration.as_secs_f64());
            println!("{}", "─".repeat(60));
            println!();

            let categories: Vec<String> = summary
                .by_category
                .iter()
                .map(|(category, count)| format!("{category} {count}"))
                .collect();
            println!(" By category:      {}", categories.join(", "));
            println!(
                " Duplicate groups: {} ({} redundant)",
                summary.duplicate_groups.len(),
                format_size(summary.duplicate_groups.iter().map(|g| g.wasted_bytes()).sum())
            );
            println!(
                " Proposed actions: {} delete, {} move, {} archive",
                plan.count_kind("delete"),
                plan.count_kind("move"),
                plan.count_kind("archive")
            );
            println!(
                " For review:       {} unreferenced components, {} unused assets",
                summary.unreferenced_components.len(),
                summary.unused_assets.len()
            );
            if summary.scan_warnings > 0 {
                println!(" {} path(s) could not be read", summary.scan_warnings);
            }
            println!();
            println!(" Plan:   {}", artifacts.plan_path.display());
            println!(" Report: {}", artifacts.report_path.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print hashing progress to stderr until the walker goes away.
fn spawn_progress_printer(
    mut rx: tokio::sync::broadcast::Receiver<ScanProgress>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        use tokio::sync::broadcast::error::RecvError;

        let mut printed = false;
        loop {
            match rx.blocking_recv() {
                Ok(progress) => {
                    eprint!(
                        "\r Hashed {}/{} files ({})",
                        progress.files_hashed,
                        progress.files_found,
                        format_size(progress.bytes_hashed)
                    );
                    printed = true;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        if printed {
            eprintln!();
        }
    })
}

/// Load and execute a plan, printing one line per action.
fn run_apply(
    path: &Path,
    plan_path: Option<PathBuf>,
    use_trash: bool,
    resolution: ConflictResolution,
    format: OutputFormat,
) -> Result<ExitCode> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let plan_path = plan_path.unwrap_or_else(|| default_plan_path(&root));
    let plan = load_plan(&plan_path).context("Cannot load plan")?;

    if plan.root != root {
        tracing::warn!(
            planned = %plan.root.display(),
            applying = %root.display(),
            "plan was generated for a different root"
        );
    }

    let executor = PlanExecutor::new(&root)
        .with_trash(use_trash)
        .with_resolution(resolution);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let report = runtime.block_on(async {
        let mut rx = executor.start_apply(&plan);
        let mut report = ApplyReport::default();
        while let Some(event) = rx.recv().await {
            match event {
                ApplyEvent::Started { total } => {
                    if matches!(format, OutputFormat::Text) {
                        eprintln!("Applying {total} action(s) from {}...", plan_path.display());
                    }
                }
                ApplyEvent::Outcome(outcome) => {
                    if matches!(format, OutputFormat::Text) {
                        println!("{}", outcome.log_line());
                    }
                }
                ApplyEvent::Complete(complete) => report = complete,
            }
        }
        report
    });

    if report.applied > 0 {
        let journal = Journal::from_report(&root, &report);
        let journal_path = default_journal_path(&root);
        journal
            .save(&journal_path)
            .context("Failed to write apply journal")?;
        tracing::debug!(path = %journal_path.display(), "journal written");
    }

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", report.summary());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(exit_code(report.is_success()))
}

/// Check postconditions of an applied plan.
fn run_verify(path: &Path, plan_path: Option<PathBuf>, format: OutputFormat) -> Result<ExitCode> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let plan_path = plan_path.unwrap_or_else(|| default_plan_path(&root));
    let plan = load_plan(&plan_path).context("Cannot load plan")?;

    let journal_path = default_journal_path(&root);
    let journal = if journal_path.is_file() {
        Some(Journal::load(&journal_path).context("Cannot load apply journal")?)
    } else {
        None
    };

    let report = verify_plan(&StdFileSystem, &root, &plan, journal.as_ref());

    match format {
        OutputFormat::Text => {
            for issue in &report.issues {
                println!("{}: {}", issue.action, issue.problem);
            }
            println!(
                "{} action(s) checked, {} not in effect",
                report.checked,
                report.issues.len()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(exit_code(report.is_clean()))
}

/// Undo the last apply from its journal.
fn run_revert(path: &Path) -> Result<ExitCode> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let journal_path = default_journal_path(&root);
    let journal = Journal::load(&journal_path).context("Cannot load apply journal")?;

    let report = revert(&journal, &StdFileSystem);
    for error in &report.errors {
        println!("{error}");
    }
    println!("{}", report.summary());

    if report.is_success() {
        std::fs::remove_file(&journal_path)
            .with_context(|| format!("Failed to remove {}", journal_path.display()))?;
    }

    Ok(exit_code(report.is_success()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
