use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ferry_config::{FerryConfig, MigrateConfig};
use ferry_core::FileId;
use ferry_migrate::{FileReport, MageProcessor, ProcessOutcome};
use ferry_syntax::TokenStream;
use serde::Serialize;

use crate::MigrateArgs;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum FileStatus {
    Converted { report: FileReport },
    Unchanged,
    /// No class declaration.
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    #[serde(flatten)]
    status: FileStatus,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    converted: usize,
    unchanged: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Debug, Serialize)]
struct MigrationReport {
    root: PathBuf,
    dry_run: bool,
    files: Vec<FileResult>,
    summary: Summary,
}

pub(crate) fn run(config: &FerryConfig, args: &MigrateArgs) -> Result<i32> {
    let processor =
        MageProcessor::from_config(&config.migrate).context("invalid [migrate] configuration")?;
    let paths = collect_files(&args.path, &config.migrate)?;
    tracing::info!(
        target: "ferry.cli",
        root = %args.path.display(),
        files = paths.len(),
        dry_run = args.dry_run,
        "migrating"
    );

    let mut summary = Summary::default();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let display = display_path(&args.path, &path);
        let file = FileId::new(display.clone());
        let status = match migrate_file(&processor, &path, &file, args.dry_run) {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(target: "ferry.cli", file = %file, error = %format!("{err:#}"), "migration failed");
                FileStatus::Failed {
                    error: format!("{err:#}"),
                }
            }
        };
        match &status {
            FileStatus::Converted { .. } => summary.converted += 1,
            FileStatus::Unchanged => summary.unchanged += 1,
            FileStatus::Skipped => summary.skipped += 1,
            FileStatus::Failed { .. } => summary.failed += 1,
        }
        files.push(FileResult {
            path: display,
            status,
        });
    }

    let exit = if summary.failed > 0 { 1 } else { 0 };
    let report = MigrationReport {
        root: args.path.clone(),
        dry_run: args.dry_run,
        files,
        summary,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }
    Ok(exit)
}

fn migrate_file(
    processor: &MageProcessor,
    path: &Path,
    file: &FileId,
    dry_run: bool,
) -> Result<FileStatus> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let outcome = processor.process(file, TokenStream::from_source(&text))?;
    let (tokens, report) = match outcome {
        ProcessOutcome::Skipped { .. } => return Ok(FileStatus::Skipped),
        ProcessOutcome::Converted { tokens, report } => (tokens, report),
    };

    let rendered = tokens.render();
    if rendered == text {
        return Ok(FileStatus::Unchanged);
    }
    if !dry_run {
        fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    }
    tracing::info!(
        target: "ferry.cli",
        file = %file,
        rewrites = report.invocations.len(),
        injected = report.requirements.len(),
        "converted"
    );
    Ok(FileStatus::Converted { report })
}

/// Files under `root` with a configured extension, sorted. Hidden directories
/// are not entered. A file given directly is always included.
fn collect_files(root: &Path, config: &MigrateConfig) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        bail!("{} does not exist or is not a directory", root.display());
    }

    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && config.matches_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn display_path(root: &Path, path: &Path) -> String {
    let rel = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path,
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn print_human(report: &MigrationReport) {
    for file in &report.files {
        match &file.status {
            FileStatus::Converted { report } => {
                println!("converted: {}", file.path);
                for inv in &report.invocations {
                    println!("  {}:{}: {} -> {}", file.path, inv.line, inv.legacy, inv.modern);
                }
                for dep in &report.requirements {
                    println!("  + {} ${}", dep.ty, dep.name);
                }
            }
            FileStatus::Failed { error } => println!("failed: {error}"),
            FileStatus::Unchanged | FileStatus::Skipped => {}
        }
    }
    let s = &report.summary;
    println!(
        "summary: {} converted, {} unchanged, {} skipped, {} failed{}",
        s.converted,
        s.unchanged,
        s.skipped,
        s.failed,
        if report.dry_run { " (dry run)" } else { "" }
    );
}
