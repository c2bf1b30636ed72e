//! Command-line interface for sortbox.
//!
//! Parses arguments, prompts for anything missing, validates the root
//! directory and drives the [`Organizer`] end to end.

use crate::config::Config;
use crate::file_organizer::{Organizer, RunReport};
use crate::logging::ActivityLog;
use crate::output::OutputFormatter;
use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use std::fs;
use std::path::{Path, PathBuf};

/// Sort files into category folders by extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "sortbox", version, about)]
pub struct Cli {
    /// Directory to organize. Prompted for when omitted.
    pub directory: Option<PathBuf>,

    /// Report planned moves without touching the filesystem.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./.sortboxrc.toml, then ~/.config/sortbox/config.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON instead of the summary table.
    #[arg(long)]
    pub json: bool,

    /// Directory for the activity log (overrides the configuration).
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Show debug output on the console.
    #[arg(short, long)]
    pub verbose: bool,
}

/// A fully resolved organize request.
#[derive(Debug, Clone)]
pub struct OrganizeCommand {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub json: bool,
    pub progress: bool,
    /// Log file to keep out of the organization, if it sits under the root.
    pub log_file: Option<PathBuf>,
}

impl OrganizeCommand {
    pub fn new(directory: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            directory: directory.into(),
            dry_run,
            json: false,
            progress: false,
            log_file: None,
        }
    }
}

/// Fills in the directory and dry-run flag, prompting on the terminal the
/// way the interactive flow does when no directory was given.
pub fn resolve_command(cli: &Cli, config: &Config) -> Result<OrganizeCommand> {
    let (directory, dry_run) = match &cli.directory {
        Some(directory) => (directory.clone(), cli.dry_run),
        None => {
            let theme = ColorfulTheme::default();
            let input: String = Input::with_theme(&theme)
                .with_prompt("Enter directory to organize")
                .interact_text()
                .context("Failed to read directory")?;
            let dry_run = cli.dry_run
                || Confirm::with_theme(&theme)
                    .with_prompt("Dry-run mode?")
                    .default(false)
                    .interact()
                    .context("Failed to read dry-run answer")?;
            (PathBuf::from(input.trim()), dry_run)
        }
    };

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.logging.directory.clone());

    Ok(OrganizeCommand {
        directory,
        dry_run,
        json: cli.json,
        progress: !cli.no_progress && !cli.json,
        log_file: Some(log_dir.join(&config.logging.file_name)),
    })
}

/// Checks that `path` is an existing directory and returns it canonicalized.
pub fn validate_root(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        bail!("Invalid directory path: {}", path.display());
    }
    fs::canonicalize(path).with_context(|| format!("Invalid directory path: {}", path.display()))
}

/// Runs one organize request with an already loaded configuration.
///
/// Prints the dry-run lines, a summary table and a final status line (or
/// the JSON report), and returns the report for the caller to inspect.
pub fn run_cli(command: &OrganizeCommand, config: &Config, log: &dyn ActivityLog) -> Result<RunReport> {
    let root = validate_root(&command.directory)?;

    let table = config.extension_table()?;
    for overlap in table.overlaps() {
        log.warn(&format!(
            "Extension '{}' is listed under both '{}' and '{}'; '{}' wins",
            overlap.extension, overlap.winner, overlap.shadowed, overlap.winner
        ));
    }

    let mut filters = config.compile_filters()?;
    if let Some(log_file) = &command.log_file
        && let Ok(log_file) = fs::canonicalize(log_file)
    {
        filters = filters.exclude_path(log_file);
    }

    if !command.json {
        if command.dry_run {
            OutputFormatter::info(&format!("DRY RUN: analyzing {}", root.display()));
        } else {
            OutputFormatter::info(&format!("Organizing {}", root.display()));
        }
    }

    let report = Organizer::new(table, log)
        .with_filters(filters)
        .with_console(!command.json)
        .with_progress(command.progress)
        .organize(&root, command.dry_run)?;

    if command.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        OutputFormatter::plain(&json);
        return Ok(report);
    }

    print_report(&report);
    Ok(report)
}

fn print_report(report: &RunReport) {
    if report.eligible() == 0 {
        OutputFormatter::plain("No files found to organize.");
    } else {
        OutputFormatter::summary_table(&report.category_counts, report.moved.len());
    }

    for warning in &report.warnings {
        OutputFormatter::warning(warning);
    }

    for failure in &report.failures {
        OutputFormatter::error(&failure.reason);
    }

    if report.dry_run {
        OutputFormatter::success("Dry-run complete. No files were moved.");
    } else if report.is_complete_success() {
        OutputFormatter::success(&format!(
            "Files organized successfully ({}).",
            report.summary_line()
        ));
    } else {
        OutputFormatter::warning(&format!(
            "Some files could not be organized: {}.",
            report.summary_line()
        ));
    }
}
