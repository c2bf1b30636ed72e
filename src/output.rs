//! Console output styling.
//!
//! All user-facing lines go through [`OutputFormatter`] so colors and
//! symbols stay consistent between the organizer and the CLI.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Styled console output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message to stderr in yellow, keeping stdout free for
    /// report output.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one planned move in dry-run mode.
    ///
    /// ```no_run
    /// use sortbox::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("Would move 'a.txt' to 'Documents/a.txt'");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for live moves.
    ///
    /// Draws to stderr and stays hidden when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints per-category counts in table order, followed by a total row.
    ///
    /// Categories with a zero count are left out.
    pub fn summary_table(category_counts: &[(String, usize)], total_files: usize) {
        Self::header("SUMMARY");

        let rows: Vec<_> = category_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .collect();

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in &rows {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural_files(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = width
        );
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
