//! Output formatting and styling module.
//!
//! Every line the tool prints goes through [`OutputFormatter`], so styling can
//! be changed in one place.

use colored::*;
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use wavsort::output::OutputFormatter;
    /// OutputFormatter::success("File organization completed successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints a table of recording counts per bird ID.
    ///
    /// ```no_run
    /// use wavsort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("X".to_string(), 2);
    /// counts.insert("Y".to_string(), 1);
    /// OutputFormatter::summary_table(&counts, 3);
    /// ```
    pub fn summary_table(bird_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = bird_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(7); // "Bird ID"

        println!("{:<width$} | {}", "Bird ID".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));

        for (bird_id, count) in bird_counts {
            println!(
                "{:<width$} | {} {}",
                bird_id,
                count.to_string().green(),
                plural(*count),
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
