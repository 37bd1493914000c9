//! Terminal styling utilities for the pipeline's progress output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::config::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static BOOK: Emoji<'_, '_> = Emoji("📖 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("loanprep").cyan().bold(),
        style("Loan-uptake data preparation").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card
pub fn print_config(config: &PipelineConfig) {
    let box_width = 64;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Training: {:<45}│",
        FOLDER,
        truncate_path(parent_or_self(&config.training.demographics), 44)
    );
    println!(
        "    │  {} Testing:  {:<45}│",
        FOLDER,
        truncate_path(parent_or_self(&config.testing.demographics), 44)
    );
    println!(
        "    │  {} Lookups:  {:<45}│",
        BOOK,
        truncate_path(parent_or_self(&config.lookups.county_towns), 44)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Train out: {:<44}│",
        SAVE,
        truncate_path(&config.outputs.training, 43)
    );
    println!(
        "    │  {} Test out:  {:<44}│",
        SAVE,
        truncate_path(&config.outputs.testing, 43)
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print an error message
pub fn print_error(message: &str) {
    println!("    {} {}", style("✗").red().bold(), style(message).red().bold());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      {} {}", style(count).yellow().bold(), description);
    }
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

// Helper functions

fn parent_or_self(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
