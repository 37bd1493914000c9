//! Cleaning summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{DatasetOutcome, RunOutcome};

/// Print one summary table per dataset
pub fn display_run_summary(outcome: &RunOutcome) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("CLEANING SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    for dataset in &outcome.datasets {
        println!();
        println!(
            "    {} {}",
            style(dataset.dataset.label()).cyan().bold(),
            style(dataset.output.display()).dim()
        );
        for line in dataset_table(dataset).to_string().lines() {
            println!("    {}", line);
        }
    }
}

fn count_cell(count: usize, highlight: Color) -> Cell {
    Cell::new(count).fg(if count == 0 { Color::White } else { highlight })
}

/// Build the summary table for one dataset
pub fn dataset_table(outcome: &DatasetOutcome) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    for source in &outcome.sources {
        let detail = if source.duplicates_dropped > 0 {
            format!("{} ({} duplicate)", source.rows_read, source.duplicates_dropped)
        } else {
            source.rows_read.to_string()
        };
        table.add_row(vec![
            Cell::new(format!("📁 {}", source.table.label())),
            Cell::new(detail),
        ]);
    }

    table.add_row(vec![
        Cell::new("🔗 Joined Rows"),
        Cell::new(outcome.joined_rows).add_attribute(Attribute::Bold),
    ]);

    for rule in &outcome.stats.rules {
        table.add_row(vec![
            Cell::new(format!("✏️  {}", rule.column)),
            count_cell(rule.changed, Color::Yellow),
        ]);
    }

    table.add_row(vec![
        Cell::new("📊 Income Ranges Defaulted"),
        count_cell(outcome.stats.defaulted_income_ranges, Color::Yellow),
    ]);

    table.add_row(vec![
        Cell::new("❓ Unmapped Merchant Codes"),
        count_cell(outcome.stats.unmapped_merchant_codes, Color::Red),
    ]);

    if outcome.stats.nulled_values > 0 {
        table.add_row(vec![
            Cell::new("🗑️  Nulled Values"),
            count_cell(outcome.stats.nulled_values, Color::Red),
        ]);
    }

    table.add_row(vec![
        Cell::new("✅ Rows Written"),
        Cell::new(outcome.stats.rows)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);

    let total = outcome.load_time + outcome.clean_time + outcome.write_time;
    table.add_row(vec![
        Cell::new("⏱  Time"),
        Cell::new(format!(
            "{:.2}s (load {:.2}s, clean {:.2}s, write {:.2}s)",
            total.as_secs_f64(),
            outcome.load_time.as_secs_f64(),
            outcome.clean_time.as_secs_f64(),
            outcome.write_time.as_secs_f64()
        )),
    ]);

    table
}
