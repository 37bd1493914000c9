//! loanprep: Loan-Uptake Data Preparation CLI
//!
//! Merges the raw customer extracts for the training and testing sets,
//! cleans them and writes one model-ready CSV per set.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use indicatif::ProgressBar;

use loanprep::cli::{confirm_overwrite, Cli};
use loanprep::pipeline::{run_pipeline, Dataset, DatasetOutcome, PrepError, RunProgress};
use loanprep::report::{display_run_summary, export_run_report};
use loanprep::utils::{
    create_spinner, finish_with_error, finish_with_success, finish_with_warning, init_logging,
    print_banner, print_completion, print_config, print_count, print_error, print_info,
    print_step_header, print_step_time, print_success,
};

const SUCCESS_MESSAGE: &str = "Successfully generated cleaned data files for Training & Testing sets.";
const FAILURE_MESSAGE: &str = "Files couldn't be generated.";

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format).context("Failed to initialise logging")?;

    match run(&cli) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "Run failed");
            print_error(FAILURE_MESSAGE);
            Err(err)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config().context("Failed to resolve configuration")?;

    // Print styled banner and configuration card
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&config);

    if !cli.no_confirm && Term::stdout().is_term() {
        let outputs = [config.outputs.training.as_path(), config.outputs.testing.as_path()];
        if !confirm_overwrite(&outputs)? {
            println!("Cancelled by user.");
            return Ok(());
        }
    }

    // Steps 1-3: prepare both sets, then save them
    let mut progress = TerminalProgress::default();
    let outcome = run_pipeline(&config, &mut progress).context("Pipeline failed")?;
    progress.finish_step();

    // Display summary
    display_run_summary(&outcome);

    if let Some(report_path) = &cli.report {
        export_run_report(&outcome, report_path)?;
        print_success(&format!("Run report written to {}", report_path.display()));
    }

    // Final completion message
    print_completion(SUCCESS_MESSAGE);

    Ok(())
}

/// Step headers, spinners and counts for an interactive run
#[derive(Default)]
struct TerminalProgress {
    step: u8,
    step_start: Option<Instant>,
    spinner: Option<ProgressBar>,
}

impl TerminalProgress {
    fn begin_step(&mut self, title: &str) {
        self.finish_step();
        self.step += 1;
        print_step_header(self.step, title);
        self.step_start = Some(Instant::now());
    }

    fn finish_step(&mut self) {
        if let Some(start) = self.step_start.take() {
            print_step_time(start.elapsed());
        }
    }
}

impl RunProgress for TerminalProgress {
    fn dataset_started(&mut self, dataset: Dataset, tables: usize) {
        self.begin_step(&format!("Prepare {} Set", dataset.label()));
        self.spinner = Some(create_spinner(&format!(
            "Loading and cleaning {} extracts...",
            tables
        )));
    }

    fn dataset_prepared(&mut self, outcome: &DatasetOutcome) {
        let stats = &outcome.stats;
        let message = format!("{} set cleaned", outcome.dataset.label());
        if let Some(spinner) = self.spinner.take() {
            if stats.unmapped_merchant_codes > 0 {
                finish_with_warning(&spinner, &message);
            } else {
                finish_with_success(&spinner, &message);
            }
        }

        if stats.unmapped_merchant_codes > 0 {
            print_count(
                "merchant code(s) without a category",
                stats.unmapped_merchant_codes,
                None,
            );
        }
        print_count(
            "customer(s) present in every extract",
            outcome.joined_rows,
            None,
        );
        print_count("value(s) rewritten", stats.total_changed(), None);
        if stats.defaulted_income_ranges > 0 {
            print_info(&format!(
                "{} income range(s) outside every band defaulted to Lower Middle",
                stats.defaulted_income_ranges
            ));
        }
        if stats.nulled_values > 0 {
            print_info(&format!(
                "{} value(s) could not be cast and were left empty",
                stats.nulled_values
            ));
        }
    }

    fn writing_started(&mut self) {
        self.begin_step("Save Results");
    }

    fn dataset_writing(&mut self, outcome: &DatasetOutcome) {
        self.spinner = Some(create_spinner(&format!(
            "Writing {}...",
            outcome.output.display()
        )));
    }

    fn dataset_written(&mut self, outcome: &DatasetOutcome) {
        if let Some(spinner) = self.spinner.take() {
            finish_with_success(&spinner, &format!("Saved to {}", outcome.output.display()));
        }
    }

    fn run_failed(&mut self, error: &PrepError) {
        if let Some(spinner) = self.spinner.take() {
            finish_with_error(&spinner, "Failed");
        }
        tracing::debug!(error = %error, step = self.step, "Stage failed");
    }
}
