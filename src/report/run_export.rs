//! JSON run report export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{CleaningStats, Dataset, DatasetOutcome, RunOutcome, SourceLoadStats};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (RFC 3339)
    pub timestamp: String,
    pub loanprep_version: String,
}

/// Stage timings in seconds
#[derive(Serialize)]
pub struct StageTimings {
    pub load_secs: f64,
    pub clean_secs: f64,
    pub write_secs: f64,
}

/// One dataset's entry in the report
#[derive(Serialize)]
pub struct DatasetReport<'a> {
    pub dataset: Dataset,
    pub output: String,
    pub sources: &'a [SourceLoadStats],
    pub joined_rows: usize,
    pub values_changed: usize,
    /// Per-rule counts (flattened into the JSON)
    #[serde(flatten)]
    pub stats: &'a CleaningStats,
    pub timings: StageTimings,
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub datasets: Vec<DatasetReport<'a>>,
}

impl<'a> RunReport<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                loanprep_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            datasets: outcome.datasets.iter().map(DatasetReport::from_outcome).collect(),
        }
    }
}

impl<'a> DatasetReport<'a> {
    fn from_outcome(outcome: &'a DatasetOutcome) -> Self {
        Self {
            dataset: outcome.dataset,
            output: outcome.output.display().to_string(),
            sources: &outcome.sources,
            joined_rows: outcome.joined_rows,
            values_changed: outcome.stats.total_changed(),
            stats: &outcome.stats,
            timings: StageTimings {
                load_secs: outcome.load_time.as_secs_f64(),
                clean_secs: outcome.clean_time.as_secs_f64(),
                write_secs: outcome.write_time.as_secs_f64(),
            },
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(outcome: &RunOutcome, output_path: &Path) -> Result<()> {
    let report = RunReport::from_outcome(outcome);

    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize run report to JSON")?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RuleStat, SourceTable};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_outcome() -> RunOutcome {
        RunOutcome {
            datasets: vec![DatasetOutcome {
                dataset: Dataset::Training,
                sources: vec![SourceLoadStats {
                    table: SourceTable::Demographics,
                    rows_read: 4,
                    duplicates_dropped: 1,
                }],
                joined_rows: 3,
                stats: CleaningStats {
                    rows: 3,
                    rules: vec![
                        RuleStat { column: "Age", changed: 1 },
                        RuleStat { column: "Gender", changed: 2 },
                    ],
                    defaulted_income_ranges: 2,
                    unmapped_merchant_codes: 0,
                    nulled_values: 0,
                },
                output: PathBuf::from("out/train.csv"),
                load_time: Duration::from_millis(1500),
                clean_time: Duration::ZERO,
                write_time: Duration::ZERO,
            }],
        }
    }

    #[test]
    fn test_export_run_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");

        export_run_report(&sample_outcome(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let dataset = &value["datasets"][0];

        assert_eq!(value["metadata"]["loanprep_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(dataset["dataset"], "Training");
        assert_eq!(dataset["joined_rows"], 3);
        assert_eq!(dataset["values_changed"], 3);
        assert_eq!(dataset["defaulted_income_ranges"], 2);
        assert_eq!(dataset["rules"][1]["column"], "Gender");
        assert_eq!(dataset["sources"][0]["duplicates_dropped"], 1);
        assert_eq!(dataset["timings"]["load_secs"], 1.5);
    }
}
