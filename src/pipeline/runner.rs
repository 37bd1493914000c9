//! End-to-end orchestration: training and testing sets, load → clean → write

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use polars::prelude::DataFrame;
use serde::Serialize;

use super::cleaner::{CleaningStats, RecordCleaner};
use super::error::{PrepError, Result};
use super::loader::{load_dataset, SourceLoadStats};
use super::writer::save_dataset;
use crate::config::{PipelineConfig, SourceFiles};

/// Which of the two cleaned tables is being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dataset {
    Training,
    Testing,
}

impl Dataset {
    pub const fn label(self) -> &'static str {
        match self {
            Dataset::Training => "Training",
            Dataset::Testing => "Testing",
        }
    }
}

/// What happened to one dataset
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub dataset: Dataset,
    pub sources: Vec<SourceLoadStats>,
    pub joined_rows: usize,
    pub stats: CleaningStats,
    pub output: PathBuf,
    pub load_time: Duration,
    pub clean_time: Duration,
    pub write_time: Duration,
}

/// A cleaned table waiting to be written
#[derive(Debug)]
pub struct PreparedDataset {
    pub df: DataFrame,
    pub outcome: DatasetOutcome,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub datasets: Vec<DatasetOutcome>,
}

/// Build the cleaner described by `config`
pub fn build_cleaner(config: &PipelineConfig) -> Result<RecordCleaner> {
    Ok(RecordCleaner::from_lookup_files(
        &config.lookups.county_towns,
        &config.lookups.merchant_categories,
    )?
    .with_column_types(config.column_types.clone())
    .with_invalid_value_policy(config.on_invalid))
}

/// Load, join and clean one dataset without writing it.
pub fn prepare_dataset(
    dataset: Dataset,
    files: &SourceFiles,
    output: &Path,
    cleaner: &RecordCleaner,
) -> Result<PreparedDataset> {
    let _span = tracing::info_span!("dataset", name = dataset.label()).entered();

    let start = Instant::now();
    let loaded = load_dataset(&files.tables())?;
    let load_time = start.elapsed();
    let joined_rows = loaded.df.height();

    let start = Instant::now();
    let (df, stats) = cleaner.clean(loaded.df)?;
    let clean_time = start.elapsed();
    tracing::info!(
        rows = stats.rows,
        changed = stats.total_changed(),
        "Cleaned dataset"
    );

    Ok(PreparedDataset {
        df,
        outcome: DatasetOutcome {
            dataset,
            sources: loaded.sources,
            joined_rows,
            stats,
            output: output.to_path_buf(),
            load_time,
            clean_time,
            write_time: Duration::ZERO,
        },
    })
}

/// Write a prepared dataset to its output path.
pub fn write_dataset(prepared: &mut PreparedDataset) -> Result<()> {
    let start = Instant::now();
    save_dataset(&mut prepared.df, &prepared.outcome.output)?;
    prepared.outcome.write_time = start.elapsed();
    Ok(())
}

/// Stage events raised by [`run_pipeline`]
///
/// Every hook defaults to doing nothing, so a reporter only overrides the
/// events it displays.
pub trait RunProgress {
    /// A dataset is about to be loaded from `tables` source files
    fn dataset_started(&mut self, _dataset: Dataset, _tables: usize) {}

    /// A dataset was loaded, joined and cleaned
    fn dataset_prepared(&mut self, _outcome: &DatasetOutcome) {}

    /// Both datasets are prepared and writing begins
    fn writing_started(&mut self) {}

    fn dataset_writing(&mut self, _outcome: &DatasetOutcome) {}

    fn dataset_written(&mut self, _outcome: &DatasetOutcome) {}

    /// The run stopped with `error`; no further hooks follow
    fn run_failed(&mut self, _error: &PrepError) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl RunProgress for SilentProgress {}

/// Prepare the training set, then the testing set, then write both.
///
/// Nothing is written unless both datasets were prepared, so a load or
/// cleaning failure leaves no partial output behind.
pub fn run_pipeline(
    config: &PipelineConfig,
    progress: &mut dyn RunProgress,
) -> Result<RunOutcome> {
    run_stages(config, progress).inspect_err(|err| progress.run_failed(err))
}

fn run_stages(config: &PipelineConfig, progress: &mut dyn RunProgress) -> Result<RunOutcome> {
    let cleaner = build_cleaner(config)?;

    let mut prepared = Vec::with_capacity(2);
    for (dataset, files, output) in [
        (Dataset::Training, &config.training, &config.outputs.training),
        (Dataset::Testing, &config.testing, &config.outputs.testing),
    ] {
        progress.dataset_started(dataset, files.tables().len());
        let dataset = prepare_dataset(dataset, files, output, &cleaner)?;
        progress.dataset_prepared(&dataset.outcome);
        prepared.push(dataset);
    }

    progress.writing_started();
    for dataset in &mut prepared {
        progress.dataset_writing(&dataset.outcome);
        write_dataset(dataset)?;
        progress.dataset_written(&dataset.outcome);
    }

    Ok(RunOutcome {
        datasets: prepared.into_iter().map(|dataset| dataset.outcome).collect(),
    })
}
