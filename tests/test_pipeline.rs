//! End-to-end tests: load, join, clean and write both datasets

mod common;

use common::*;
use loanprep::pipeline::{
    build_cleaner, prepare_dataset, run_pipeline, Dataset, DatasetOutcome, InvalidValuePolicy,
    PrepError, RunProgress, SilentProgress,
};

const TRAINING_COLUMNS: [&str; 12] = [
    "ClientID",
    "Age",
    "Gender",
    "County",
    "LoanHeldBefore",
    "NoOfProductsHeld",
    "AvgTxnAmt",
    "NoOfTxns",
    "LastTxnAmt",
    "LoanFlag",
    "IncomeCategory",
    "MerCategory",
];

#[test]
fn test_training_set_values() {
    let (_dir, config) = create_fixture();
    let cleaner = build_cleaner(&config).unwrap();

    let prepared = prepare_dataset(
        Dataset::Training,
        &config.training,
        &config.outputs.training,
        &cleaner,
    )
    .unwrap();
    let df = &prepared.df;

    assert_columns(df, &TRAINING_COLUMNS);
    // Demographics order, duplicates and non-overlapping customers removed
    assert_eq!(texts(df, "ClientID"), ["103", "101", "102"]);
    assert_eq!(integers(df, "Age"), [Some(29), Some(34), Some(45)]);
    assert_eq!(texts(df, "Gender"), ["1", "0", "1"]);
    assert_eq!(texts(df, "County"), ["Dublin", "Dublin", "Kildare"]);
    assert_eq!(texts(df, "LoanHeldBefore"), ["-1", "1", "0"]);
    assert_eq!(integers(df, "NoOfProductsHeld"), [Some(3), Some(2), Some(0)]);
    assert_eq!(floats(df, "AvgTxnAmt"), [Some(45.0), Some(12050.0), Some(80.0)]);
    assert_eq!(integers(df, "NoOfTxns"), [Some(7), Some(12), Some(3)]);
    assert_eq!(floats(df, "LastTxnAmt"), [Some(99.99), Some(35.5), Some(10.0)]);
    assert_eq!(texts(df, "LoanFlag"), ["0", "1", "0"]);
    assert_eq!(texts(df, "IncomeCategory"), ["High", "Low", "Upper Middle"]);
    assert_eq!(
        strings(df, "MerCategory"),
        [None, Some("Groceries".to_string()), Some("Unknown".to_string())]
    );

    let outcome = &prepared.outcome;
    assert_eq!(outcome.joined_rows, 3);
    assert_eq!(outcome.sources.len(), 6);
    assert_eq!(outcome.sources[0].rows_read, 5);
    assert_eq!(outcome.sources[0].duplicates_dropped, 1);
    assert_eq!(outcome.stats.unmapped_merchant_codes, 1);
    assert_eq!(outcome.stats.nulled_values, 0);
}

#[test]
fn test_testing_set_has_no_loan_flag() {
    let (_dir, config) = create_fixture();
    let cleaner = build_cleaner(&config).unwrap();

    let prepared = prepare_dataset(
        Dataset::Testing,
        &config.testing,
        &config.outputs.testing,
        &cleaner,
    )
    .unwrap();
    let df = &prepared.df;

    let expected: Vec<&str> = TRAINING_COLUMNS
        .iter()
        .copied()
        .filter(|c| *c != "LoanFlag")
        .collect();
    assert_columns(df, &expected);
    assert_eq!(texts(df, "ClientID"), ["201", "202"]);
    assert_eq!(texts(df, "County"), ["Westmeath", "Outside ROI"]);
    assert_eq!(texts(df, "IncomeCategory"), ["Lower Middle", "Lower Middle"]);
    assert_eq!(floats(df, "AvgTxnAmt"), [Some(300.0), Some(1234.0)]);
    assert_eq!(texts(df, "MerCategory"), ["Restaurants", "Groceries"]);
    // "bad range" falls outside every band
    assert_eq!(prepared.outcome.stats.defaulted_income_ranges, 1);
}

/// Rewrite the testing transaction extract with customer 201's row replaced
fn set_testing_txn_row(config: &loanprep::config::PipelineConfig, row: &str) {
    write_latin1(
        &config.testing.txn_details,
        &format!(
            "Client,Num Transactions,Last TXN Amount,Merchant Code,Last Transaction Narrative\n\
             {row}\n\
             202,9,42.25,5411.0,LIDL\n"
        ),
    );
}

#[test]
fn test_missing_last_txn_amount_stays_empty() {
    let (_dir, config) = create_fixture();
    set_testing_txn_row(&config, "201,5,,5812,CAFE");
    let cleaner = build_cleaner(&config).unwrap();

    let prepared = prepare_dataset(
        Dataset::Testing,
        &config.testing,
        &config.outputs.testing,
        &cleaner,
    )
    .unwrap();
    assert_eq!(floats(&prepared.df, "LastTxnAmt"), [None, Some(42.25)]);
    assert_eq!(prepared.outcome.stats.nulled_values, 0);

    run_pipeline(&config, &mut SilentProgress).unwrap();
    let testing = std::fs::read_to_string(&config.outputs.testing).unwrap();
    let row = testing.lines().nth(1).unwrap();
    assert!(row.starts_with("201,"), "got {}", row);
    assert!(row.contains(",5,,Lower Middle,Restaurants"), "got {}", row);
}

#[test]
fn test_na_merchant_code_is_unknown() {
    let (_dir, config) = create_fixture();
    set_testing_txn_row(&config, "201,5,20,NA,CAFE");
    let cleaner = build_cleaner(&config).unwrap();

    let prepared = prepare_dataset(
        Dataset::Testing,
        &config.testing,
        &config.outputs.testing,
        &cleaner,
    )
    .unwrap();

    assert_eq!(texts(&prepared.df, "MerCategory"), ["Unknown", "Groceries"]);
    assert_eq!(prepared.outcome.stats.unmapped_merchant_codes, 0);
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl RunProgress for Recorder {
    fn dataset_started(&mut self, dataset: Dataset, tables: usize) {
        self.events.push(format!("start {} ({} tables)", dataset.label(), tables));
    }

    fn dataset_prepared(&mut self, outcome: &DatasetOutcome) {
        self.events.push(format!("prepared {}", outcome.dataset.label()));
    }

    fn writing_started(&mut self) {
        self.events.push("writing".to_string());
    }

    fn dataset_writing(&mut self, outcome: &DatasetOutcome) {
        self.events.push(format!("write {}", outcome.dataset.label()));
    }

    fn dataset_written(&mut self, outcome: &DatasetOutcome) {
        assert!(outcome.output.exists());
        self.events.push(format!("written {}", outcome.dataset.label()));
    }

    fn run_failed(&mut self, _error: &PrepError) {
        self.events.push("failed".to_string());
    }
}

#[test]
fn test_run_pipeline_reports_stages_in_order() {
    let (_dir, config) = create_fixture();
    let mut recorder = Recorder::default();

    run_pipeline(&config, &mut recorder).unwrap();

    assert_eq!(
        recorder.events,
        [
            "start Training (6 tables)",
            "prepared Training",
            "start Testing (5 tables)",
            "prepared Testing",
            "writing",
            "write Training",
            "written Training",
            "write Testing",
            "written Testing",
        ]
    );
}

#[test]
fn test_run_pipeline_reports_failure_before_writing() {
    let (_dir, config) = create_fixture_with_bad_age();
    let mut recorder = Recorder::default();

    let result = run_pipeline(&config, &mut recorder);

    assert!(matches!(result, Err(PrepError::InvalidValue { .. })));
    assert_eq!(recorder.events, ["start Training (6 tables)", "failed"]);
    assert!(!config.outputs.training.exists());
}

#[test]
fn test_run_pipeline_writes_both_tables() {
    let (_dir, config) = create_fixture();

    let outcome = run_pipeline(&config, &mut SilentProgress).unwrap();
    assert_eq!(outcome.datasets.len(), 2);
    assert_eq!(outcome.datasets[0].dataset, Dataset::Training);
    assert_eq!(outcome.datasets[1].dataset, Dataset::Testing);

    let training = std::fs::read_to_string(&config.outputs.training).unwrap();
    let lines: Vec<&str> = training.lines().collect();
    assert_eq!(lines[0], TRAINING_COLUMNS.join(","));
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("103,29,1,Dublin,-1,3,"));
    assert!(lines[1].ends_with(",0,High,"), "unmapped category is empty: {}", lines[1]);
    assert!(lines[3].ends_with(",Upper Middle,Unknown"));

    let testing = std::fs::read_to_string(&config.outputs.testing).unwrap();
    assert!(!testing.lines().next().unwrap().contains("LoanFlag"));
    assert_eq!(testing.lines().count(), 3);
}

#[test]
fn test_invalid_age_fails_without_output() {
    let (_dir, config) = create_fixture_with_bad_age();

    let result = run_pipeline(&config, &mut SilentProgress);

    match result {
        Err(PrepError::InvalidValue {
            column,
            client_id,
            value,
            ..
        }) => {
            assert_eq!(column, "Age");
            assert_eq!(client_id, "102");
            assert_eq!(value, "");
        }
        other => panic!("Expected InvalidValue, got {:?}", other),
    }
    assert!(!config.outputs.training.exists());
    assert!(!config.outputs.testing.exists());
}

#[test]
fn test_null_policy_leaves_invalid_age_empty() {
    let (_dir, mut config) = create_fixture_with_bad_age();
    config.on_invalid = InvalidValuePolicy::Null;

    let outcome = run_pipeline(&config, &mut SilentProgress).unwrap();
    assert_eq!(outcome.datasets[0].stats.nulled_values, 1);

    let training = std::fs::read_to_string(&config.outputs.training).unwrap();
    let row = training.lines().nth(3).unwrap();
    assert!(row.starts_with("102,,1,Kildare,"), "got {}", row);
}

#[test]
fn test_missing_source_file() {
    let (_dir, config) = create_fixture();
    std::fs::remove_file(&config.testing.products_held).unwrap();

    let result = run_pipeline(&config, &mut SilentProgress);

    assert!(matches!(result, Err(PrepError::FileAccess { .. })));
    // The training set was prepared but nothing is written
    assert!(!config.outputs.training.exists());
}
