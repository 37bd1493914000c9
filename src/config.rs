//! Run configuration: where the extracts live and where cleaned tables go
//!
//! The default layout mirrors the project's data directory:
//!
//! ```text
//! <data>/raw/train/      training extracts (incl. the target label)
//! <data>/raw/test/       testing extracts
//! <data>/external/       lookup tables
//! <data>/processed/      cleaned output
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::{ColumnTypes, InvalidValuePolicy, PrepError, Result, SourceTable};

/// Data root used when neither `--data-dir` nor `--config` is given
pub const DEFAULT_DATA_DIR: &str = "../data";

/// The extracts that make up one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFiles {
    pub demographics: PathBuf,
    pub previous_loans: PathBuf,
    pub products_held: PathBuf,
    pub avg_txn_amount: PathBuf,
    pub txn_details: PathBuf,
    /// Target label file, training set only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_flag: Option<PathBuf>,
}

impl SourceFiles {
    /// Source tables in join order. An empty loan flag path counts as absent.
    pub fn tables(&self) -> Vec<(SourceTable, &Path)> {
        let mut tables = vec![
            (SourceTable::Demographics, self.demographics.as_path()),
            (SourceTable::PreviousLoans, self.previous_loans.as_path()),
            (SourceTable::ProductsHeld, self.products_held.as_path()),
            (SourceTable::AvgTxnAmount, self.avg_txn_amount.as_path()),
            (SourceTable::TxnDetails, self.txn_details.as_path()),
        ];
        if let Some(flag) = self.loan_flag.as_deref().filter(|p| !p.as_os_str().is_empty()) {
            tables.push((SourceTable::LoanFlag, flag));
        }
        tables
    }
}

/// External reference tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupFiles {
    pub county_towns: PathBuf,
    pub merchant_categories: PathBuf,
}

/// Destinations for the cleaned tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub training: PathBuf,
    pub testing: PathBuf,
}

/// Everything one run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub training: SourceFiles,
    pub testing: SourceFiles,
    pub lookups: LookupFiles,
    pub outputs: OutputFiles,
    #[serde(default)]
    pub column_types: ColumnTypes,
    #[serde(default)]
    pub on_invalid: InvalidValuePolicy,
}

impl PipelineConfig {
    /// Standard file layout under `root`
    pub fn from_data_dir(root: &Path) -> Self {
        let train = root.join("raw").join("train");
        let test = root.join("raw").join("test");
        let external = root.join("external");
        let processed = root.join("processed");

        Self {
            training: SourceFiles {
                demographics: train.join("Model Build - Demographics.csv"),
                previous_loans: train.join("Model Build - Previous Loan Holdings.csv"),
                products_held: train.join("Model Build - Product Held in Bank.csv"),
                avg_txn_amount: train.join("Model Build - TXN Amount.csv"),
                txn_details: train.join("Model Build - Transactions out of Current Account.csv"),
                loan_flag: Some(train.join("Target Variable - Purchased Loan Flag.csv")),
            },
            testing: SourceFiles {
                demographics: test.join("TEST - Demographics.csv"),
                previous_loans: test.join("TEST- Previous Loan Holdings.csv"),
                products_held: test.join("TEST - Product Held in Bank.csv"),
                avg_txn_amount: test.join("TEST - TXN Amount.csv"),
                txn_details: test.join("TEST - Transactions out of Current Account.csv"),
                loan_flag: None,
            },
            lookups: LookupFiles {
                county_towns: external.join("Towns And Counties.csv"),
                merchant_categories: external.join("MerchantCode_Category.csv"),
            },
            outputs: OutputFiles {
                training: processed.join("train").join("Processed_Training_Data.csv"),
                testing: processed.join("test").join("Processed_Testing_Data.csv"),
            },
            column_types: ColumnTypes::default(),
            on_invalid: InvalidValuePolicy::default(),
        }
    }

    /// Load a full configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PrepError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| PrepError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_data_dir(Path::new(DEFAULT_DATA_DIR))
    }
}
