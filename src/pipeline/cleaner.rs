//! Column-wise cleaning of the merged customer table
//!
//! [`RecordCleaner`] applies the value rules from [`super::rules`] to whole
//! columns in a fixed order, then restores the final column types.

use std::path::Path;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PrepError, Result};
use super::loader::CLIENT_ID;
use super::lookup::{parse_merchant_code, LookupTable, MISSING_MERCHANT_CODE};
use super::rules;

/// What to do with a value that still can't be cast after cleaning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InvalidValuePolicy {
    /// Abort the run with [`PrepError::InvalidValue`]
    #[default]
    Fail,
    /// Write the cell as null (an empty CSV field)
    Null,
}

/// Columns grouped by the type they are restored to after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypes {
    pub integer: Vec<String>,
    pub float: Vec<String>,
    pub categorical: Vec<String>,
}

impl Default for ColumnTypes {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            integer: owned(&["Age", "NoOfProductsHeld", "NoOfTxns"]),
            float: owned(&["LastTxnAmt", "AvgTxnAmt"]),
            categorical: owned(&[
                "Gender",
                "County",
                "LoanHeldBefore",
                "MerCategory",
                "IncomeCategory",
            ]),
        }
    }
}

/// Number of values one rule rewrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStat {
    pub column: &'static str,
    pub changed: usize,
}

/// Per-rule counts for one cleaned dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningStats {
    pub rows: usize,
    pub rules: Vec<RuleStat>,
    /// Income ranges outside every band, bucketed as "Lower Middle"
    pub defaulted_income_ranges: usize,
    /// Merchant codes with no category in the lookup
    pub unmapped_merchant_codes: usize,
    /// Cells nulled under [`InvalidValuePolicy::Null`]
    pub nulled_values: usize,
}

impl CleaningStats {
    fn record(&mut self, column: &'static str, changed: usize) {
        tracing::debug!(column, changed, "Applied cleaning rule");
        self.rules.push(RuleStat { column, changed });
    }

    /// Total values rewritten across all rules
    pub fn total_changed(&self) -> usize {
        self.rules.iter().map(|r| r.changed).sum()
    }
}

/// Applies the cleaning rules to a merged customer table.
#[derive(Debug, Clone)]
pub struct RecordCleaner {
    towns: LookupTable,
    merchant_categories: LookupTable<i64>,
    column_types: ColumnTypes,
    invalid_values: InvalidValuePolicy,
}

impl RecordCleaner {
    /// Create a cleaner from prepared lookups.
    ///
    /// `merchant_categories` is used as given; see
    /// [`LookupTable::with_missing_code_entry`] for the entry missing codes need.
    pub fn new(towns: LookupTable, merchant_categories: LookupTable<i64>) -> Self {
        Self {
            towns,
            merchant_categories,
            column_types: ColumnTypes::default(),
            invalid_values: InvalidValuePolicy::default(),
        }
    }

    /// Load both lookup files and create a cleaner.
    pub fn from_lookup_files(county_towns: &Path, merchant_categories: &Path) -> Result<Self> {
        let towns = LookupTable::<String>::from_csv(county_towns)?;
        let merchants = LookupTable::<i64>::merchant_categories_from_csv(merchant_categories)?;
        Ok(Self::new(towns, merchants))
    }

    pub fn with_column_types(mut self, column_types: ColumnTypes) -> Self {
        self.column_types = column_types;
        self
    }

    pub fn with_invalid_value_policy(mut self, policy: InvalidValuePolicy) -> Self {
        self.invalid_values = policy;
        self
    }

    /// Run every rule in order, then restore column types.
    pub fn clean(&self, mut df: DataFrame) -> Result<(DataFrame, CleaningStats)> {
        let mut stats = CleaningStats {
            rows: df.height(),
            ..Default::default()
        };

        stats.record("Age", self.clean_age(&mut df)?);
        stats.record("Gender", self.clean_gender(&mut df)?);
        stats.defaulted_income_ranges = self.clean_income_group(&mut df)?;
        stats.record("County", self.clean_county(&mut df)?);
        stats.record("LoanHeldBefore", self.clean_loan_held_before(&mut df)?);
        stats.record("NoOfProductsHeld", self.clean_products_held(&mut df)?);
        stats.record("AvgTxnAmt", self.clean_avg_txn_amt(&mut df)?);

        let unmapped = self.clean_merchant_codes(&mut df)?;
        if unmapped > 0 {
            tracing::warn!(rows = unmapped, "Merchant codes missing from the category lookup");
        }
        stats.unmapped_merchant_codes = unmapped;

        stats.nulled_values = self.restore_types(&mut df)?;

        Ok((df, stats))
    }

    pub fn clean_age(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "Age", rules::clean_age)
    }

    pub fn clean_gender(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "Gender", |v| rules::clean_gender(v).to_string())
    }

    /// Replace `IncomeGroup` with an appended `IncomeCategory` column.
    ///
    /// Returns how many ranges fell outside every band and took the default.
    pub fn clean_income_group(&self, df: &mut DataFrame) -> Result<usize> {
        let groups = text_column(df, "IncomeGroup")?;
        let categories: Vec<&str> = groups
            .into_iter()
            .map(|v| rules::clean_income_group(v.unwrap_or_default()).as_str())
            .collect();
        let defaulted = groups
            .into_iter()
            .filter(|v| rules::income_range_defaulted(v.unwrap_or_default()))
            .count();
        tracing::debug!(rows = defaulted, "Income ranges bucketed as Lower Middle by default");

        df.drop_in_place("IncomeGroup")?;
        df.with_column(Column::new("IncomeCategory".into(), categories))?;
        Ok(defaulted)
    }

    pub fn clean_county(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "County", |v| rules::clean_county(v, &self.towns))
    }

    pub fn clean_loan_held_before(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "LoanHeldBefore", |v| {
            rules::clean_loan_held_before(v).to_string()
        })
    }

    pub fn clean_products_held(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "NoOfProductsHeld", rules::clean_products_held)
    }

    pub fn clean_avg_txn_amt(&self, df: &mut DataFrame) -> Result<usize> {
        map_text_column(df, "AvgTxnAmt", rules::clean_avg_txn_amt)
    }

    /// Map `MerCode` to an appended `MerCategory` column and drop the raw
    /// code and narrative columns.
    ///
    /// Missing codes count as code 0. Returns the number of rows whose code
    /// has no category.
    pub fn clean_merchant_codes(&self, df: &mut DataFrame) -> Result<usize> {
        let codes = text_column(df, "MerCode")?;
        let ids = text_column(df, CLIENT_ID)?;
        require_column(df, "LastTxnNrtv")?;

        let mut categories: Vec<Option<String>> = Vec::with_capacity(codes.len());
        for (idx, code) in codes.into_iter().enumerate() {
            let code = match code.map(str::trim).filter(|c| !c.is_empty()) {
                None => MISSING_MERCHANT_CODE,
                Some(text) => parse_merchant_code(text).ok_or_else(|| PrepError::InvalidValue {
                    column: "MerCode".to_string(),
                    client_id: ids.get(idx).unwrap_or_default().to_string(),
                    value: text.to_string(),
                    expected: "integer",
                })?,
            };
            categories.push(self.merchant_categories.get(&code).map(str::to_string));
        }
        let unmapped = categories.iter().filter(|c| c.is_none()).count();

        df.drop_in_place("MerCode")?;
        df.drop_in_place("LastTxnNrtv")?;
        df.with_column(Column::new("MerCategory".into(), categories))?;
        Ok(unmapped)
    }

    /// Cast integer, float and categorical columns to their final types.
    ///
    /// Integer and float columns must exist; categorical ones are converted
    /// only when present (the testing set has no target, for example).
    /// A missing cell in a float column stays missing; in an integer column
    /// it is invalid.
    /// Returns how many cells were nulled under [`InvalidValuePolicy::Null`].
    pub fn restore_types(&self, df: &mut DataFrame) -> Result<usize> {
        let mut nulled = 0;

        for name in &self.column_types.integer {
            let (column, count) =
                self.parse_column(df, name, "integer", false, |t| t.parse::<i64>().ok())?;
            nulled += count;
            df.with_column(column)?;
        }

        for name in &self.column_types.float {
            let (column, count) =
                self.parse_column(df, name, "float", true, |t| t.parse::<f64>().ok())?;
            nulled += count;
            df.with_column(column)?;
        }

        for name in &self.column_types.categorical {
            if let Ok(column) = df.column(name) {
                let text = column.cast(&DataType::String)?;
                df.with_column(text)?;
            }
        }

        Ok(nulled)
    }

    fn parse_column<T, F>(
        &self,
        df: &DataFrame,
        name: &str,
        expected: &'static str,
        keep_missing: bool,
        parse: F,
    ) -> Result<(Column, usize)>
    where
        F: Fn(&str) -> Option<T>,
        Series: NamedFrom<Vec<Option<T>>, [Option<T>]>,
    {
        let values = text_column(df, name)?;
        let ids = text_column(df, CLIENT_ID)?;

        let mut parsed: Vec<Option<T>> = Vec::with_capacity(values.len());
        let mut nulled = 0;
        for (idx, value) in values.into_iter().enumerate() {
            if value.is_none() && keep_missing {
                parsed.push(None);
                continue;
            }
            let text = value.unwrap_or_default();
            match parse(text.trim()) {
                Some(v) => parsed.push(Some(v)),
                None if self.invalid_values == InvalidValuePolicy::Null => {
                    nulled += 1;
                    parsed.push(None);
                }
                None => {
                    return Err(PrepError::InvalidValue {
                        column: name.to_string(),
                        client_id: ids.get(idx).unwrap_or_default().to_string(),
                        value: text.to_string(),
                        expected,
                    })
                }
            }
        }

        Ok((Column::new(name.into(), parsed), nulled))
    }
}

/// Apply `rule` to every value of a column viewed as text.
///
/// Nulls are passed to the rule as "". Returns how many values changed.
fn map_text_column<F>(df: &mut DataFrame, name: &str, rule: F) -> Result<usize>
where
    F: Fn(&str) -> String,
{
    let original = text_column(df, name)?;

    let mut changed = 0;
    let cleaned: Vec<String> = original
        .into_iter()
        .map(|value| {
            let cleaned = rule(value.unwrap_or_default());
            if value != Some(cleaned.as_str()) {
                changed += 1;
            }
            cleaned
        })
        .collect();

    df.with_column(Column::new(name.into(), cleaned))?;
    Ok(changed)
}

/// A column converted to text
fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = require_column(df, name)?;
    let text = column.cast(&DataType::String)?;
    Ok(text.str()?.clone())
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| PrepError::MissingColumn {
        column: name.to_string(),
        table: "merged table".to_string(),
    })
}
