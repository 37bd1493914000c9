//! Source table loading, column renaming, dedup and the ClientID join

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;

use super::error::{PrepError, Result};

/// Join key shared by every source table
pub const CLIENT_ID: &str = "ClientID";

/// Temporary column that carries the demographics row order through the join
const ROW_ORDER: &str = "__row_order";

/// Cell texts read as missing, in addition to empty cells
pub const MISSING_VALUE_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// The raw extracts that make up one dataset, in join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceTable {
    Demographics,
    PreviousLoans,
    ProductsHeld,
    AvgTxnAmount,
    TxnDetails,
    LoanFlag,
}

impl SourceTable {
    /// Human readable name used in progress output and reports
    pub const fn label(self) -> &'static str {
        match self {
            SourceTable::Demographics => "Demographics",
            SourceTable::PreviousLoans => "Previous Loan Holdings",
            SourceTable::ProductsHeld => "Products Held",
            SourceTable::AvgTxnAmount => "Average Transaction Amount",
            SourceTable::TxnDetails => "Transaction Details",
            SourceTable::LoanFlag => "Loan Flag",
        }
    }

    /// Raw header → canonical column name
    pub const fn column_map(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SourceTable::Demographics => &[
                ("Client ID", CLIENT_ID),
                ("Age", "Age"),
                ("Gender \n1: Female, 2: Male", "Gender"),
                ("County", "County"),
                ("Income Group", "IncomeGroup"),
            ],
            SourceTable::PreviousLoans => &[
                ("Client ID", CLIENT_ID),
                ("Held Loan previously", "LoanHeldBefore"),
            ],
            SourceTable::ProductsHeld => &[
                ("Client ID", CLIENT_ID),
                ("# Products in bank", "NoOfProductsHeld"),
            ],
            SourceTable::AvgTxnAmount => &[
                ("Client ID", CLIENT_ID),
                ("Average amount of CA transaction", "AvgTxnAmt"),
            ],
            SourceTable::TxnDetails => &[
                ("Client", CLIENT_ID),
                ("Num Transactions", "NoOfTxns"),
                ("Last TXN Amount", "LastTxnAmt"),
                ("Merchant Code", "MerCode"),
                ("Last Transaction Narrative", "LastTxnNrtv"),
            ],
            SourceTable::LoanFlag => &[("Client ID", CLIENT_ID), ("Loan Flag", "LoanFlag")],
        }
    }
}

/// Row counts observed while loading one source table
#[derive(Debug, Clone, Serialize)]
pub struct SourceLoadStats {
    pub table: SourceTable,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
}

/// The joined table plus what was seen on the way in
#[derive(Debug)]
pub struct LoadedDataset {
    pub df: DataFrame,
    pub sources: Vec<SourceLoadStats>,
}

/// Read an ISO-8859-1 encoded CSV file with every column kept as text.
///
/// The bytes are decoded up front so polars only ever sees UTF-8. Schema
/// inference is switched off (`infer_schema_length = 0`), which makes every
/// column a `String` column. Empty cells and [`MISSING_VALUE_TOKENS`]
/// become nulls.
pub fn read_latin1_csv(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|source| PrepError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    // Windows-1252 is the WHATWG decoder for the ISO-8859-1 label
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
    let cursor = Cursor::new(text.into_owned().into_bytes());

    let null_values = NullValues::AllColumns(
        MISSING_VALUE_TOKENS.iter().map(|token| (*token).into()).collect(),
    );

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_null_values(Some(null_values.clone())))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| PrepError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load one source table: read, rename to canonical names, drop duplicate IDs.
pub fn prepare_source_table(table: SourceTable, path: &Path) -> Result<(DataFrame, SourceLoadStats)> {
    let df = read_latin1_csv(path)?;
    let rows_read = df.height();

    let df = rename_columns(df, table, &path.display().to_string())?;
    let df = drop_duplicate_ids(&df)?;

    let stats = SourceLoadStats {
        table,
        rows_read,
        duplicates_dropped: rows_read - df.height(),
    };
    tracing::debug!(
        table = table.label(),
        path = %path.display(),
        rows = rows_read,
        duplicates = stats.duplicates_dropped,
        "Loaded source table"
    );

    Ok((df, stats))
}

/// Rename the raw headers of `table` to their canonical names.
///
/// A header that already carries its canonical name is accepted as-is.
/// Headers are compared with whitespace runs collapsed, so a header whose
/// embedded line break was saved as CRLF still matches.
pub fn rename_columns(mut df: DataFrame, table: SourceTable, source: &str) -> Result<DataFrame> {
    for &(raw, canonical) in table.column_map() {
        let actual = df
            .get_column_names()
            .iter()
            .find(|name| header_matches(name, raw) || name.as_str() == canonical)
            .map(|name| name.to_string())
            .ok_or_else(|| PrepError::MissingColumn {
                column: raw.to_string(),
                table: source.to_string(),
            })?;

        if actual != canonical {
            df.rename(&actual, canonical.into())?;
        }
    }

    Ok(df)
}

fn header_matches(actual: &str, expected: &str) -> bool {
    actual == expected || actual.split_whitespace().eq(expected.split_whitespace())
}

/// Keep the first row for every ClientID, preserving row order.
pub fn drop_duplicate_ids(df: &DataFrame) -> Result<DataFrame> {
    let keep: Vec<bool> = {
        let ids = df
            .column(CLIENT_ID)
            .map_err(|_| PrepError::MissingColumn {
                column: CLIENT_ID.to_string(),
                table: "source table".to_string(),
            })?
            .str()?;
        let mut seen: HashSet<Option<&str>> = HashSet::with_capacity(ids.len());
        ids.into_iter().map(|id| seen.insert(id)).collect()
    };

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Inner-join all tables on ClientID.
///
/// Rows come out in the order of the first table, like a merge that keeps
/// the left keys' order.
pub fn join_on_client_id(tables: Vec<DataFrame>) -> Result<DataFrame> {
    let mut tables = tables.into_iter();
    let first = tables.next().ok_or_else(|| PrepError::DataFrame {
        message: "no tables to join".to_string(),
    })?;
    ensure_client_id(&first)?;

    let mut lf = first.with_row_index(ROW_ORDER.into(), None)?.lazy();
    for table in tables {
        ensure_client_id(&table)?;
        lf = lf.inner_join(table.lazy(), col(CLIENT_ID), col(CLIENT_ID));
    }

    let mut joined = lf
        .collect()?
        .sort([ROW_ORDER], SortMultipleOptions::default())?;
    joined.drop_in_place(ROW_ORDER)?;

    Ok(joined)
}

fn ensure_client_id(df: &DataFrame) -> Result<()> {
    if df.get_column_names().iter().any(|name| name.as_str() == CLIENT_ID) {
        Ok(())
    } else {
        Err(PrepError::MissingColumn {
            column: CLIENT_ID.to_string(),
            table: "join input".to_string(),
        })
    }
}

/// Load every source table of a dataset and join them into one table
pub fn load_dataset(sources: &[(SourceTable, &Path)]) -> Result<LoadedDataset> {
    let mut tables = Vec::with_capacity(sources.len());
    let mut stats = Vec::with_capacity(sources.len());

    for &(table, path) in sources {
        let (df, table_stats) = prepare_source_table(table, path)?;
        tables.push(df);
        stats.push(table_stats);
    }

    let df = join_on_client_id(tables)?;
    tracing::info!(tables = stats.len(), rows = df.height(), "Joined source tables");

    Ok(LoadedDataset { df, sources: stats })
}
