//! Key → value reference tables loaded from two-column CSV files
//!
//! Used for the county/town mapping and the merchant code → category
//! mapping. Tables are built once per run and never mutated afterwards.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;

use super::error::{PrepError, Result};
use super::loader::read_latin1_csv;

/// Merchant code used for rows whose code is missing
pub const MISSING_MERCHANT_CODE: i64 = 0;

/// Category assigned to [`MISSING_MERCHANT_CODE`]
pub const UNKNOWN_MERCHANT_CATEGORY: &str = "Unknown";

/// An immutable key → value mapping
#[derive(Debug, Clone, Default)]
pub struct LookupTable<K = String> {
    entries: HashMap<K, String>,
    values: HashSet<String>,
}

impl<K: Eq + Hash> LookupTable<K> {
    /// Build a table from key/value pairs. Later duplicates of a key win.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
    {
        let entries: HashMap<K, String> = pairs.into_iter().collect();
        let values = entries.values().cloned().collect();
        Self { entries, values }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&str>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `value` is one of the mapped values
    pub fn contains_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl LookupTable<String> {
    /// Load a lookup from a CSV file: first column is the key, second the value.
    ///
    /// Rows with a missing key or a missing value are skipped.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let table = Self::from_pairs(read_pairs(path)?);
        tracing::debug!(path = %path.display(), entries = table.len(), "Loaded lookup table");
        Ok(table)
    }
}

impl LookupTable<i64> {
    /// Load the merchant code → category table and add the entry for
    /// missing codes.
    ///
    /// Codes written as decimals ("5411.0") are truncated the way an integer
    /// cast would truncate them. Codes are keyed in file order, so when two
    /// rows land on the same code the later row wins.
    pub fn merchant_categories_from_csv(path: &Path) -> Result<Self> {
        let mut pairs = Vec::new();
        for (key, value) in read_pairs(path)? {
            let code = parse_merchant_code(&key).ok_or_else(|| PrepError::InvalidLookup {
                path: path.to_path_buf(),
                reason: format!("merchant code '{}' is not an integer", key),
            })?;
            pairs.push((code, value));
        }

        let table = LookupTable::from_pairs(pairs);
        tracing::debug!(path = %path.display(), entries = table.len(), "Loaded merchant categories");
        Ok(table.with_missing_code_entry())
    }

    /// Add `0 → "Unknown"`, overriding any entry the file had for code 0.
    pub fn with_missing_code_entry(mut self) -> Self {
        self.entries
            .insert(MISSING_MERCHANT_CODE, UNKNOWN_MERCHANT_CATEGORY.to_string());
        self.values = self.entries.values().cloned().collect();
        self
    }
}

/// Key/value pairs from the first two columns of a CSV file, in row order.
fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let df = read_latin1_csv(path)?;
    let columns = df.get_columns();

    if columns.len() < 2 {
        return Err(PrepError::InvalidLookup {
            path: path.to_path_buf(),
            reason: format!("expected at least 2 columns, found {}", columns.len()),
        });
    }

    let keys = columns[0].str()?;
    let values = columns[1].str()?;

    Ok(keys
        .into_iter()
        .zip(values)
        .filter_map(|pair| match pair {
            (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect())
}

/// Parse a merchant code, truncating a fractional part.
///
/// Blank text is not a code; callers decide what a missing code means.
pub fn parse_merchant_code(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
            .map(|v| v.trunc() as i64)
    })
}
