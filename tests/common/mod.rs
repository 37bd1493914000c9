//! Shared test utilities and fixture generators

use std::path::Path;

use loanprep::config::PipelineConfig;
use polars::prelude::*;
use tempfile::TempDir;

/// Encode text as ISO-8859-1, the encoding of the real extracts
pub fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).expect("fixture text must be Latin-1"))
        .collect()
}

/// Write `text` as an ISO-8859-1 file, creating parent directories
pub fn write_latin1(path: &Path, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, latin1(text)).unwrap();
}

/// Training demographics. Customer 104 appears in no other extract and
/// customer 101 is listed twice; the first row wins.
fn training_demographics(bad_age: bool) -> String {
    let age_102 = if bad_age { "n/a" } else { "45" };
    format!(
        "Client ID,Age,\"Gender \n1: Female, 2: Male\",County,Income Group\n\
         103,29,1,D\u{fa}n Laoghaire,150000\n\
         101,34,Female,Sandyford,0-10000\n\
         102,{age_102},m,Naas,60001-100000\n\
         104,51,F,Cork,0-10000\n\
         101,99,Male,Galway,40001-60000\n"
    )
}

/// Create the full raw/external layout under `root` and return the
/// default configuration for it.
///
/// Three customers (101, 102, 103) are present in every training extract,
/// two (201, 202) in every testing extract.
pub fn write_fixture(root: &Path, bad_age: bool) -> PipelineConfig {
    let config = PipelineConfig::from_data_dir(root);

    // Training
    write_latin1(&config.training.demographics, &training_demographics(bad_age));
    write_latin1(
        &config.training.previous_loans,
        "Client ID,Held Loan previously\n101,1\n102,0\n103,yes\n104,1\n",
    );
    write_latin1(
        &config.training.products_held,
        "Client ID,# Products in bank\n101,2\n102,abc\n103,3\n",
    );
    write_latin1(
        &config.training.avg_txn_amount,
        "Client ID,Average amount of CA transaction\n101,120.50\n102,\u{a3}80\n103,45\n",
    );
    write_latin1(
        &config.training.txn_details,
        "Client,Num Transactions,Last TXN Amount,Merchant Code,Last Transaction Narrative\n\
         101,12,35.5,5411,TESCO\n\
         102,3,10,,\n\
         103,7,99.99,9999,ACME\n",
    );
    write_latin1(
        config.training.loan_flag.as_deref().unwrap(),
        "Client ID,Loan Flag\n101,1\n102,0\n103,0\n",
    );

    // Testing
    write_latin1(
        &config.testing.demographics,
        "Client ID,Age,\"Gender \n1: Female, 2: Male\",County,Income Group\n\
         201,62,0,Athlone,10001-40000\n\
         202,38,Male,London,bad range\n",
    );
    write_latin1(
        &config.testing.previous_loans,
        "Client ID,Held Loan previously\n201,0\n202,1\n",
    );
    write_latin1(
        &config.testing.products_held,
        "Client ID,# Products in bank\n201,1\n202,4\n",
    );
    write_latin1(
        &config.testing.avg_txn_amount,
        "Client ID,Average amount of CA transaction\n201,300\n202,12a3.4b\n",
    );
    write_latin1(
        &config.testing.txn_details,
        "Client,Num Transactions,Last TXN Amount,Merchant Code,Last Transaction Narrative\n\
         201,5,20,5812,CAFE\n\
         202,9,42.25,5411.0,LIDL\n",
    );

    // Lookups
    write_latin1(
        &config.lookups.county_towns,
        "Town,County\nNaas,Co. Kildare\nD\u{fa}n Laoghaire,Dublin\nAthlone,Westmeath / Roscommon\n",
    );
    write_latin1(
        &config.lookups.merchant_categories,
        "Merchant Code,Category\n5411,Groceries\n5812,Restaurants\n",
    );

    config
}

/// A temporary data root with the standard fixture
pub fn create_fixture() -> (TempDir, PipelineConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), false);
    (temp_dir, config)
}

/// Like [`create_fixture`], but customer 102's age is not a number
pub fn create_fixture_with_bad_age() -> (TempDir, PipelineConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), true);
    (temp_dir, config)
}

/// Text values of a column
pub fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

/// Text values of a column that has no nulls
pub fn texts(df: &DataFrame, name: &str) -> Vec<String> {
    strings(df, name).into_iter().map(Option::unwrap).collect()
}

pub fn integers(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name).unwrap().i64().unwrap().into_iter().collect()
}

pub fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

/// Assert that a DataFrame has exactly these columns, in order
pub fn assert_columns(df: &DataFrame, expected: &[&str]) {
    let actual: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    assert_eq!(actual, expected, "Column mismatch");
}
