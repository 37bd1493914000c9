//! Value-level cleaning rules
//!
//! Every rule is a pure function over the text of one cell. The
//! [`RecordCleaner`](super::cleaner::RecordCleaner) maps them over whole
//! columns; keeping them free of any DataFrame plumbing makes each rule
//! testable on its own.
//!
//! Rules see null cells as empty text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::lookup::LookupTable;

/// Runs of non-word characters in an income range ("10,000 - 40,000")
static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("Invalid non-word regex"));

/// Substrings removed from every resolved county name, in this order
const COUNTY_AFFIXES: [&str; 4] = [".", "Co ", "co ", "County "];

/// Gender code for female customers
pub const GENDER_FEMALE: i8 = 0;
/// Gender code for male customers
pub const GENDER_MALE: i8 = 1;
/// Gender code when the input can't be interpreted
pub const GENDER_UNKNOWN: i8 = -1;

/// Code for a LoanHeldBefore value that is neither "0" nor "1"
pub const LOAN_HELD_UNKNOWN: i8 = -1;

pub const COUNTY_UNKNOWN: &str = "Unknown";
pub const COUNTY_OUTSIDE_ROI: &str = "Outside ROI";

/// True for non-empty text made only of ASCII digits.
///
/// No sign, no decimal point and no surrounding whitespace.
pub fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Age survives only as an all-digit string; anything else becomes "".
pub fn clean_age(text: &str) -> String {
    if is_all_digits(text) {
        text.to_string()
    } else {
        String::new()
    }
}

/// Map free-text gender to 0 (female), 1 (male) or -1 (unknown).
pub fn clean_gender(text: &str) -> i8 {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();

    if lowered.starts_with('f') {
        GENDER_FEMALE
    } else if lowered.starts_with('m') {
        GENDER_MALE
    } else if trimmed == "0" {
        GENDER_FEMALE
    } else if trimmed == "1" {
        GENDER_MALE
    } else {
        GENDER_UNKNOWN
    }
}

/// Income bucket derived from an income range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IncomeCategory {
    Low,
    LowerMiddle,
    Upper,
    UpperMiddle,
    High,
}

impl IncomeCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            IncomeCategory::Low => "Low",
            IncomeCategory::LowerMiddle => "Lower Middle",
            IncomeCategory::Upper => "Upper",
            IncomeCategory::UpperMiddle => "Upper Middle",
            IncomeCategory::High => "High",
        }
    }

    /// The band a lower/upper limit pair falls in, if any. The first
    /// matching band wins; a missing limit fails every comparison it takes
    /// part in.
    pub fn band(lower: Option<f64>, upper: Option<f64>) -> Option<Self> {
        let within = |min: f64, max: f64| {
            matches!((lower, upper), (Some(lo), Some(hi)) if lo >= min && hi <= max)
        };

        if within(0.0, 10_000.0) {
            Some(IncomeCategory::Low)
        } else if within(10_001.0, 40_000.0) {
            Some(IncomeCategory::LowerMiddle)
        } else if within(40_001.0, 60_000.0) {
            Some(IncomeCategory::Upper)
        } else if within(60_001.0, 100_000.0) {
            Some(IncomeCategory::UpperMiddle)
        } else if lower.is_some_and(|lo| lo > 100_000.0) {
            Some(IncomeCategory::High)
        } else {
            None
        }
    }

    /// Bucket a lower/upper limit pair, defaulting to [`IncomeCategory::LowerMiddle`].
    pub fn from_limits(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self::band(lower, upper).unwrap_or(IncomeCategory::LowerMiddle)
    }
}

impl fmt::Display for IncomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split an income range into its lower and upper limits.
///
/// Non-word runs are first collapsed to "-". A range that splits into more
/// than two segments is malformed and yields no limits.
pub fn income_limits(text: &str) -> (Option<f64>, Option<f64>) {
    let normalized = NON_WORD_RUN.replace_all(text, "-");
    let segments: Vec<&str> = normalized.split('-').collect();

    let parse = |segment: &str| segment.trim().parse::<f64>().ok().filter(|v| !v.is_nan());

    match segments.as_slice() {
        [lower] => (parse(lower), None),
        [lower, upper] => (parse(lower), parse(upper)),
        _ => (None, None),
    }
}

/// Income range text → income category
pub fn clean_income_group(text: &str) -> IncomeCategory {
    let (lower, upper) = income_limits(text);
    IncomeCategory::from_limits(lower, upper)
}

/// Whether an income range falls outside every band and gets the default
pub fn income_range_defaulted(text: &str) -> bool {
    let (lower, upper) = income_limits(text);
    IncomeCategory::band(lower, upper).is_none()
}

/// Resolve a free-text county to a canonical county, before affix stripping.
///
/// The digit check is a separate test ahead of the ladder: any later branch
/// that matches, evaluated on the original text, replaces its "Unknown".
pub fn resolve_county(text: &str, towns: &LookupTable) -> String {
    let mut county = if is_all_digits(text) {
        COUNTY_UNKNOWN.to_string()
    } else {
        text.to_string()
    };

    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();

    if lowered == "sandyford" || lowered.contains("dublin") || lowered.contains("blin") {
        county = "Dublin".to_string();
    } else if lowered.contains("cork") {
        county = "Cork".to_string();
    } else if lowered.contains("kildare") {
        county = "Kildare".to_string();
    } else if lowered.contains("galway") {
        county = "Galway".to_string();
    } else if let Some(mapped) = towns.get(trimmed) {
        county = mapped.split('/').next().unwrap_or_default().trim().to_string();
    } else if !towns.contains_value(trimmed) {
        county = COUNTY_OUTSIDE_ROI.to_string();
    } else if trimmed.is_empty() {
        county = COUNTY_UNKNOWN.to_string();
    }

    county
}

/// Remove ".", "Co ", "co " and "County " wherever they occur.
pub fn strip_county_affixes(county: &str) -> String {
    COUNTY_AFFIXES
        .iter()
        .fold(county.to_string(), |acc, affix| acc.replace(affix, ""))
}

/// Free-text county → canonical county name
pub fn clean_county(text: &str, towns: &LookupTable) -> String {
    strip_county_affixes(&resolve_county(text, towns))
}

/// "0" and "1" pass through; anything else is -1.
pub fn clean_loan_held_before(text: &str) -> i8 {
    match text {
        "0" => 0,
        "1" => 1,
        _ => LOAN_HELD_UNKNOWN,
    }
}

/// Product counts must be all-digit; anything else counts as 0.
pub fn clean_products_held(text: &str) -> String {
    if !is_all_digits(text) {
        return "0".to_string();
    }
    if text.parse::<i64>().is_ok_and(|n| n < 0) {
        return "0".to_string();
    }
    text.to_string()
}

/// Keep only the ASCII digits of an amount, in their original order.
///
/// The decimal point goes too, so "12.50" becomes "1250".
pub fn clean_avg_txn_amt(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}
