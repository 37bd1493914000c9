//! loanprep: Loan-Uptake Data Preparation Library
//!
//! Joins the raw per-customer extracts of a loan-uptake study on ClientID
//! and repairs their free-text fields into model-ready columns.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod utils;
