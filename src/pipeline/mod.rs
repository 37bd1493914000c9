//! Pipeline module - loading, cleaning and writing the loan tables

pub mod cleaner;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod rules;
pub mod runner;
pub mod writer;

pub use cleaner::*;
pub use error::{PrepError, Result};
pub use loader::*;
pub use lookup::*;
pub use rules::IncomeCategory;
pub use runner::*;
pub use writer::*;
