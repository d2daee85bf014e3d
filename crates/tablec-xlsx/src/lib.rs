//! # tablec-xlsx
//!
//! Minimal XLSX (Office Open XML) reader and writer for tablec.
//!
//! Configuration tables only need cell text and merged-cell ranges, so the
//! model here is a sparse text grid per sheet: no styles, no formulas
//! beyond their cached values, no comments.

pub mod addr;
pub mod error;
pub mod reader;
pub mod writer;

pub use addr::{cell_name, column_to_letters, parse_cell_ref};
pub use error::{XlsxError, XlsxResult};
pub use reader::{MergedRange, Sheet, Workbook};
pub use writer::XlsxWriter;
