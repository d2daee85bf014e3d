//! Table kinds
//!
//! Workbooks are routed by file name: `Enum.xlsx` declares enumerations,
//! `ErrorCode.xlsx` declares error codes, a `[Single]` prefix marks a
//! transposed singleton table, anything else is a common data table.

pub mod common;
pub mod enums;
pub mod error_code;
pub mod single;

use tablec_core::header::HeaderInfo;

use crate::error::{CompileError, Result};

/// File stem reserved for the enum table
pub const ENUM_TABLE_NAME: &str = "Enum";

/// File stem reserved for the error-code table
pub const ERROR_CODE_TABLE_NAME: &str = "ErrorCode";

/// File-stem prefix marking a singleton table
pub const SINGLE_TABLE_PREFIX: &str = "[Single]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Common,
    Enum,
    ErrorCode,
    Single,
}

/// Classify a workbook by its file stem.
pub fn classify(stem: &str) -> TableKind {
    if stem == ENUM_TABLE_NAME {
        TableKind::Enum
    } else if stem == ERROR_CODE_TABLE_NAME {
        TableKind::ErrorCode
    } else if stem.starts_with(SINGLE_TABLE_PREFIX) {
        TableKind::Single
    } else {
        TableKind::Common
    }
}

/// The message name for one sheet of a workbook.
///
/// Single-sheet workbooks use the file stem alone; multi-sheet workbooks
/// append the sheet name so each sheet gets its own message.
pub fn message_name(stem: &str, sheet_name: &str, sheet_count: usize) -> String {
    if sheet_count == 1 {
        stem.to_string()
    } else {
        format!("{stem}_{sheet_name}")
    }
}

/// Check the fixed field set of a special table: every `(name, type)`
/// pair must be present with exactly the declared type token. Missing
/// fields are reported together.
pub(crate) fn check_fixed_fields(
    header: &HeaderInfo,
    fixed: &[(&str, &str)],
    table: &str,
) -> Result<()> {
    let mut missing: Vec<&str> = fixed.iter().map(|(name, _)| *name).collect();

    for field in &header.fields {
        if let Some((_, expected)) = fixed.iter().find(|(name, _)| *name == field.name) {
            if field.raw_type != *expected {
                return Err(CompileError::FixedFieldType {
                    table: table.to_string(),
                    field: field.name.clone(),
                    expected: (*expected).to_string(),
                    found: field.raw_type.clone(),
                });
            }
            missing.retain(|name| *name != field.name);
        }
    }

    if !missing.is_empty() {
        return Err(CompileError::MissingFixedFields {
            table: table.to_string(),
            missing: missing.join(","),
        });
    }

    Ok(())
}
