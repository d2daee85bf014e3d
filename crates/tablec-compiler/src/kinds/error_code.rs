//! The error-code table
//!
//! `ErrorCode.xlsx` declares the game's error codes. Fixed columns:
//! `code` (long), `codeStr` (string), `content` (%string) and `comment`
//! (string). Every sheet contributes rows; the sheet named `Common`
//! routes its constants to the frame output, all other sheets to the
//! business output. All sheets share one `ErrorCode` message in the
//! schema and are serialized into a single data blob.

use std::sync::RwLock;

use dashmap::DashMap;

use tablec_core::errcode::{ErrorCodeEntry, ErrorCodeSheet};
use tablec_core::header::HeaderInfo;
use tablec_core::{EnumRegistry, ErrorCodeRegistry};
use tablec_xlsx::{cell_name, Workbook};

use crate::error::{CompileError, Result};
use crate::kinds::common::CommonTable;
use crate::kinds::{check_fixed_fields, message_name};
use crate::parser::{is_header_line, parse_header, Orientation};

/// The columns every error-code sheet must declare, with their types
pub const ERROR_CODE_FIXED_FIELDS: [(&str, &str); 4] = [
    ("code", "long"),
    ("codeStr", "string"),
    ("content", "%string"),
    ("comment", "string"),
];

/// All error-code sheets share this message in the emitted schema
pub const ERROR_CODE_MESSAGE_NAME: &str = "ErrorCode";

/// Parsed state of the error-code table
#[derive(Debug, Default)]
pub struct ErrorCodeTables {
    /// Per-sheet headers and cell grids, for the data pass
    sheets: DashMap<String, CommonTable>,
    /// Code constants grouped by sheet, for script emission
    pub codes: ErrorCodeRegistry,
    /// The first parsed header defines the shared `ErrorCode` message
    first_header: RwLock<Option<HeaderInfo>>,
}

impl ErrorCodeTables {
    pub fn new() -> ErrorCodeTables {
        ErrorCodeTables::default()
    }

    pub fn parse_workbook(
        &self,
        stem: &str,
        workbook: &Workbook,
        enums: &EnumRegistry,
    ) -> Result<()> {
        let count = workbook.sheet_count();
        for sheet in workbook.sheets() {
            let table = message_name(stem, sheet.name(), count);
            let header = parse_header(sheet, &table, Orientation::Columns, enums)?;
            check_fixed_fields(&header, &ERROR_CODE_FIXED_FIELDS, &table)?;

            {
                let mut first = self.first_header.write().expect("header lock");
                if first.is_none() {
                    let mut shared = header.clone();
                    shared.message_name = ERROR_CODE_MESSAGE_NAME.to_string();
                    *first = Some(shared);
                }
            }

            let mut entries: Vec<ErrorCodeEntry> = Vec::new();
            for (row, cells) in sheet.used_rows() {
                if is_header_line(sheet, Orientation::Columns, row) {
                    continue;
                }

                let mut entry = ErrorCodeEntry::default();
                for (&col, text) in cells {
                    if col == 1 || sheet.is_rear_merged(row, col) {
                        continue;
                    }
                    let field_idx =
                        header
                            .field_at(col)
                            .ok_or_else(|| CompileError::UnmappedCell {
                                table: table.clone(),
                                cell: cell_name(row, col),
                            })?;
                    let text = text.trim();

                    match header.fields[field_idx].name.as_str() {
                        "code" => {
                            entry.code = text.parse::<i64>().map_err(|_| {
                                CompileError::UnparseableValue {
                                    table: table.clone(),
                                    field: "code".to_string(),
                                    ty: "long",
                                    text: text.to_string(),
                                }
                            })?;
                        }
                        "codeStr" => {
                            if entries.iter().any(|e| e.code_str == text) {
                                return Err(CompileError::DuplicateKey {
                                    table: table.clone(),
                                    field: "codeStr".to_string(),
                                    value: text.to_string(),
                                });
                            }
                            entry.code_str = text.to_string();
                        }
                        "comment" => entry.comment = text.to_string(),
                        _ => {}
                    }
                }
                // rows without a codeStr declare no constant
                if entry.code_str.is_empty() {
                    continue;
                }
                entries.push(entry);
            }

            if !entries.is_empty()
                && !self.codes.insert(ErrorCodeSheet {
                    sheet_name: sheet.name().to_string(),
                    entries,
                })
            {
                return Err(CompileError::DuplicateTable(sheet.name().to_string()));
            }

            match self.sheets.entry(table.clone()) {
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(CommonTable {
                        name: table,
                        header,
                        sheet: sheet.clone(),
                    });
                }
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    return Err(CompileError::DuplicateTable(table));
                }
            }
        }
        Ok(())
    }

    /// The header backing the shared `ErrorCode` message
    pub fn header(&self) -> Option<HeaderInfo> {
        self.first_header.read().expect("header lock").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Per-sheet snapshot sorted by name, for the data pass
    pub fn sorted(&self) -> Vec<CommonTable> {
        let mut tables: Vec<CommonTable> =
            self.sheets.iter().map(|entry| entry.value().clone()).collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }
}
