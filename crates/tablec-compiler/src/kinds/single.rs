//! Singleton tables
//!
//! A `[Single]`-prefixed workbook holds one record laid out transposed:
//! fields run down rows, the header lines run across columns, and one
//! extra column carries the values. Each field may be populated at most
//! once. Singleton tables emit no schema or data blob, only a constant
//! class per platform.

use dashmap::DashMap;

use tablec_core::header::HeaderInfo;
use tablec_core::EnumRegistry;
use tablec_xlsx::{cell_name, Workbook};

use crate::error::{CompileError, Result};
use crate::kinds::{message_name, SINGLE_TABLE_PREFIX};
use crate::parser::{is_header_line, parse_header, Orientation};

#[derive(Debug, Clone)]
pub struct SingleTable {
    pub name: String,
    pub header: HeaderInfo,
    /// One value slot per header field, in field order
    pub values: Vec<Option<String>>,
}

/// All singleton tables of a run, keyed by script name
#[derive(Debug, Default)]
pub struct SingleTables {
    tables: DashMap<String, SingleTable>,
}

impl SingleTables {
    pub fn new() -> SingleTables {
        SingleTables::default()
    }

    pub fn parse_workbook(
        &self,
        stem: &str,
        workbook: &Workbook,
        enums: &EnumRegistry,
    ) -> Result<()> {
        let clean_stem = stem.replacen(SINGLE_TABLE_PREFIX, "", 1);
        let count = workbook.sheet_count();

        for sheet in workbook.sheets() {
            let name = message_name(&clean_stem, sheet.name(), count);
            let header = parse_header(sheet, &name, Orientation::Rows, enums)?;
            let mut values: Vec<Option<String>> = vec![None; header.fields.len()];

            for col in sheet.used_columns() {
                if is_header_line(sheet, Orientation::Rows, col) {
                    continue;
                }
                for (row, text) in sheet.column_cells(col) {
                    if row == 1 || sheet.is_rear_merged(row, col) {
                        continue;
                    }
                    let field_idx =
                        header
                            .field_at(row)
                            .ok_or_else(|| CompileError::UnmappedCell {
                                table: name.clone(),
                                cell: cell_name(row, col),
                            })?;
                    if values[field_idx].is_some() {
                        return Err(CompileError::SingleMultiValue { table: name });
                    }
                    values[field_idx] = Some(text.trim().to_string());
                }
            }

            match self.tables.entry(name.clone()) {
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    entry.insert(SingleTable {
                        name,
                        header,
                        values,
                    });
                }
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    return Err(CompileError::DuplicateTable(name));
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Snapshot sorted by script name
    pub fn sorted(&self) -> Vec<SingleTable> {
        let mut tables: Vec<SingleTable> =
            self.tables.iter().map(|entry| entry.value().clone()).collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tablec_xlsx::XlsxWriter;

    fn global_writer() -> (XlsxWriter, usize) {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 2, 1, "max_level");
        writer.set_cell(s, 3, 1, "title");
        writer.set_cell(s, 1, 2, "#type");
        writer.set_cell(s, 2, 2, "int");
        writer.set_cell(s, 3, 2, "string");
        writer.set_cell(s, 1, 3, "#platform");
        writer.set_cell(s, 2, 3, "cs");
        writer.set_cell(s, 3, 3, "cs");
        (writer, s)
    }

    fn parse(writer: XlsxWriter) -> Result<SingleTables> {
        let workbook = Workbook::read(Cursor::new(writer.to_bytes().unwrap())).unwrap();
        let tables = SingleTables::new();
        let enums = EnumRegistry::new();
        tables.parse_workbook("[Single]Global", &workbook, &enums)?;
        Ok(tables)
    }

    #[test]
    fn one_value_per_field() {
        let (mut writer, s) = global_writer();
        writer.set_cell(s, 2, 4, "99");
        writer.set_cell(s, 3, 4, "Hello");

        let tables = parse(writer).unwrap();
        let sorted = tables.sorted();
        assert_eq!(sorted.len(), 1);
        let global = &sorted[0];
        // prefix is stripped from the script name
        assert_eq!(global.name, "Global");
        assert_eq!(global.values[0].as_deref(), Some("99"));
        assert_eq!(global.values[1].as_deref(), Some("Hello"));
    }

    #[test]
    fn second_value_column_is_fatal() {
        let (mut writer, s) = global_writer();
        writer.set_cell(s, 2, 4, "99");
        writer.set_cell(s, 2, 5, "100");

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::SingleMultiValue { table } if table == "Global"));
    }

    #[test]
    fn unmapped_value_row_is_fatal() {
        let (mut writer, s) = global_writer();
        writer.set_cell(s, 9, 4, "stray");

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::UnmappedCell { .. }));
    }
}
