//! Common data tables
//!
//! One parsed sheet of a common table: its header plus the sheet itself,
//! kept in memory so the data pass does not re-read the archive. The
//! registry is shared across the parallel head-parse phase.

use dashmap::DashMap;

use tablec_core::header::HeaderInfo;
use tablec_core::EnumRegistry;
use tablec_xlsx::{Sheet, Workbook};

use crate::error::{CompileError, Result};
use crate::kinds::message_name;
use crate::parser::{parse_header, Orientation};

#[derive(Debug, Clone)]
pub struct CommonTable {
    pub name: String,
    pub header: HeaderInfo,
    pub sheet: Sheet,
}

/// All common tables of a run, keyed by message name
#[derive(Debug, Default)]
pub struct CommonTables {
    tables: DashMap<String, CommonTable>,
}

impl CommonTables {
    pub fn new() -> CommonTables {
        CommonTables::default()
    }

    /// Parse every sheet of a workbook and register the results.
    ///
    /// A message name already registered by another workbook (or another
    /// sheet) is fatal.
    pub fn parse_workbook(
        &self,
        stem: &str,
        workbook: &Workbook,
        enums: &EnumRegistry,
    ) -> Result<()> {
        let count = workbook.sheet_count();
        for sheet in workbook.sheets() {
            let name = message_name(stem, sheet.name(), count);
            let header = parse_header(sheet, &name, Orientation::Columns, enums)?;

            match self.tables.entry(name.clone()) {
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    entry.insert(CommonTable {
                        name,
                        header,
                        sheet: sheet.clone(),
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

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Snapshot sorted by message name, for deterministic emission
    pub fn sorted(&self) -> Vec<CommonTable> {
        let mut tables: Vec<CommonTable> =
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

    fn item_workbook() -> Workbook {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "id");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "*int");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        Workbook::read(Cursor::new(writer.to_bytes().unwrap())).unwrap()
    }

    #[test]
    fn registers_each_sheet() {
        let tables = CommonTables::new();
        let enums = EnumRegistry::new();
        tables
            .parse_workbook("Item", &item_workbook(), &enums)
            .unwrap();

        let sorted = tables.sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].name, "Item");
        assert_eq!(sorted[0].header.fields.len(), 1);
    }

    #[test]
    fn duplicate_message_name_is_fatal() {
        let tables = CommonTables::new();
        let enums = EnumRegistry::new();
        tables
            .parse_workbook("Item", &item_workbook(), &enums)
            .unwrap();
        let err = tables
            .parse_workbook("Item", &item_workbook(), &enums)
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateTable(name) if name == "Item"));
    }

    #[test]
    fn multi_sheet_names_include_sheet() {
        let mut writer = XlsxWriter::new();
        for sheet_name in ["Weapons", "Armor"] {
            let s = writer.add_sheet(sheet_name);
            writer.set_cell(s, 1, 1, "#name");
            writer.set_cell(s, 1, 2, "id");
            writer.set_cell(s, 2, 1, "#type");
            writer.set_cell(s, 2, 2, "int");
            writer.set_cell(s, 3, 1, "#platform");
            writer.set_cell(s, 3, 2, "cs");
        }
        let workbook = Workbook::read(Cursor::new(writer.to_bytes().unwrap())).unwrap();

        let tables = CommonTables::new();
        let enums = EnumRegistry::new();
        tables.parse_workbook("Item", &workbook, &enums).unwrap();

        let names: Vec<String> = tables.sorted().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Item_Armor", "Item_Weapons"]);
    }
}
