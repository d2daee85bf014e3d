//! The enum table
//!
//! `Enum.xlsx` declares every enumeration other tables may reference, one
//! enum per data row. The fixed columns are `name`, `field`, `value`,
//! `platform` and `comment`, all typed `string`; member names and their
//! integer values are `|`-separated lists that must be the same length.
//!
//! This table is parsed before any other so the registry is complete when
//! the type algebra starts resolving enum tokens.

use tablec_core::enums::{EnumInfo, EnumMember};
use tablec_core::{EnumRegistry, PlatformMask, ENUM_MEMBER_SEPARATOR};
use tablec_xlsx::{cell_name, Workbook};

use crate::error::{CompileError, Result};
use crate::kinds::{check_fixed_fields, message_name};
use crate::parser::{is_header_line, parse_header, Orientation};

/// The columns every enum table must declare, with their required types
pub const ENUM_FIXED_FIELDS: [(&str, &str); 5] = [
    ("name", "string"),
    ("field", "string"),
    ("value", "string"),
    ("platform", "string"),
    ("comment", "string"),
];

/// Parse the enum workbook into the registry.
pub fn parse_enum_workbook(stem: &str, workbook: &Workbook, enums: &EnumRegistry) -> Result<()> {
    let count = workbook.sheet_count();
    for sheet in workbook.sheets() {
        let table = message_name(stem, sheet.name(), count);
        let header = parse_header(sheet, &table, Orientation::Columns, enums)?;
        check_fixed_fields(&header, &ENUM_FIXED_FIELDS, &table)?;

        for (row, cells) in sheet.used_rows() {
            if is_header_line(sheet, Orientation::Columns, row) {
                continue;
            }

            let mut name = String::new();
            let mut members: Vec<String> = Vec::new();
            let mut values: Vec<i32> = Vec::new();
            // an empty platform cell leaves the enum visible everywhere
            let mut platform = PlatformMask::ALL;
            let mut comment = String::new();

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
                    "name" => name = text.to_string(),
                    "field" => {
                        members = text
                            .split(ENUM_MEMBER_SEPARATOR)
                            .map(str::to_string)
                            .collect();
                    }
                    "value" => {
                        for part in text.split(ENUM_MEMBER_SEPARATOR) {
                            let value =
                                part.parse::<i32>()
                                    .map_err(|_| CompileError::UnparseableValue {
                                        table: table.clone(),
                                        field: "value".to_string(),
                                        ty: "int",
                                        text: part.to_string(),
                                    })?;
                            values.push(value);
                        }
                    }
                    "platform" => platform = PlatformMask::parse(text),
                    "comment" => comment = text.to_string(),
                    _ => {}
                }
            }

            if name.is_empty() {
                continue;
            }
            if members.len() != values.len() {
                return Err(CompileError::EnumValueCount {
                    table: table.clone(),
                    name,
                    members: members.len(),
                    values: values.len(),
                });
            }

            let info = EnumInfo {
                name,
                members: members
                    .into_iter()
                    .zip(values)
                    .map(|(name, value)| EnumMember { name, value })
                    .collect(),
                platform,
                comment,
            };
            enums.insert(info)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tablec_xlsx::XlsxWriter;

    fn enum_writer() -> (XlsxWriter, usize) {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        let names = ["name", "field", "value", "platform", "comment"];
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 3, 1, "#platform");
        for (i, name) in names.iter().enumerate() {
            let col = (i + 2) as u32;
            writer.set_cell(s, 1, col, name);
            writer.set_cell(s, 2, col, "string");
            writer.set_cell(s, 3, col, "cs");
        }
        (writer, s)
    }

    fn parse(writer: XlsxWriter) -> Result<EnumRegistry> {
        let workbook = Workbook::read(Cursor::new(writer.to_bytes().unwrap())).unwrap();
        let enums = EnumRegistry::new();
        parse_enum_workbook("Enum", &workbook, &enums)?;
        Ok(enums)
    }

    #[test]
    fn parses_members_and_values() {
        let (mut writer, s) = enum_writer();
        writer.set_cell(s, 4, 2, "Color");
        writer.set_cell(s, 4, 3, "Red|Green|Blue");
        writer.set_cell(s, 4, 4, "0|1|4");
        writer.set_cell(s, 4, 5, "c");
        writer.set_cell(s, 4, 6, "palette");

        let enums = parse(writer).unwrap();
        assert!(enums.contains("Color"));
        assert_eq!(enums.member_value("Color", "Blue"), Some(4));
    }

    #[test]
    fn member_value_count_mismatch_is_fatal() {
        let (mut writer, s) = enum_writer();
        writer.set_cell(s, 4, 2, "Color");
        writer.set_cell(s, 4, 3, "Red|Green");
        writer.set_cell(s, 4, 4, "0");
        writer.set_cell(s, 4, 5, "cs");

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::EnumValueCount { name, .. } if name == "Color"));
    }

    #[test]
    fn unparseable_value_is_fatal() {
        let (mut writer, s) = enum_writer();
        writer.set_cell(s, 4, 2, "Color");
        writer.set_cell(s, 4, 3, "Red");
        writer.set_cell(s, 4, 4, "one");
        writer.set_cell(s, 4, 5, "cs");

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::UnparseableValue { text, .. } if text == "one"));
    }

    #[test]
    fn duplicate_enum_name_is_fatal() {
        let (mut writer, s) = enum_writer();
        for row in [4, 5] {
            writer.set_cell(s, row, 2, "Color");
            writer.set_cell(s, row, 3, "Red");
            writer.set_cell(s, row, 4, "0");
            writer.set_cell(s, row, 5, "cs");
        }

        let err = parse(writer).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Core(tablec_core::Error::DuplicateEnum(name)) if name == "Color"
        ));
    }

    #[test]
    fn missing_fixed_field_is_fatal() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "name");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "string");

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::MissingFixedFields { .. }));
    }

    #[test]
    fn wrong_fixed_field_type_is_fatal() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        let names = ["name", "field", "value", "platform", "comment"];
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 2, 1, "#type");
        for (i, name) in names.iter().enumerate() {
            let col = (i + 2) as u32;
            writer.set_cell(s, 1, col, name);
            writer.set_cell(s, 2, col, if *name == "value" { "int" } else { "string" });
        }

        let err = parse(writer).unwrap_err();
        assert!(matches!(err, CompileError::FixedFieldType { field, .. } if field == "value"));
    }
}
