//! Data compilation
//!
//! The second pass over a table's sheet: every non-header row becomes one
//! record, records append in row order to the table's list wrapper, and
//! the wrapper serializes to `<MessageName>.pbdata`. Field numbers are
//! assigned 1-based over the platform's included fields, matching the
//! emitted schema exactly.
//!
//! Key checks run here as well: an independent key field must hold a
//! unique raw cell text across all rows, and the union key fields
//! together must form a unique tuple per row.

use std::collections::HashSet;

use tablec_core::header::HeaderInfo;
use tablec_core::typesys::FieldType;
use tablec_core::{EnumRegistry, Platform, Value};
use tablec_xlsx::{cell_name, Sheet};

use crate::error::{CompileError, Result};
use crate::kinds::common::CommonTable;
use crate::kinds::error_code::ErrorCodeTables;
use crate::parser::{is_header_line, Orientation};
use crate::wire;

/// Proto field numbers per header field, `None` for excluded fields
fn field_numbers(header: &HeaderInfo, platform: Platform) -> Vec<Option<u32>> {
    let mut numbers = vec![None; header.fields.len()];
    let mut next = 1u32;
    for (idx, field) in header.fields.iter().enumerate() {
        if field.platform.contains(platform) {
            numbers[idx] = Some(next);
            next += 1;
        }
    }
    numbers
}

/// Encode one data row as a message body.
fn encode_row(
    table: &str,
    sheet: &Sheet,
    row: u32,
    cells: &std::collections::BTreeMap<u32, String>,
    header: &HeaderInfo,
    numbers: &[Option<u32>],
    platform: Platform,
    enums: &EnumRegistry,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    for (&col, text) in cells {
        if col == 1 || sheet.is_rear_merged(row, col) {
            continue;
        }
        let field_idx = header
            .field_at(col)
            .ok_or_else(|| CompileError::UnmappedCell {
                table: table.to_string(),
                cell: cell_name(row, col),
            })?;
        let field = &header.fields[field_idx];
        let Some(number) = numbers[field_idx] else {
            continue; // not emitted for this platform
        };
        let text = text.trim();

        match &field.ty {
            FieldType::Scalar(kind) => {
                let value = Value::parse_scalar(*kind, text)
                    .map_err(|e| CompileError::in_field(table, &field.name, e))?;
                wire::put_field(&mut buf, number, &value);
            }
            FieldType::LocalizedText | FieldType::LocalizedImage => {
                wire::put_field(&mut buf, number, &Value::Str(text.to_string()));
            }
            FieldType::Enum(name) => {
                let value = enums.member_value(name, text).ok_or_else(|| {
                    CompileError::UnknownEnumMember {
                        table: table.to_string(),
                        field: field.name.clone(),
                        enum_name: name.clone(),
                        member: text.to_string(),
                    }
                })?;
                wire::put_field(&mut buf, number, &Value::Enum(value));
            }
            FieldType::Array(element) => {
                let value = Value::parse_element(element, text, enums)
                    .map_err(|e| CompileError::in_field(table, &field.name, e))?;
                wire::put_element(&mut buf, number, &value);
            }
            FieldType::Map(key_ty, value_ty) => {
                // cells pair up inside the span: key, value, key, value...
                let relative = col - field.span.start;
                if relative % 2 == 1 {
                    continue; // value cell, consumed with its key
                }
                let value_col = col + 1;
                let value_text = sheet
                    .cell_text(row, value_col)
                    .filter(|_| header.field_at(value_col) == Some(field_idx))
                    .ok_or_else(|| CompileError::MapValueMissing {
                        table: table.to_string(),
                        cell: cell_name(row, value_col),
                    })?;

                let key = Value::parse_element(key_ty, text, enums)
                    .map_err(|e| CompileError::in_field(table, &field.name, e))?;
                let value = Value::parse_element(value_ty, value_text.trim(), enums)
                    .map_err(|e| CompileError::in_field(table, &field.name, e))?;
                wire::put_map_entry(&mut buf, number, &key, &value);
            }
        }
    }

    Ok(buf)
}

/// Compile one common table to its serialized list wrapper.
pub fn compile_common(
    table: &CommonTable,
    platform: Platform,
    enums: &EnumRegistry,
) -> Result<Vec<u8>> {
    let header = &table.header;
    let numbers = field_numbers(header, platform);

    // raw-text uniqueness sets, one per independent key field
    let mut independent_seen: Vec<HashSet<String>> = header
        .independent_keys
        .iter()
        .map(|_| HashSet::new())
        .collect();
    let mut union_seen: HashSet<Vec<String>> = HashSet::new();

    let mut out = Vec::new();
    for (row, cells) in table.sheet.used_rows() {
        if is_header_line(&table.sheet, Orientation::Columns, row) {
            continue;
        }

        for (set, &field_idx) in independent_seen.iter_mut().zip(&header.independent_keys) {
            let field = &header.fields[field_idx];
            if !field.platform.contains(platform) {
                continue;
            }
            if let Some(text) = cells.get(&field.span.start) {
                let text = text.trim().to_string();
                if !set.insert(text.clone()) {
                    return Err(CompileError::DuplicateKey {
                        table: table.name.clone(),
                        field: field.name.clone(),
                        value: text,
                    });
                }
            }
        }

        let union_values: Vec<Option<String>> = header
            .union_keys
            .iter()
            .filter(|&&idx| header.fields[idx].platform.contains(platform))
            .map(|&idx| {
                cells
                    .get(&header.fields[idx].span.start)
                    .map(|t| t.trim().to_string())
            })
            .collect();
        if !union_values.is_empty() && union_values.iter().all(Option::is_some) {
            let tuple: Vec<String> = union_values.into_iter().flatten().collect();
            if !union_seen.insert(tuple.clone()) {
                return Err(CompileError::DuplicateUnionKey {
                    table: table.name.clone(),
                    values: tuple.join(","),
                });
            }
        }

        let record = encode_row(
            &table.name,
            &table.sheet,
            row,
            cells,
            header,
            &numbers,
            platform,
            enums,
        )?;
        wire::put_len_delimited(&mut out, 1, &record);
    }

    Ok(out)
}

/// Compile every error-code sheet into one combined list wrapper.
pub fn compile_error_code(
    tables: &ErrorCodeTables,
    platform: Platform,
    enums: &EnumRegistry,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for table in tables.sorted() {
        let numbers = field_numbers(&table.header, platform);
        for (row, cells) in table.sheet.used_rows() {
            if is_header_line(&table.sheet, Orientation::Columns, row) {
                continue;
            }
            let record = encode_row(
                &table.name,
                &table.sheet,
                row,
                cells,
                &table.header,
                &numbers,
                platform,
                enums,
            )?;
            wire::put_len_delimited(&mut out, 1, &record);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tablec_core::EnumRegistry;
    use tablec_xlsx::{Workbook, XlsxWriter};

    use crate::kinds::common::CommonTables;

    fn table_from(writer: XlsxWriter, stem: &str) -> CommonTable {
        let workbook = Workbook::read(Cursor::new(writer.to_bytes().unwrap())).unwrap();
        let tables = CommonTables::new();
        let enums = EnumRegistry::new();
        tables.parse_workbook(stem, &workbook, &enums).unwrap();
        tables.sorted().remove(0)
    }

    fn item_writer() -> (XlsxWriter, usize) {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "id");
        writer.set_cell(s, 1, 3, "title");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "*int");
        writer.set_cell(s, 2, 3, "string");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        writer.set_cell(s, 3, 3, "cs");
        (writer, s)
    }

    #[test]
    fn encodes_rows_in_order() {
        let (mut writer, s) = item_writer();
        writer.set_cell(s, 4, 2, "1");
        writer.set_cell(s, 4, 3, "Sword");
        writer.set_cell(s, 5, 2, "2");
        writer.set_cell(s, 5, 3, "Axe");

        let table = table_from(writer, "Item");
        let enums = EnumRegistry::new();
        let bytes = compile_common(&table, Platform::Client, &enums).unwrap();

        // two length-delimited records under field 1 of the wrapper
        let expected: &[u8] = b"\x0a\x09\x08\x01\x12\x05Sword\x0a\x07\x08\x02\x12\x03Axe";
        assert_eq!(bytes, expected);
    }

    #[test]
    fn duplicate_independent_key_is_fatal() {
        let (mut writer, s) = item_writer();
        writer.set_cell(s, 4, 2, "1");
        writer.set_cell(s, 5, 2, "1");

        let table = table_from(writer, "Item");
        let enums = EnumRegistry::new();
        let err = compile_common(&table, Platform::Client, &enums).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateKey { field, value, .. } if field == "id" && value == "1"
        ));
    }

    #[test]
    fn duplicate_union_key_tuple_is_fatal() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "group");
        writer.set_cell(s, 1, 3, "slot");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "**int");
        writer.set_cell(s, 2, 3, "**int");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        writer.set_cell(s, 3, 3, "cs");
        writer.set_cell(s, 4, 2, "1");
        writer.set_cell(s, 4, 3, "2");
        writer.set_cell(s, 5, 2, "1");
        writer.set_cell(s, 5, 3, "2");

        let table = table_from(writer, "Slots");
        let enums = EnumRegistry::new();
        let err = compile_common(&table, Platform::Server, &enums).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateUnionKey { .. }));
    }

    #[test]
    fn differing_union_tuples_pass() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "group");
        writer.set_cell(s, 1, 3, "slot");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "**int");
        writer.set_cell(s, 2, 3, "**int");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        writer.set_cell(s, 3, 3, "cs");
        writer.set_cell(s, 4, 2, "1");
        writer.set_cell(s, 4, 3, "2");
        writer.set_cell(s, 5, 2, "2");
        writer.set_cell(s, 5, 3, "1");

        let table = table_from(writer, "Slots");
        let enums = EnumRegistry::new();
        assert!(compile_common(&table, Platform::Server, &enums).is_ok());
    }

    #[test]
    fn platform_excluded_fields_are_skipped_and_numbering_matches() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "id");
        writer.set_cell(s, 1, 3, "icon");
        writer.set_cell(s, 1, 4, "hp");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "int");
        writer.set_cell(s, 2, 3, "string");
        writer.set_cell(s, 2, 4, "int");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        writer.set_cell(s, 3, 3, "c");
        writer.set_cell(s, 3, 4, "s");
        writer.set_cell(s, 4, 2, "9");
        writer.set_cell(s, 4, 3, "sword.png");
        writer.set_cell(s, 4, 4, "55");

        let table = table_from(writer, "Unit");
        let enums = EnumRegistry::new();

        // server sees id=1 and hp=2; the icon neither consumes a number
        // nor appears in the bytes
        let server = compile_common(&table, Platform::Server, &enums).unwrap();
        assert_eq!(server, b"\x0a\x04\x08\x09\x10\x37");

        let client = compile_common(&table, Platform::Client, &enums).unwrap();
        assert_eq!(client, b"\x0a\x0d\x08\x09\x12\x09sword.png");
    }

    #[test]
    fn arrays_unpacked_and_maps_paired() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 1, 2, "tags");
        writer.merge(s, 1, 3, 1, 4);
        writer.set_cell(s, 1, 3, "drops");
        writer.set_cell(s, 2, 1, "#type");
        writer.set_cell(s, 2, 2, "int[]");
        writer.merge(s, 2, 3, 2, 4);
        writer.set_cell(s, 2, 3, "map<int,int>");
        writer.set_cell(s, 3, 1, "#platform");
        writer.set_cell(s, 3, 2, "cs");
        writer.merge(s, 3, 3, 3, 4);
        writer.set_cell(s, 3, 3, "cs");
        writer.set_cell(s, 4, 2, "7");
        writer.set_cell(s, 4, 3, "3");
        writer.set_cell(s, 4, 4, "10");

        let table = table_from(writer, "Loot");
        let enums = EnumRegistry::new();
        let bytes = compile_common(&table, Platform::Client, &enums).unwrap();

        // record: 1: 7 (unpacked element), 2: entry {1:3, 2:10}
        assert_eq!(bytes, b"\x0a\x08\x08\x07\x12\x04\x08\x03\x10\x0a");
    }

    #[test]
    fn map_without_value_cell_is_fatal() {
        let mut writer = XlsxWriter::new();
        let s = writer.add_sheet("Sheet1");
        writer.merge(s, 1, 2, 1, 3);
        writer.set_cell(s, 1, 2, "drops");
        writer.set_cell(s, 1, 1, "#name");
        writer.set_cell(s, 2, 1, "#type");
        writer.merge(s, 2, 2, 2, 3);
        writer.set_cell(s, 2, 2, "map<int,int>");
        writer.set_cell(s, 3, 1, "#platform");
        writer.merge(s, 3, 2, 3, 3);
        writer.set_cell(s, 3, 2, "cs");
        writer.set_cell(s, 4, 2, "3");

        let table = table_from(writer, "Loot");
        let enums = EnumRegistry::new();
        let err = compile_common(&table, Platform::Client, &enums).unwrap_err();
        assert!(matches!(err, CompileError::MapValueMissing { .. }));
    }
}
