//! Header parsing
//!
//! A table's header is the set of lines whose first cell starts with `#`.
//! The text after the marker names the role the line assigns to each
//! field: `name`, `type`, `platform` or `comment`. The first header line
//! fixes the field layout from its merged-cell spans; every later header
//! line must align with it exactly.
//!
//! Common tables run fields across columns; singleton tables are
//! transposed and run them down rows. [`Orientation`] selects the axis,
//! the parsing is otherwise identical.

use std::collections::HashSet;

use tracing::warn;

use tablec_core::header::{FieldInfo, HeaderInfo, Span};
use tablec_core::typesys::{strip_key_marker, FieldType, KeyKind};
use tablec_core::{EnumRegistry, PlatformMask, HEADER_MARKER};
use tablec_xlsx::{cell_name, Sheet};

use crate::error::{CompileError, Result};

/// Which axis the header lines run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Header lines are rows, fields are columns (common tables)
    Columns,
    /// Header lines are columns, fields are rows (singleton tables)
    Rows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderRole {
    Name,
    Type,
    Platform,
    Comment,
}

impl HeaderRole {
    fn parse(s: &str) -> Option<HeaderRole> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Some(HeaderRole::Name),
            "type" => Some(HeaderRole::Type),
            "platform" => Some(HeaderRole::Platform),
            "comment" => Some(HeaderRole::Comment),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct PendingField {
    name: String,
    type_token: String,
    ty: Option<FieldType>,
    key: KeyKind,
    platform: PlatformMask,
    comment: String,
    span: Span,
}

impl PendingField {
    fn new(span: Span) -> PendingField {
        PendingField {
            name: String::new(),
            type_token: String::new(),
            ty: None,
            key: KeyKind::None,
            // a platform line is optional; without one a field is
            // exported everywhere
            platform: PlatformMask::ALL,
            comment: String::new(),
            span,
        }
    }
}

/// One header line: its index on the header axis and its role text
fn header_lines(sheet: &Sheet, orientation: Orientation) -> Vec<(u32, String)> {
    match orientation {
        Orientation::Columns => sheet
            .used_rows()
            .filter_map(|(row, _)| {
                let first = sheet.cell_text(row, 1)?;
                first
                    .strip_prefix(HEADER_MARKER)
                    .map(|role| (row, role.to_string()))
            })
            .collect(),
        Orientation::Rows => sheet
            .used_columns()
            .into_iter()
            .filter_map(|col| {
                let first = sheet.cell_text(1, col)?;
                first
                    .strip_prefix(HEADER_MARKER)
                    .map(|role| (col, role.to_string()))
            })
            .collect(),
    }
}

/// The cells of one header line as `(position, text, span, address)`,
/// skipping the marker cell and trailing merged cells.
fn line_cells(sheet: &Sheet, orientation: Orientation, line: u32) -> Vec<(u32, String, Span, String)> {
    match orientation {
        Orientation::Columns => sheet
            .used_rows()
            .find(|(row, _)| *row == line)
            .map(|(row, cells)| {
                cells
                    .iter()
                    .filter(|(col, _)| **col != 1 && !sheet.is_rear_merged(row, **col))
                    .map(|(col, text)| {
                        let (start, end) = sheet.col_span(row, *col);
                        (*col, text.trim().to_string(), Span::new(start, end), cell_name(row, *col))
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Orientation::Rows => sheet
            .column_cells(line)
            .into_iter()
            .filter(|(row, _)| *row != 1 && !sheet.is_rear_merged(*row, line))
            .map(|(row, text)| {
                let (start, end) = sheet.row_span(row, line);
                (row, text.trim().to_string(), Span::new(start, end), cell_name(row, line))
            })
            .collect(),
    }
}

/// Parse one sheet's header into a [`HeaderInfo`].
///
/// Fields with an empty name or type are dropped from the result (with a
/// warning); the survivors are sorted by span start.
pub fn parse_header(
    sheet: &Sheet,
    table: &str,
    orientation: Orientation,
    enums: &EnumRegistry,
) -> Result<HeaderInfo> {
    let lines = header_lines(sheet, orientation);
    if lines.is_empty() {
        return Err(CompileError::MissingHeader(table.to_string()));
    }

    let mut pending: Vec<PendingField> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut first_line = true;

    for (line, role_text) in lines {
        let role = HeaderRole::parse(&role_text).ok_or_else(|| CompileError::UnknownHeaderRole {
            table: table.to_string(),
            role: role_text.clone(),
        })?;

        for (pos, text, span, address) in line_cells(sheet, orientation, line) {
            let field_idx = if first_line {
                pending.push(PendingField::new(span));
                pending.len() - 1
            } else {
                // The grid is sparse: a line stores no cell for an empty
                // name, platform or comment, so cells are matched to
                // fields by position, not by order within the line.
                let Some(idx) = pending.iter().position(|f| f.span.contains(pos)) else {
                    warn!(table, cell = %address, "header cell outside the field layout, ignored");
                    continue;
                };
                let expected = pending[idx].span;
                if expected != span {
                    return Err(CompileError::HeaderMisaligned {
                        table: table.to_string(),
                        cell: address,
                        expected_start: expected.start,
                        expected_end: expected.end,
                        found_start: span.start,
                        found_end: span.end,
                    });
                }
                idx
            };
            let field = &mut pending[field_idx];

            match role {
                HeaderRole::Name => {
                    if text.is_empty() {
                        warn!(table, cell = %address, "field name is empty, column will not be exported");
                        continue;
                    }
                    if !names.insert(text.clone()) {
                        return Err(CompileError::DuplicateField {
                            table: table.to_string(),
                            name: text,
                        });
                    }
                    field.name = text;
                }
                HeaderRole::Type => {
                    if text.is_empty() {
                        warn!(table, cell = %address, "field type is empty, column will not be exported");
                        continue;
                    }
                    let (key, bare) = strip_key_marker(&text);
                    let ty = FieldType::classify(bare, enums).ok_or_else(|| {
                        CompileError::InvalidType {
                            table: table.to_string(),
                            token: bare.to_string(),
                        }
                    })?;
                    field.key = key;
                    field.type_token = bare.to_string();
                    field.ty = Some(ty);
                }
                HeaderRole::Platform => {
                    let mask = PlatformMask::parse(&text);
                    if mask.is_empty() {
                        warn!(table, cell = %address, code = %text, "unknown platform code, field will not be exported");
                    }
                    field.platform = mask;
                }
                HeaderRole::Comment => {
                    field.comment = text;
                }
            }
        }

        first_line = false;
    }

    // Drop unnamed and untyped fields, then fix the field order.
    let mut kept: Vec<PendingField> = pending
        .into_iter()
        .filter(|f| !f.name.is_empty() && f.ty.is_some())
        .collect();
    kept.sort_by_key(|f| f.span.start);

    let mut fields = Vec::with_capacity(kept.len());
    let mut independent_keys = Vec::new();
    let mut union_keys = Vec::new();
    for (idx, f) in kept.into_iter().enumerate() {
        match f.key {
            KeyKind::Independent => independent_keys.push(idx),
            KeyKind::Union => union_keys.push(idx),
            KeyKind::None => {}
        }
        fields.push(FieldInfo {
            name: f.name,
            ty: f.ty.expect("filtered above"),
            raw_type: f.type_token,
            platform: f.platform,
            comment: f.comment,
            span: f.span,
        });
    }

    Ok(HeaderInfo {
        message_name: table.to_string(),
        fields,
        independent_keys,
        union_keys,
    })
}

/// Whether a line of the data area belongs to the header.
///
/// Data walks use this to skip header rows (or columns, transposed).
pub fn is_header_line(sheet: &Sheet, orientation: Orientation, line: u32) -> bool {
    let first = match orientation {
        Orientation::Columns => sheet.cell_text(line, 1),
        Orientation::Rows => sheet.cell_text(1, line),
    };
    first.is_some_and(|text| text.starts_with(HEADER_MARKER))
}
