//! XLSX reader
//!
//! Reads the parts of an XLSX archive that matter to table compilation:
//! shared strings, sheet names (`xl/workbook.xml` + its rels), and for each
//! worksheet the cell text and merged ranges. All cell values are
//! normalized to text — numbers keep their raw stored form, booleans
//! become `true`/`false`, formula cells contribute their cached value.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::addr::parse_cell_ref;
use crate::error::{XlsxError, XlsxResult};

/// A merged cell region, 1-based inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergedRange {
    /// Parse a range reference like `B1:D1`.
    pub fn parse(s: &str) -> XlsxResult<MergedRange> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| XlsxError::Parse(format!("invalid range ref '{s}'")))?;
        let (first_row, first_col) = parse_cell_ref(start)?;
        let (last_row, last_col) = parse_cell_ref(end)?;
        Ok(MergedRange {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.first_row <= row && row <= self.last_row && self.first_col <= col && col <= self.last_col
    }
}

/// One worksheet: a sparse text grid plus merged ranges
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    /// row -> (col -> text), only non-empty cells are stored
    rows: BTreeMap<u32, BTreeMap<u32, String>>,
    merged: Vec<MergedRange>,
}

impl Sheet {
    fn new(name: String) -> Sheet {
        Sheet {
            name,
            rows: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows that contain at least one non-empty cell, in sheet order
    pub fn used_rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u32, String>)> {
        self.rows.iter().map(|(row, cells)| (*row, cells))
    }

    pub fn cell_text(&self, row: u32, col: u32) -> Option<&str> {
        self.rows.get(&row)?.get(&col).map(String::as_str)
    }

    /// Distinct columns that contain at least one non-empty cell, sorted
    pub fn used_columns(&self) -> Vec<u32> {
        let mut cols: Vec<u32> = self
            .rows
            .values()
            .flat_map(|cells| cells.keys().copied())
            .collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    /// Non-empty cells of one column, as `(row, text)` in row order
    pub fn column_cells(&self, col: u32) -> Vec<(u32, &str)> {
        self.rows
            .iter()
            .filter_map(|(row, cells)| cells.get(&col).map(|text| (*row, text.as_str())))
            .collect()
    }

    fn merged_range_at(&self, row: u32, col: u32) -> Option<&MergedRange> {
        self.merged.iter().find(|range| range.contains(row, col))
    }

    /// Whether the position is inside a merged range but not its first cell.
    /// Such trailing cells are skipped during header and data walks.
    pub fn is_rear_merged(&self, row: u32, col: u32) -> bool {
        match self.merged_range_at(row, col) {
            Some(range) => !(range.first_row == row && range.first_col == col),
            None => false,
        }
    }

    /// The column range a header cell occupies, widened by its merged range
    pub fn col_span(&self, row: u32, col: u32) -> (u32, u32) {
        match self.merged_range_at(row, col) {
            Some(range) => (range.first_col, range.last_col),
            None => (col, col),
        }
    }

    /// The row range a (transposed) header cell occupies
    pub fn row_span(&self, row: u32, col: u32) -> (u32, u32) {
        match self.merged_range_at(row, col) {
            Some(range) => (range.first_row, range.last_row),
            None => (row, row),
        }
    }

    fn set_cell(&mut self, row: u32, col: u32, text: String) {
        if !text.is_empty() {
            self.rows.entry(row).or_default().insert(col, text);
        }
    }
}

/// An XLSX workbook reduced to named text-grid sheets
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Read a workbook from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Workbook::read(file)
    }

    /// Read a workbook from any seekable reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = read_shared_strings(&mut archive)?;
        let sheet_info = read_workbook_xml(&mut archive)?;
        let sheet_paths = read_workbook_rels(&mut archive)?;

        let mut sheets = Vec::with_capacity(sheet_info.len());
        for (name, r_id) in sheet_info {
            let path = sheet_paths
                .get(&r_id)
                .ok_or_else(|| XlsxError::MissingPart(format!("worksheet for sheet '{name}'")))?;
            let mut sheet = Sheet::new(name);
            read_worksheet(&mut archive, path, &mut sheet, &shared_strings)?;
            debug!(
                sheet = sheet.name.as_str(),
                rows = sheet.rows.len(),
                merged = sheet.merged.len(),
                "read worksheet"
            );
            sheets.push(sheet);
        }

        Ok(Workbook { sheets })
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }
}

/// Read the shared strings table
fn read_shared_strings<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<String>> {
    let mut strings = Vec::new();

    let file = match archive.by_name("xl/sharedStrings.xml") {
        Ok(f) => f,
        Err(_) => return Ok(strings), // no shared strings is valid
    };

    let reader = BufReader::new(file);
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => {
                    strings.push(decode_escapes(&current));
                    current.clear();
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Decode `_xHHHH_` escape sequences in shared-string text.
///
/// Excel stores characters that are not valid in XML this way, e.g.
/// `_x000A_` for a line feed. Anything that does not form a complete
/// escape is passed through unchanged.
fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("_x") {
        let (before, candidate) = rest.split_at(start);
        out.push_str(before);

        let escaped = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match escaped {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Read workbook.xml to get sheet names and rIds
fn read_workbook_xml<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> XlsxResult<Vec<(String, String)>> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

    let reader = BufReader::new(file);
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"r:id" => r_id = attr.unescape_value().ok().map(|s| s.to_string()),
                        _ => {}
                    }
                }

                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read workbook.xml.rels to get sheet file paths
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> XlsxResult<HashMap<String, String>> {
    let file = archive
        .by_name("xl/_rels/workbook.xml.rels")
        .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

    let reader = BufReader::new(file);
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Target" => target = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Type" => rel_type = attr.unescape_value().ok().map(|s| s.to_string()),
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        // Target is relative to the xl/ folder
                        let full_path = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("xl/{target}")
                        };
                        rels.insert(id, full_path);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Read one worksheet part into a [`Sheet`]
fn read_worksheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
    sheet: &mut Sheet,
    shared_strings: &[String],
) -> XlsxResult<()> {
    let file = archive
        .by_name(path)
        .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

    let reader = BufReader::new(file);
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut current_ref: Option<String> = None;
    let mut current_type: Option<String> = None;
    let mut current_value: Option<String> = None;
    let mut in_cell = false;
    let mut in_value = false;
    let mut in_inline_str = false;
    let mut in_inline_text = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"c" => {
                    in_cell = true;
                    current_ref = None;
                    current_type = None;
                    current_value = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                current_ref = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            b"t" => {
                                current_type = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }
                }
                b"v" if in_cell => in_value = true,
                b"is" if in_cell => in_inline_str = true,
                b"t" if in_inline_str => in_inline_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"c" => {
                    if let Some(ref cell_ref) = current_ref {
                        store_cell(
                            sheet,
                            cell_ref,
                            current_type.as_deref(),
                            current_value.as_deref(),
                            shared_strings,
                        )?;
                    }
                    in_cell = false;
                }
                b"v" => in_value = false,
                b"is" => in_inline_str = false,
                b"t" if in_inline_str => in_inline_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_value {
                    if let Ok(text) = e.unescape() {
                        current_value = Some(text.to_string());
                    }
                } else if in_inline_text {
                    if let Ok(text) = e.unescape() {
                        current_value = Some(text.to_string());
                        current_type = Some("inlineStr".to_string());
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"mergeCell" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            let ref_str = String::from_utf8_lossy(&attr.value);
                            sheet.merged.push(MergedRange::parse(&ref_str)?);
                        }
                    }
                }
                // Self-closing <c .../> carries no value
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Normalize a cell's stored value to text and add it to the sheet
fn store_cell(
    sheet: &mut Sheet,
    cell_ref: &str,
    cell_type: Option<&str>,
    value: Option<&str>,
    shared_strings: &[String],
) -> XlsxResult<()> {
    let Some(value) = value else {
        return Ok(());
    };

    let (row, col) = parse_cell_ref(cell_ref)?;

    let text = match cell_type {
        // Shared string
        Some("s") => {
            let idx: usize = value
                .parse()
                .map_err(|_| XlsxError::Parse(format!("Invalid shared string index: {value}")))?;
            shared_strings
                .get(idx)
                .ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {idx} out of bounds"))
                })?
                .clone()
        }

        // Boolean
        Some("b") => if value == "1" || value.eq_ignore_ascii_case("true") {
            "true"
        } else {
            "false"
        }
        .to_string(),

        // Inline or explicit strings; unknown types fall back to raw text.
        // Numbers (None / "n") keep their stored form.
        _ => value.to_string(),
    };

    sheet.set_cell(row, col, text);
    Ok(())
}
