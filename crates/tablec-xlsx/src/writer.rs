//! Minimal XLSX writer
//!
//! Produces a small but valid XLSX archive with inline-string cells and
//! merged ranges. Mainly used to build fixtures for tests and tooling;
//! it writes only the parts the reader consumes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::addr::cell_name;
use crate::error::XlsxResult;
use crate::reader::MergedRange;

struct SheetData {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, String>>,
    merged: Vec<MergedRange>,
}

/// Builds an XLSX workbook in memory
pub struct XlsxWriter {
    sheets: Vec<SheetData>,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    pub fn new() -> XlsxWriter {
        XlsxWriter { sheets: Vec::new() }
    }

    /// Add a sheet and return its index for later cell writes
    pub fn add_sheet(&mut self, name: &str) -> usize {
        self.sheets.push(SheetData {
            name: name.to_string(),
            rows: BTreeMap::new(),
            merged: Vec::new(),
        });
        self.sheets.len() - 1
    }

    /// Set cell text; row and column are 1-based
    pub fn set_cell(&mut self, sheet: usize, row: u32, col: u32, text: &str) {
        self.sheets[sheet]
            .rows
            .entry(row)
            .or_default()
            .insert(col, text.to_string());
    }

    /// Merge a 1-based inclusive cell range
    pub fn merge(&mut self, sheet: usize, first_row: u32, first_col: u32, last_row: u32, last_col: u32) {
        self.sheets[sheet].merged.push(MergedRange {
            first_row,
            first_col,
            last_row,
            last_col,
        });
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels_xml().as_bytes())?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(worksheet_xml(sheet).as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
        );
        for i in 0..self.sheets.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n",
                i + 1
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
"#,
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>\n",
                escape_xml(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets>\n</workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
        );
        for i in 0..self.sheets.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>\n",
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

fn worksheet_xml(sheet: &SheetData) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
"#,
    );
    for (row, cells) in &sheet.rows {
        xml.push_str(&format!("<row r=\"{row}\">"));
        for (col, text) in cells {
            xml.push_str(&format!(
                "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                cell_name(*row, *col),
                escape_xml(text)
            ));
        }
        xml.push_str("</row>\n");
    }
    xml.push_str("</sheetData>\n");
    if !sheet.merged.is_empty() {
        xml.push_str(&format!("<mergeCells count=\"{}\">", sheet.merged.len()));
        for range in &sheet.merged {
            xml.push_str(&format!(
                "<mergeCell ref=\"{}:{}\"/>",
                cell_name(range.first_row, range.first_col),
                cell_name(range.last_row, range.last_col)
            ));
        }
        xml.push_str("</mergeCells>\n");
    }
    xml.push_str("</worksheet>");
    xml
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
