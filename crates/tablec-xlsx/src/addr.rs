//! A1-style cell references
//!
//! Row and column indices are 1-based throughout tablec, matching how
//! spreadsheet users (and the header spans in error messages) see them.

use crate::error::{XlsxError, XlsxResult};

/// Parse an A1-style reference (e.g. `B3`) into `(row, col)`, 1-based.
pub fn parse_cell_ref(s: &str) -> XlsxResult<(u32, u32)> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| XlsxError::Parse(format!("no row number in cell ref '{s}'")))?;
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() {
        return Err(XlsxError::Parse(format!(
            "no column letters in cell ref '{s}'"
        )));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(XlsxError::Parse(format!("invalid cell ref '{s}'")));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| XlsxError::Parse(format!("invalid row number in cell ref '{s}'")))?;
    if row == 0 {
        return Err(XlsxError::Parse(format!("row must be >= 1 in '{s}'")));
    }

    Ok((row, col))
}

/// Convert a 1-based column index to letters (1 -> A, 27 -> AA).
pub fn column_to_letters(col: u32) -> String {
    debug_assert!(col >= 1);
    let mut col = col;
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Render a 1-based `(row, col)` position as an A1-style name, for error
/// messages and log lines.
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_refs() {
        assert_eq!(parse_cell_ref("A1").unwrap(), (1, 1));
        assert_eq!(parse_cell_ref("B3").unwrap(), (3, 2));
        assert_eq!(parse_cell_ref("Z10").unwrap(), (10, 26));
        assert_eq!(parse_cell_ref("AA2").unwrap(), (2, 27));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_cell_ref("").is_err());
        assert!(parse_cell_ref("123").is_err());
        assert!(parse_cell_ref("ABC").is_err());
        assert!(parse_cell_ref("A0").is_err());
    }

    #[test]
    fn letters_round_trip() {
        for col in [1u32, 2, 25, 26, 27, 52, 53, 702, 703] {
            let name = format!("{}1", column_to_letters(col));
            assert_eq!(parse_cell_ref(&name).unwrap(), (1, col), "col {col}");
        }
    }

    #[test]
    fn cell_names() {
        assert_eq!(cell_name(3, 2), "B3");
        assert_eq!(cell_name(1, 27), "AA1");
    }
}
