//! The error-code registry
//!
//! One sheet of the error-code table yields one [`ErrorCodeSheet`]. The
//! sheet named [`FRAME_SHEET_NAME`] routes to the "frame" output file; all
//! other sheets are combined into the "business" output.

use dashmap::DashMap;

/// Sheet name that selects the frame (engine-level) output destination
pub const FRAME_SHEET_NAME: &str = "Common";

/// One `(codeString, integerCode, comment)` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCodeEntry {
    /// Unique per sheet; duplicate numeric codes are not checked
    pub code_str: String,
    pub code: i64,
    pub comment: String,
}

/// All error-code rows of one sheet, in row order
#[derive(Debug, Clone)]
pub struct ErrorCodeSheet {
    pub sheet_name: String,
    pub entries: Vec<ErrorCodeEntry>,
}

impl ErrorCodeSheet {
    pub fn is_frame(&self) -> bool {
        self.sheet_name == FRAME_SHEET_NAME
    }
}

/// Error-code sheets keyed by sheet name, populated during the parallel
/// head-parse phase.
#[derive(Debug, Default)]
pub struct ErrorCodeRegistry {
    map: DashMap<String, ErrorCodeSheet>,
}

impl ErrorCodeRegistry {
    pub fn new() -> ErrorCodeRegistry {
        ErrorCodeRegistry::default()
    }

    /// Insert-if-absent; returns false when the sheet name already exists.
    pub fn insert(&self, sheet: ErrorCodeSheet) -> bool {
        match self.map.entry(sheet.sheet_name.clone()) {
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(sheet);
                true
            }
            dashmap::mapref::entry::Entry::Occupied(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sheets sorted by name for deterministic script output
    pub fn sorted_sheets(&self) -> Vec<ErrorCodeSheet> {
        let mut sheets: Vec<ErrorCodeSheet> =
            self.map.iter().map(|entry| entry.value().clone()).collect();
        sheets.sort_by(|a, b| a.sheet_name.cmp(&b.sheet_name));
        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_routing() {
        let common = ErrorCodeSheet {
            sheet_name: "Common".to_string(),
            entries: Vec::new(),
        };
        let battle = ErrorCodeSheet {
            sheet_name: "Battle".to_string(),
            entries: Vec::new(),
        };
        assert!(common.is_frame());
        assert!(!battle.is_frame());
    }

    #[test]
    fn insert_if_absent() {
        let registry = ErrorCodeRegistry::new();
        assert!(registry.insert(ErrorCodeSheet {
            sheet_name: "Common".to_string(),
            entries: Vec::new(),
        }));
        assert!(!registry.insert(ErrorCodeSheet {
            sheet_name: "Common".to_string(),
            entries: Vec::new(),
        }));
    }
}
