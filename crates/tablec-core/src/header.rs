//! The parsed header model of one table

use crate::platform::{Platform, PlatformMask};
use crate::typesys::FieldType;

/// The spreadsheet positions a field occupies, 1-based and inclusive.
///
/// For common tables this is a column range; for single tables a row
/// range. Merged header cells give `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Span {
        Span { start, end }
    }

    pub fn contains(&self, idx: u32) -> bool {
        self.start <= idx && idx <= self.end
    }
}

/// One logical column (or row) of a table
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Unique within the table
    pub name: String,
    pub ty: FieldType,
    /// The raw type token as written in the sheet, key markers stripped
    pub raw_type: String,
    pub platform: PlatformMask,
    pub comment: String,
    pub span: Span,
}

impl FieldInfo {
    pub fn is_localized_text(&self) -> bool {
        self.ty.is_localized_text()
    }

    pub fn is_localized_image(&self) -> bool {
        self.ty.is_localized_image()
    }
}

/// The complete header of one table: fields plus key sets.
///
/// Fields are sorted by span start; `independent_keys` and `union_keys`
/// index into `fields`.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    /// Derived from file name, `_SheetName` appended for multi-sheet books
    pub message_name: String,
    pub fields: Vec<FieldInfo>,
    /// Fields whose values must each be unique alone
    pub independent_keys: Vec<usize>,
    /// Fields whose combined tuple must be unique per row
    pub union_keys: Vec<usize>,
}

impl HeaderInfo {
    /// Find the field owning a 1-based position, by inclusive span.
    ///
    /// Relies on fields being sorted by span start with non-overlapping
    /// spans.
    pub fn field_at(&self, idx: u32) -> Option<usize> {
        for (i, field) in self.fields.iter().enumerate() {
            if idx < field.span.start {
                return None;
            }
            if idx <= field.span.end {
                return Some(i);
            }
        }
        None
    }

    /// The fields emitted for a platform, paired with their 1-based proto
    /// field numbers.
    ///
    /// Excluded fields do not consume a number, so the schema emitter and
    /// the data encoder must both come through here to agree on numbering.
    pub fn numbered_fields(&self, platform: Platform) -> Vec<(u32, &FieldInfo)> {
        self.fields
            .iter()
            .filter(|f| f.platform.contains(platform))
            .zip(1u32..)
            .map(|(f, n)| (n, f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::ScalarKind;

    fn field(name: &str, platform: PlatformMask, start: u32, end: u32) -> FieldInfo {
        FieldInfo {
            name: name.to_string(),
            ty: FieldType::Scalar(ScalarKind::Int),
            raw_type: "int".to_string(),
            platform,
            comment: String::new(),
            span: Span::new(start, end),
        }
    }

    fn header(fields: Vec<FieldInfo>) -> HeaderInfo {
        HeaderInfo {
            message_name: "Test".to_string(),
            fields,
            independent_keys: Vec::new(),
            union_keys: Vec::new(),
        }
    }

    #[test]
    fn field_at_is_inclusive_of_span_end() {
        let h = header(vec![
            field("a", PlatformMask::ALL, 2, 4),
            field("b", PlatformMask::ALL, 5, 5),
        ]);
        assert_eq!(h.field_at(1), None);
        assert_eq!(h.field_at(2), Some(0));
        assert_eq!(h.field_at(4), Some(0));
        assert_eq!(h.field_at(5), Some(1));
        assert_eq!(h.field_at(6), None);
    }

    #[test]
    fn numbering_skips_excluded_fields() {
        let h = header(vec![
            field("hp", PlatformMask::ALL, 2, 2),
            field("mana", PlatformMask::CLIENT, 3, 3),
            field("secret", PlatformMask::SERVER, 4, 4),
        ]);

        let client: Vec<(u32, &str)> = h
            .numbered_fields(Platform::Client)
            .into_iter()
            .map(|(n, f)| (n, f.name.as_str()))
            .collect();
        assert_eq!(client, vec![(1, "hp"), (2, "mana")]);

        let server: Vec<(u32, &str)> = h
            .numbered_fields(Platform::Server)
            .into_iter()
            .map(|(n, f)| (n, f.name.as_str()))
            .collect();
        assert_eq!(server, vec![(1, "hp"), (2, "secret")]);
    }
}
