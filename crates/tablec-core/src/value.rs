//! Typed cell values

use crate::enums::EnumRegistry;
use crate::error::{Error, Result};
use crate::typesys::{ElementType, ScalarKind};

/// A spreadsheet cell converted to its schema type.
///
/// Enum cells are resolved to their declared integer value at conversion
/// time; the wire encoder treats them like int32.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Enum(i32),
}

impl Value {
    /// Parse cell text as the given scalar kind.
    ///
    /// Integer parsing is base-10 with an optional leading sign; boolean
    /// parsing accepts exactly `true` and `false`; double parsing accepts
    /// standard decimal and scientific notation.
    pub fn parse_scalar(kind: ScalarKind, text: &str) -> Result<Value> {
        match kind {
            ScalarKind::Int => text
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| unparseable("int", text)),
            ScalarKind::Long => text
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| unparseable("long", text)),
            ScalarKind::Double => text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| unparseable("double", text)),
            ScalarKind::Bool => text
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| unparseable("bool", text)),
            ScalarKind::String => Ok(Value::Str(text.to_string())),
        }
    }

    /// Parse cell text as an array element or map key/value.
    ///
    /// Enum members are written by name in cells and resolved through the
    /// registry.
    pub fn parse_element(element: &ElementType, text: &str, enums: &EnumRegistry) -> Result<Value> {
        match element {
            ElementType::Scalar(kind) => Value::parse_scalar(*kind, text),
            ElementType::Enum(name) => {
                let value =
                    enums
                        .member_value(name, text)
                        .ok_or_else(|| Error::UnknownEnumMember {
                            enum_name: name.clone(),
                            member: text.to_string(),
                        })?;
                Ok(Value::Enum(value))
            }
        }
    }
}

fn unparseable(ty: &'static str, text: &str) -> Error {
    Error::UnparseableValue {
        ty,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ints() {
        assert_eq!(
            Value::parse_scalar(ScalarKind::Int, "42").unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::parse_scalar(ScalarKind::Int, "-7").unwrap(),
            Value::Int(-7)
        );
        assert!(Value::parse_scalar(ScalarKind::Int, "1,000").is_err());
        assert!(Value::parse_scalar(ScalarKind::Int, "1.5").is_err());
        assert!(Value::parse_scalar(ScalarKind::Int, "").is_err());
    }

    #[test]
    fn parse_longs_and_doubles() {
        assert_eq!(
            Value::parse_scalar(ScalarKind::Long, "9999999999").unwrap(),
            Value::Long(9_999_999_999)
        );
        assert_eq!(
            Value::parse_scalar(ScalarKind::Double, "1.5e3").unwrap(),
            Value::Double(1500.0)
        );
        assert!(Value::parse_scalar(ScalarKind::Double, "abc").is_err());
    }

    #[test]
    fn parse_bools_canonical_only() {
        assert_eq!(
            Value::parse_scalar(ScalarKind::Bool, "true").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Value::parse_scalar(ScalarKind::Bool, "false").unwrap(),
            Value::Bool(false)
        );
        assert!(Value::parse_scalar(ScalarKind::Bool, "True").is_err());
        assert!(Value::parse_scalar(ScalarKind::Bool, "1").is_err());
    }

    #[test]
    fn parse_strings_pass_through() {
        assert_eq!(
            Value::parse_scalar(ScalarKind::String, "Sword").unwrap(),
            Value::Str("Sword".to_string())
        );
    }
}
