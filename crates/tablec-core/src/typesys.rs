//! The type algebra: classifying type tokens and rendering schema types
//!
//! Token grammar (after key markers are stripped):
//!
//! ```text
//! type   := scalar | enum-name | scalar '[]' | enum-name '[]'
//!         | 'map<' (scalar|enum-name) ',' (scalar|enum-name) '>'
//!         | '%string' | '%%string'
//! scalar := 'int' | 'long' | 'double' | 'bool' | 'string'
//! ```
//!
//! Enum names are resolved against the [`EnumRegistry`], which the enum
//! table's head-parse must have populated first.

use crate::enums::EnumRegistry;
use crate::{
    INDEPENDENT_KEY_MARKER, LOCALIZED_IMAGE_TOKEN, LOCALIZED_TEXT_TOKEN, UNION_KEY_MARKER,
};

/// The five base scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Long,
    Double,
    Bool,
    String,
}

impl ScalarKind {
    pub fn parse(token: &str) -> Option<ScalarKind> {
        match token {
            "int" => Some(ScalarKind::Int),
            "long" => Some(ScalarKind::Long),
            "double" => Some(ScalarKind::Double),
            "bool" => Some(ScalarKind::Bool),
            "string" => Some(ScalarKind::String),
            _ => None,
        }
    }

    /// The proto3 scalar type name
    pub fn proto_name(self) -> &'static str {
        match self {
            ScalarKind::Int => "int32",
            ScalarKind::Long => "int64",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
        }
    }

    /// The spreadsheet token for this scalar
    pub fn token(self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
        }
    }
}

/// Array elements and map keys/values: scalars or enums only,
/// no nested collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar(ScalarKind),
    Enum(String),
}

impl ElementType {
    fn parse(token: &str, enums: &EnumRegistry) -> Option<ElementType> {
        if let Some(kind) = ScalarKind::parse(token) {
            return Some(ElementType::Scalar(kind));
        }
        if enums.contains(token) {
            return Some(ElementType::Enum(token.to_string()));
        }
        None
    }

    pub fn proto_name(&self) -> &str {
        match self {
            ElementType::Scalar(kind) => kind.proto_name(),
            ElementType::Enum(name) => name,
        }
    }
}

/// A classified type token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarKind),
    LocalizedText,
    LocalizedImage,
    Enum(String),
    Array(ElementType),
    Map(ElementType, ElementType),
}

impl FieldType {
    /// Classify a bare (key-marker-free) type token.
    ///
    /// Returns `None` for tokens outside the algebra, including nested
    /// collections like `int[][]` or `map<int[],string>`.
    pub fn classify(token: &str, enums: &EnumRegistry) -> Option<FieldType> {
        if token == LOCALIZED_TEXT_TOKEN {
            return Some(FieldType::LocalizedText);
        }
        if token == LOCALIZED_IMAGE_TOKEN {
            return Some(FieldType::LocalizedImage);
        }
        if let Some(kind) = ScalarKind::parse(token) {
            return Some(FieldType::Scalar(kind));
        }
        if let Some(element) = token.strip_suffix("[]") {
            return ElementType::parse(element, enums).map(FieldType::Array);
        }
        if let Some(inner) = token.strip_prefix("map<").and_then(|s| s.strip_suffix('>')) {
            let mut parts = inner.split(',');
            let key = parts.next()?;
            let value = parts.next()?;
            if parts.next().is_some() {
                return None;
            }
            let key = ElementType::parse(key, enums)?;
            let value = ElementType::parse(value, enums)?;
            return Some(FieldType::Map(key, value));
        }
        if enums.contains(token) {
            return Some(FieldType::Enum(token.to_string()));
        }
        None
    }

    /// Render the proto3 schema type for a field line.
    pub fn proto_type(&self) -> String {
        match self {
            FieldType::Scalar(kind) => kind.proto_name().to_string(),
            FieldType::LocalizedText | FieldType::LocalizedImage => "string".to_string(),
            FieldType::Enum(name) => name.clone(),
            FieldType::Array(element) => format!("repeated {}", element.proto_name()),
            FieldType::Map(key, value) => {
                format!("map<{},{}>", key.proto_name(), value.proto_name())
            }
        }
    }

    pub fn is_localized_text(&self) -> bool {
        matches!(self, FieldType::LocalizedText)
    }

    pub fn is_localized_image(&self) -> bool {
        matches!(self, FieldType::LocalizedImage)
    }
}

/// Whether a field participates in the table's key model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    #[default]
    None,
    Independent,
    Union,
}

/// Strip a leading key marker from a type token.
///
/// The union marker `**` is checked before the independent marker `*`
/// since the latter is a prefix of the former.
pub fn strip_key_marker(token: &str) -> (KeyKind, &str) {
    if let Some(rest) = token.strip_prefix(UNION_KEY_MARKER) {
        return (KeyKind::Union, rest);
    }
    if let Some(rest) = token.strip_prefix(INDEPENDENT_KEY_MARKER) {
        return (KeyKind::Independent, rest);
    }
    (KeyKind::None, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{EnumInfo, EnumMember};
    use crate::PlatformMask;

    fn registry_with_color() -> EnumRegistry {
        let enums = EnumRegistry::new();
        enums
            .insert(EnumInfo {
                name: "Color".to_string(),
                members: vec![
                    EnumMember {
                        name: "Red".to_string(),
                        value: 0,
                    },
                    EnumMember {
                        name: "Blue".to_string(),
                        value: 1,
                    },
                ],
                platform: PlatformMask::ALL,
                comment: String::new(),
            })
            .unwrap();
        enums
    }

    #[test]
    fn classify_scalars() {
        let enums = EnumRegistry::new();
        assert_eq!(
            FieldType::classify("int", &enums),
            Some(FieldType::Scalar(ScalarKind::Int))
        );
        assert_eq!(
            FieldType::classify("string", &enums),
            Some(FieldType::Scalar(ScalarKind::String))
        );
        assert_eq!(FieldType::classify("float", &enums), None);
    }

    #[test]
    fn classify_localized() {
        let enums = EnumRegistry::new();
        assert_eq!(
            FieldType::classify("%string", &enums),
            Some(FieldType::LocalizedText)
        );
        assert_eq!(
            FieldType::classify("%%string", &enums),
            Some(FieldType::LocalizedImage)
        );
        // the sigil only applies to string
        assert_eq!(FieldType::classify("%int", &enums), None);
    }

    #[test]
    fn classify_arrays() {
        let enums = registry_with_color();
        assert_eq!(
            FieldType::classify("int[]", &enums),
            Some(FieldType::Array(ElementType::Scalar(ScalarKind::Int)))
        );
        assert_eq!(
            FieldType::classify("Color[]", &enums),
            Some(FieldType::Array(ElementType::Enum("Color".to_string())))
        );
        // no array-of-array, no array-of-map
        assert_eq!(FieldType::classify("int[][]", &enums), None);
        assert_eq!(FieldType::classify("map<int,string>[]", &enums), None);
    }

    #[test]
    fn classify_maps() {
        let enums = registry_with_color();
        assert_eq!(
            FieldType::classify("map<int,string>", &enums),
            Some(FieldType::Map(
                ElementType::Scalar(ScalarKind::Int),
                ElementType::Scalar(ScalarKind::String)
            ))
        );
        assert_eq!(
            FieldType::classify("map<Color,long>", &enums),
            Some(FieldType::Map(
                ElementType::Enum("Color".to_string()),
                ElementType::Scalar(ScalarKind::Long)
            ))
        );
        // nested collections and arity errors are invalid
        assert_eq!(FieldType::classify("map<int[],string>", &enums), None);
        assert_eq!(FieldType::classify("map<int>", &enums), None);
        assert_eq!(FieldType::classify("map<int,string,bool>", &enums), None);
    }

    #[test]
    fn classify_enum_needs_registry() {
        let empty = EnumRegistry::new();
        assert_eq!(FieldType::classify("Color", &empty), None);

        let enums = registry_with_color();
        assert_eq!(
            FieldType::classify("Color", &enums),
            Some(FieldType::Enum("Color".to_string()))
        );
    }

    #[test]
    fn key_markers() {
        assert_eq!(strip_key_marker("*int"), (KeyKind::Independent, "int"));
        assert_eq!(strip_key_marker("**int"), (KeyKind::Union, "int"));
        assert_eq!(strip_key_marker("int"), (KeyKind::None, "int"));
    }

    #[test]
    fn proto_types() {
        let enums = registry_with_color();
        let cases = [
            ("int", "int32"),
            ("long", "int64"),
            ("double", "double"),
            ("bool", "bool"),
            ("string", "string"),
            ("%string", "string"),
            ("%%string", "string"),
            ("int[]", "repeated int32"),
            ("Color[]", "repeated Color"),
            ("map<int,string>", "map<int32,string>"),
            ("Color", "Color"),
        ];
        for (token, expected) in cases {
            let ty = FieldType::classify(token, &enums).unwrap();
            assert_eq!(ty.proto_type(), expected, "token {token}");
        }
    }
}
