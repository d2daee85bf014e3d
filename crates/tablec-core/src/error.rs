//! Error types for tablec-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tablec-core
#[derive(Debug, Error)]
pub enum Error {
    /// Type token not covered by the type algebra
    #[error("Invalid type token: {0}")]
    InvalidType(String),

    /// Cell text could not be converted to the field's scalar type
    #[error("Cannot parse '{text}' as {ty}")]
    UnparseableValue { ty: &'static str, text: String },

    /// Enum member name not declared by the enum table
    #[error("Enum {enum_name} has no member named '{member}'")]
    UnknownEnumMember { enum_name: String, member: String },

    /// Two enums with the same name across the enum table
    #[error("Duplicate enum name: {0}")]
    DuplicateEnum(String),

    /// Two fields with the same name within one table
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
}
