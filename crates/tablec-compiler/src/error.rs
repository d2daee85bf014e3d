//! Compiler error type

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between opening a workbook and writing
/// the last output file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("table {table}: unknown header role '#{role}'")]
    UnknownHeaderRole { table: String, role: String },

    #[error("table {table}: header rows are not aligned at {cell}: expected span {expected_start}..={expected_end}, found {found_start}..={found_end}")]
    HeaderMisaligned {
        table: String,
        cell: String,
        expected_start: u32,
        expected_end: u32,
        found_start: u32,
        found_end: u32,
    },

    #[error("table {table}: invalid type token '{token}'")]
    InvalidType { table: String, token: String },

    #[error("table {table}: duplicate field name '{name}'")]
    DuplicateField { table: String, name: String },

    #[error("duplicate table name '{0}'")]
    DuplicateTable(String),

    #[error("table {table}: duplicate key '{value}' in field '{field}'")]
    DuplicateKey {
        table: String,
        field: String,
        value: String,
    },

    #[error("table {table}: duplicate union key ({values})")]
    DuplicateUnionKey { table: String, values: String },

    #[error("table {table}: missing fixed fields: {missing}")]
    MissingFixedFields { table: String, missing: String },

    #[error("table {table}: fixed field '{field}' must have type '{expected}', found '{found}'")]
    FixedFieldType {
        table: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("table {table}: enum '{name}': {members} member names but {values} values")]
    EnumValueCount {
        table: String,
        name: String,
        members: usize,
        values: usize,
    },

    #[error("table {table}, field {field}: cannot parse '{text}' as {ty}")]
    UnparseableValue {
        table: String,
        field: String,
        ty: &'static str,
        text: String,
    },

    #[error("table {table}, field {field}: enum {enum_name} has no member '{member}'")]
    UnknownEnumMember {
        table: String,
        field: String,
        enum_name: String,
        member: String,
    },

    #[error("table {table}: cell {cell} is not covered by any field")]
    UnmappedCell { table: String, cell: String },

    #[error("table {table}: cell {cell} should hold a map value")]
    MapValueMissing { table: String, cell: String },

    #[error("table {table} is a singleton table and allows only one value per field")]
    SingleMultiValue { table: String },

    #[error("no header information for table '{0}'")]
    MissingHeader(String),

    #[error("input path does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("{program} exited with {status}: {stderr}")]
    Subprocess {
        program: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Core(#[from] tablec_core::Error),

    #[error(transparent)]
    Xlsx(#[from] tablec_xlsx::XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

impl CompileError {
    /// Attach table and field context to a bare value-conversion error.
    pub(crate) fn in_field(table: &str, field: &str, err: tablec_core::Error) -> CompileError {
        match err {
            tablec_core::Error::UnparseableValue { ty, text } => CompileError::UnparseableValue {
                table: table.to_string(),
                field: field.to_string(),
                ty,
                text,
            },
            tablec_core::Error::UnknownEnumMember { enum_name, member } => {
                CompileError::UnknownEnumMember {
                    table: table.to_string(),
                    field: field.to_string(),
                    enum_name,
                    member,
                }
            }
            other => CompileError::Core(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
