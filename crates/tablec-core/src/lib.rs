//! # tablec-core
//!
//! Core data structures for the tablec table compiler.
//!
//! This crate provides the fundamental types used throughout tablec:
//! - [`FieldType`] and the type-token grammar (`classify`, key markers)
//! - [`PlatformMask`] - client/server emission visibility
//! - [`HeaderInfo`], [`FieldInfo`] - the parsed schema of one table
//! - [`EnumRegistry`], [`ErrorCodeRegistry`] - cross-table registries
//!   populated during the head-parse phase
//! - [`Value`] - a typed cell value, parsed from spreadsheet text

pub mod enums;
pub mod errcode;
pub mod error;
pub mod header;
pub mod naming;
pub mod platform;
pub mod typesys;
pub mod value;

// Re-exports for convenience
pub use enums::{EnumInfo, EnumMember, EnumRegistry};
pub use errcode::{ErrorCodeEntry, ErrorCodeRegistry, ErrorCodeSheet};
pub use error::{Error, Result};
pub use header::{FieldInfo, HeaderInfo, Span};
pub use platform::{Platform, PlatformMask};
pub use typesys::{ElementType, FieldType, KeyKind, ScalarKind};
pub use value::Value;

/// Marker that makes a row (or column, for single tables) a header-definition row
pub const HEADER_MARKER: char = '#';

/// Type token for localized text fields
pub const LOCALIZED_TEXT_TOKEN: &str = "%string";

/// Type token for localized image fields
pub const LOCALIZED_IMAGE_TOKEN: &str = "%%string";

/// Sigil marking a field as an independent key
pub const INDEPENDENT_KEY_MARKER: &str = "*";

/// Sigil marking a field as part of the union key (checked before `*`)
pub const UNION_KEY_MARKER: &str = "**";

/// Separator between enum member names (and values) inside one cell
pub const ENUM_MEMBER_SEPARATOR: char = '|';
