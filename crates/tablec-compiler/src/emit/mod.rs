//! Output generation: proto3 schema text and accessor source

pub mod proto;
pub mod script;

/// Extension of serialized data blobs
pub const DATA_SUFFIX: &str = ".pbdata";

/// Suffix of the per-message list wrapper (`Item` -> `ItemList`)
pub const LIST_MESSAGE_SUFFIX: &str = "List";

/// The single repeated field inside every list wrapper
pub const LIST_FIELD_NAME: &str = "items";
