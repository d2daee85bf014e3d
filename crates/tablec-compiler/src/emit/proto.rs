//! proto3 schema text emission
//!
//! Schemas exist only as text here; the data encoder serializes rows
//! directly from the parsed headers, so the emitted `.pbmeta` files and
//! [`HeaderInfo::numbered_fields`] must agree on field numbering. Common
//! table messages land in `tables.pbmeta`, their `repeated` wrappers in
//! `tables_list.pbmeta`, and enums and error codes in their own pair of
//! files.

use std::fs;
use std::path::{Path, PathBuf};

use tablec_core::{EnumInfo, HeaderInfo, Platform};

use crate::emit::{LIST_FIELD_NAME, LIST_MESSAGE_SUFFIX};
use crate::error::Result;
use crate::kinds::common::CommonTable;

pub const TABLES_META: &str = "tables.pbmeta";
pub const TABLES_LIST_META: &str = "tables_list.pbmeta";
pub const ENUMS_META: &str = "enums.pbmeta";
pub const ERROR_CODES_META: &str = "error_codes.pbmeta";
pub const ERROR_CODES_LIST_META: &str = "error_codes_list.pbmeta";

fn prelude(package: &str, imports: &[&str]) -> String {
    let mut out = String::new();
    out.push_str("syntax = \"proto3\";\n\n");
    out.push_str(&format!("package {package};\n"));
    if !imports.is_empty() {
        out.push('\n');
        for import in imports {
            out.push_str(&format!("import \"{import}\";\n"));
        }
    }
    out
}

fn push_message(out: &mut String, header: &HeaderInfo, platform: Platform) {
    out.push_str(&format!("\nmessage {} {{\n", header.message_name));
    for (number, field) in header.numbered_fields(platform) {
        out.push_str(&format!(
            "\t{} {} = {};",
            field.ty.proto_type(),
            field.name,
            number
        ));
        if !field.comment.is_empty() {
            out.push_str(&format!(" //{}", field.comment));
        }
        out.push('\n');
    }
    out.push_str("}\n");
}

/// Render one message per header, with fields filtered and numbered for
/// the platform.
pub fn render_messages(
    package: &str,
    imports: &[&str],
    headers: &[&HeaderInfo],
    platform: Platform,
) -> String {
    let mut out = prelude(package, imports);
    for header in headers {
        push_message(&mut out, header, platform);
    }
    out
}

/// Render the `<Name>List` wrapper messages for a set of message names.
pub fn render_lists(package: &str, import: &str, names: &[&str]) -> String {
    let mut out = prelude(package, &[import]);
    for name in names {
        out.push_str(&format!(
            "\nmessage {name}{LIST_MESSAGE_SUFFIX} {{\n\trepeated {name} {LIST_FIELD_NAME} = 1;\n}}\n"
        ));
    }
    out
}

/// Render the enum declarations, one `enum` block per entry.
pub fn render_enums(package: &str, enums: &[EnumInfo]) -> String {
    let mut out = prelude(package, &[]);
    for info in enums {
        out.push('\n');
        if !info.comment.is_empty() {
            out.push_str(&format!("//{}\n", info.comment));
        }
        out.push_str(&format!("enum {} {{\n", info.name));
        for member in &info.members {
            out.push_str(&format!("\t{} = {};\n", member.name, member.value));
        }
        out.push_str("}\n");
    }
    out
}

/// Write the full schema set for one platform and return the written
/// paths in emission order.
pub fn write_schemas(
    dir: &Path,
    package: &str,
    platform: Platform,
    commons: &[CommonTable],
    error_header: Option<&HeaderInfo>,
    enums: &[EnumInfo],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if !enums.is_empty() {
        let path = dir.join(ENUMS_META);
        fs::write(&path, render_enums(package, enums))?;
        written.push(path);
    }

    if !commons.is_empty() {
        let imports: &[&str] = if enums.is_empty() { &[] } else { &[ENUMS_META] };
        let headers: Vec<&HeaderInfo> = commons.iter().map(|t| &t.header).collect();
        let path = dir.join(TABLES_META);
        fs::write(&path, render_messages(package, imports, &headers, platform))?;
        written.push(path);

        let names: Vec<&str> = commons
            .iter()
            .map(|t| t.header.message_name.as_str())
            .collect();
        let path = dir.join(TABLES_LIST_META);
        fs::write(&path, render_lists(package, TABLES_META, &names))?;
        written.push(path);
    }

    if let Some(header) = error_header {
        let path = dir.join(ERROR_CODES_META);
        fs::write(&path, render_messages(package, &[], &[header], platform))?;
        written.push(path);

        let path = dir.join(ERROR_CODES_LIST_META);
        fs::write(
            &path,
            render_lists(package, ERROR_CODES_META, &[header.message_name.as_str()]),
        )?;
        written.push(path);
    }

    Ok(written)
}
