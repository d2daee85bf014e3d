//! C# source emission: table accessors and constant classes
//!
//! Every common table gets an `<Name>Excel` accessor class that parses
//! its `.pbdata` blob and exposes the rows plus one dictionary per key.
//! Error codes additionally get plain `const long` classes so call sites
//! can reference codes without loading any data, and singleton tables
//! become `static` classes of typed constants.

use std::fs;
use std::path::{Path, PathBuf};

use tablec_core::naming::{to_camel_case, to_pascal_case};
use tablec_core::{
    EnumRegistry, ErrorCodeRegistry, ErrorCodeSheet, FieldInfo, FieldType, HeaderInfo, Platform,
    ScalarKind, Value,
};

use crate::emit::{DATA_SUFFIX, LIST_MESSAGE_SUFFIX};
use crate::error::{CompileError, Result};
use crate::kinds::common::CommonTable;
use crate::kinds::single::SingleTable;

/// Class-name suffix of generated accessors (`Item` -> `ItemExcel`)
pub const ACCESSOR_SUFFIX: &str = "Excel";

pub const FRAME_CONST_CLASS: &str = "FrameErrorCode";
pub const FRAME_CONST_NAMESPACE: &str = "Frame";
pub const BUSINESS_CONST_CLASS: &str = "BusinessErrorCode";
pub const BUSINESS_CONST_NAMESPACE: &str = "Business.Data";

/// `business.data.tables` -> `Business.Data.Tables`
pub fn csharp_namespace(package: &str) -> String {
    package
        .split('.')
        .map(to_pascal_case)
        .collect::<Vec<_>>()
        .join(".")
}

fn element_script(element: &tablec_core::ElementType) -> String {
    match element {
        tablec_core::ElementType::Scalar(kind) => kind.token().to_string(),
        tablec_core::ElementType::Enum(name) => name.clone(),
    }
}

/// The C# type a field maps to. Scalar tokens double as C# type names.
pub fn script_type(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(kind) => kind.token().to_string(),
        FieldType::LocalizedText | FieldType::LocalizedImage => "string".to_string(),
        FieldType::Enum(name) => name.clone(),
        FieldType::Array(element) => format!("{}[]", element_script(element)),
        FieldType::Map(key, value) => {
            format!(
                "Dictionary<{}, {}>",
                element_script(key),
                element_script(value)
            )
        }
    }
}

fn tuple_type(fields: &[&FieldInfo]) -> String {
    if fields.len() == 1 {
        return script_type(&fields[0].ty);
    }
    let parts: Vec<String> = fields.iter().map(|f| script_type(&f.ty)).collect();
    format!("({})", parts.join(", "))
}

fn tuple_expr(fields: &[&FieldInfo]) -> String {
    if fields.len() == 1 {
        return format!("data.{}", to_pascal_case(&fields[0].name));
    }
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("data.{}", to_pascal_case(&f.name)))
        .collect();
    format!("({})", parts.join(", "))
}

/// Render the accessor class for one table.
///
/// Key dictionaries cover only fields visible to the platform; the union
/// dictionary is dropped when any of its fields is excluded, since the
/// tuple would be incomplete.
pub fn accessor_source(namespace: &str, header: &HeaderInfo, platform: Platform) -> String {
    let name = &header.message_name;
    let class = format!("{name}{ACCESSOR_SUFFIX}");

    let independent: Vec<&FieldInfo> = header
        .independent_keys
        .iter()
        .map(|&i| &header.fields[i])
        .filter(|f| f.platform.contains(platform))
        .collect();
    let union: Option<Vec<&FieldInfo>> = if header.union_keys.is_empty() {
        None
    } else {
        let fields: Vec<&FieldInfo> = header
            .union_keys
            .iter()
            .map(|&i| &header.fields[i])
            .collect();
        if fields.iter().all(|f| f.platform.contains(platform)) {
            Some(fields)
        } else {
            None
        }
    };
    let has_keys = !independent.is_empty() || union.is_some();

    let mut out = String::new();
    out.push_str("using System.Collections.Generic;\nusing Google.Protobuf;\n\n");
    out.push_str(&format!("namespace {namespace}\n{{\n"));
    out.push_str(&format!("    public class {class}\n    {{\n"));
    out.push_str(&format!(
        "        public const string DataFile = \"{name}{DATA_SUFFIX}\";\n\n"
    ));
    out.push_str(&format!("        private static {class} ins;\n\n"));
    out.push_str(&format!(
        "        public static {class} Ins\n\
         \x20       {{\n\
         \x20           get\n\
         \x20           {{\n\
         \x20               if (ins == null)\n\
         \x20               {{\n\
         \x20                   ins = new {class}();\n\
         \x20               }}\n\
         \x20               return ins;\n\
         \x20           }}\n\
         \x20       }}\n\n"
    ));
    out.push_str(
        "        public static void ReleaseIns()\n\
         \x20       {\n\
         \x20           ins = null;\n\
         \x20       }\n\n",
    );
    out.push_str(&format!(
        "        public {name}[] Datas {{ get; private set; }}\n"
    ));

    for field in &independent {
        let key_ty = script_type(&field.ty);
        let dic = format!("{}Dic", to_camel_case(&field.name));
        out.push_str(&format!(
            "\n        public Dictionary<{key_ty}, {name}> {dic} = new Dictionary<{key_ty}, {name}>();\n"
        ));
    }
    if let Some(fields) = &union {
        let key_ty = tuple_type(fields);
        out.push_str(&format!(
            "\n        public Dictionary<{key_ty}, {name}> Dic = new Dictionary<{key_ty}, {name}>();\n"
        ));
    }

    out.push_str("\n        public void ParseProto(byte[] bytes)\n        {\n");
    out.push_str(&format!(
        "            {name}{LIST_MESSAGE_SUFFIX} list = {name}{LIST_MESSAGE_SUFFIX}.Parser.ParseFrom(bytes);\n"
    ));
    out.push_str(&format!(
        "            Datas = new {name}[list.Items.Count];\n"
    ));
    out.push_str(
        "            for (int i = 0; i < Datas.Length; i++)\n\
         \x20           {\n\
         \x20               Datas[i] = list.Items[i];\n\
         \x20           }\n",
    );
    if has_keys {
        out.push_str("            GenerateKV();\n");
    }
    out.push_str("        }\n");

    if has_keys {
        out.push_str(&format!(
            "\n        private void GenerateKV()\n\
             \x20       {{\n\
             \x20           foreach ({name} data in Datas)\n\
             \x20           {{\n"
        ));
        for field in &independent {
            let dic = format!("{}Dic", to_camel_case(&field.name));
            out.push_str(&format!(
                "                {dic}.Add(data.{}, data);\n",
                to_pascal_case(&field.name)
            ));
        }
        if let Some(fields) = &union {
            out.push_str(&format!("                Dic.Add({}, data);\n", tuple_expr(fields)));
        }
        out.push_str("            }\n        }\n");
    }

    out.push_str("    }\n}\n");
    out
}

fn quote_csharp(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn default_literal(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int | ScalarKind::Long => "0",
        ScalarKind::Double => "0.0",
        ScalarKind::Bool => "false",
        ScalarKind::String => "\"\"",
    }
}

fn value_literal(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Double(v) => {
            let text = v.to_string();
            if text.contains('.') || text.contains('e') {
                text
            } else {
                format!("{text}.0")
            }
        }
        Value::Bool(v) => v.to_string(),
        Value::Str(s) => quote_csharp(s),
        Value::Enum(v) => v.to_string(),
    }
}

fn constant_literal(
    table: &str,
    field: &FieldInfo,
    value: Option<&str>,
    enums: &EnumRegistry,
) -> Result<String> {
    match &field.ty {
        FieldType::Scalar(kind) => match value {
            Some(text) => Value::parse_scalar(*kind, text)
                .map(|v| value_literal(&v))
                .map_err(|e| CompileError::in_field(table, &field.name, e)),
            None => Ok(default_literal(*kind).to_string()),
        },
        FieldType::LocalizedText | FieldType::LocalizedImage => Ok(match value {
            Some(text) => quote_csharp(text),
            None => "\"\"".to_string(),
        }),
        FieldType::Enum(enum_name) => match value {
            Some(member) => {
                if enums.member_value(enum_name, member).is_none() {
                    return Err(CompileError::in_field(
                        table,
                        &field.name,
                        tablec_core::Error::UnknownEnumMember {
                            enum_name: enum_name.clone(),
                            member: member.to_string(),
                        },
                    ));
                }
                Ok(format!("{enum_name}.{member}"))
            }
            None => Ok("default".to_string()),
        },
        // collections cannot be rendered as a single constant
        FieldType::Array(_) | FieldType::Map(_, _) => Err(CompileError::InvalidType {
            table: table.to_string(),
            token: field.raw_type.clone(),
        }),
    }
}

/// Render the constant class of one singleton table.
pub fn single_source(
    namespace: &str,
    table: &SingleTable,
    platform: Platform,
    enums: &EnumRegistry,
) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("namespace {namespace}\n{{\n"));
    out.push_str(&format!("    public static class {}\n    {{\n", table.name));
    for (field, value) in table.header.fields.iter().zip(&table.values) {
        if !field.platform.contains(platform) {
            continue;
        }
        let literal = constant_literal(&table.name, field, value.as_deref(), enums)?;
        if !field.comment.is_empty() {
            out.push_str(&format!("        //{}\n", field.comment));
        }
        out.push_str(&format!(
            "        public readonly static {} {} = {};\n",
            script_type(&field.ty),
            field.name,
            literal
        ));
    }
    out.push_str("    }\n}\n");
    Ok(out)
}

/// Render a `const long` class from error-code entries.
pub fn const_class_source(namespace: &str, class: &str, sheets: &[&ErrorCodeSheet]) -> String {
    let mut out = String::new();
    out.push_str(&format!("namespace {namespace}\n{{\n"));
    out.push_str(&format!("    public static class {class}\n    {{\n"));
    for sheet in sheets {
        for entry in &sheet.entries {
            out.push_str(&format!(
                "        public const long {} = {};",
                entry.code_str, entry.code
            ));
            if !entry.comment.is_empty() {
                out.push_str(&format!(" //{}", entry.comment));
            }
            out.push('\n');
        }
    }
    out.push_str("    }\n}\n");
    out
}

/// Write all accessor and constant sources for one platform.
pub fn write_accessors(
    dir: &Path,
    package: &str,
    platform: Platform,
    commons: &[CommonTable],
    error_header: Option<&HeaderInfo>,
    singles: &[SingleTable],
    enums: &EnumRegistry,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let namespace = csharp_namespace(package);
    let mut written = Vec::new();

    for table in commons {
        let path = dir.join(format!("{}{ACCESSOR_SUFFIX}.cs", table.header.message_name));
        fs::write(&path, accessor_source(&namespace, &table.header, platform))?;
        written.push(path);
    }

    if let Some(header) = error_header {
        // lookup by numeric code is the accessor's whole point
        let mut keyed = header.clone();
        if keyed.independent_keys.is_empty() {
            if let Some(idx) = keyed.fields.iter().position(|f| f.name == "code") {
                keyed.independent_keys.push(idx);
            }
        }
        let path = dir.join(format!("{}{ACCESSOR_SUFFIX}.cs", keyed.message_name));
        fs::write(&path, accessor_source(&namespace, &keyed, platform))?;
        written.push(path);
    }

    for table in singles {
        let path = dir.join(format!("{}.cs", table.name));
        fs::write(&path, single_source(&namespace, table, platform, enums)?)?;
        written.push(path);
    }

    Ok(written)
}

/// Write the frame and business error-code constant classes.
///
/// Error codes carry no platform column, so the same classes are written
/// for every configured target.
pub fn write_error_code_consts(
    frame_dir: Option<&Path>,
    business_dir: Option<&Path>,
    codes: &ErrorCodeRegistry,
) -> Result<Vec<PathBuf>> {
    let sheets = codes.sorted_sheets();
    let mut written = Vec::new();

    if let Some(dir) = frame_dir {
        let frame: Vec<&ErrorCodeSheet> = sheets.iter().filter(|s| s.is_frame()).collect();
        if !frame.is_empty() {
            fs::create_dir_all(dir)?;
            let path = dir.join(format!("{FRAME_CONST_CLASS}.cs"));
            fs::write(
                &path,
                const_class_source(FRAME_CONST_NAMESPACE, FRAME_CONST_CLASS, &frame),
            )?;
            written.push(path);
        }
    }

    if let Some(dir) = business_dir {
        let business: Vec<&ErrorCodeSheet> = sheets.iter().filter(|s| !s.is_frame()).collect();
        if !business.is_empty() {
            fs::create_dir_all(dir)?;
            let path = dir.join(format!("{BUSINESS_CONST_CLASS}.cs"));
            fs::write(
                &path,
                const_class_source(BUSINESS_CONST_NAMESPACE, BUSINESS_CONST_CLASS, &business),
            )?;
            written.push(path);
        }
    }

    Ok(written)
}
