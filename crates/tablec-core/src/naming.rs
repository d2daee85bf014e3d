//! Identifier casing conversions
//!
//! Spreadsheet column names use snake_case; generated accessor code uses
//! PascalCase type/property names and camelCase field names.

/// Convert a snake_case identifier to PascalCase.
pub fn to_pascal_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for word in input.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Convert a snake_case identifier to camelCase.
pub fn to_camel_case(input: &str) -> String {
    let pascal = to_pascal_case(input);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => pascal,
    }
}
