//! proto3 wire-format encoding
//!
//! The schema only exists at run time, so records are encoded directly
//! instead of going through generated message types. Scalars follow the
//! standard encoding: varint for the integer family (negative int32
//! sign-extended to 64 bits), fixed64 for doubles, length-delimited for
//! strings. Repeated fields are written unpacked, one tagged element per
//! value; map entries are nested `{1: key, 2: value}` messages.
//!
//! Singular fields holding their default value are omitted, as proto3
//! serializers do.

use tablec_core::Value;

pub const WIRE_VARINT: u32 = 0;
pub const WIRE_FIXED64: u32 = 1;
pub const WIRE_LEN: u32 = 2;

pub fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub fn put_tag(buf: &mut Vec<u8>, field_number: u32, wire_type: u32) {
    put_varint(buf, (u64::from(field_number) << 3) | u64::from(wire_type));
}

pub fn put_len_delimited(buf: &mut Vec<u8>, field_number: u32, bytes: &[u8]) {
    put_tag(buf, field_number, WIRE_LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn is_default(value: &Value) -> bool {
    match value {
        Value::Int(v) => *v == 0,
        Value::Long(v) => *v == 0,
        Value::Double(v) => *v == 0.0,
        Value::Bool(v) => !*v,
        Value::Str(s) => s.is_empty(),
        Value::Enum(v) => *v == 0,
    }
}

/// Write one tagged value, regardless of defaults.
///
/// Used for repeated elements and map entry parts, where every value is
/// explicit.
pub fn put_element(buf: &mut Vec<u8>, field_number: u32, value: &Value) {
    match value {
        Value::Int(v) => {
            put_tag(buf, field_number, WIRE_VARINT);
            // negative int32 is sign-extended to ten bytes
            put_varint(buf, *v as i64 as u64);
        }
        Value::Long(v) => {
            put_tag(buf, field_number, WIRE_VARINT);
            put_varint(buf, *v as u64);
        }
        Value::Enum(v) => {
            put_tag(buf, field_number, WIRE_VARINT);
            put_varint(buf, *v as i64 as u64);
        }
        Value::Bool(v) => {
            put_tag(buf, field_number, WIRE_VARINT);
            put_varint(buf, u64::from(*v));
        }
        Value::Double(v) => {
            put_tag(buf, field_number, WIRE_FIXED64);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::Str(s) => {
            put_len_delimited(buf, field_number, s.as_bytes());
        }
    }
}

/// Write one singular field, omitting proto3 defaults.
pub fn put_field(buf: &mut Vec<u8>, field_number: u32, value: &Value) {
    if !is_default(value) {
        put_element(buf, field_number, value);
    }
}

/// Write one map entry as a nested `{1: key, 2: value}` message.
pub fn put_map_entry(buf: &mut Vec<u8>, field_number: u32, key: &Value, value: &Value) {
    let mut entry = Vec::new();
    put_field(&mut entry, 1, key);
    put_field(&mut entry, 2, value);
    put_len_delimited(buf, field_number, &entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_varint(bytes: &[u8], pos: &mut usize) -> u64 {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = bytes[*pos];
            *pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return value;
            }
            shift += 7;
        }
    }

    #[test]
    fn varint_boundaries() {
        for (value, expected) in [
            (0u64, vec![0u8]),
            (1, vec![1]),
            (127, vec![127]),
            (128, vec![0x80, 1]),
            (300, vec![0xac, 0x02]),
        ] {
            let mut buf = Vec::new();
            put_varint(&mut buf, value);
            assert_eq!(buf, expected, "value {value}");
        }
    }

    #[test]
    fn negative_int32_takes_ten_bytes() {
        let mut buf = Vec::new();
        put_element(&mut buf, 1, &Value::Int(-1));
        // tag + ten varint bytes
        assert_eq!(buf.len(), 11);
        let mut pos = 0;
        assert_eq!(read_varint(&buf, &mut pos), (1 << 3) | u64::from(WIRE_VARINT));
        assert_eq!(read_varint(&buf, &mut pos) as i64, -1);
    }

    #[test]
    fn defaults_are_omitted() {
        let mut buf = Vec::new();
        put_field(&mut buf, 1, &Value::Int(0));
        put_field(&mut buf, 2, &Value::Str(String::new()));
        put_field(&mut buf, 3, &Value::Bool(false));
        assert!(buf.is_empty());

        put_field(&mut buf, 1, &Value::Int(7));
        assert_eq!(buf, vec![0x08, 7]);
    }

    #[test]
    fn double_is_fixed64() {
        let mut buf = Vec::new();
        put_field(&mut buf, 2, &Value::Double(1.5));
        assert_eq!(buf[0], (2 << 3) | WIRE_FIXED64 as u8);
        assert_eq!(&buf[1..], &1.5f64.to_bits().to_le_bytes());
    }

    #[test]
    fn string_is_length_delimited() {
        let mut buf = Vec::new();
        put_field(&mut buf, 1, &Value::Str("Sword".to_string()));
        assert_eq!(buf, b"\x0a\x05Sword");
    }

    #[test]
    fn map_entry_is_nested_message() {
        let mut buf = Vec::new();
        put_map_entry(&mut buf, 4, &Value::Int(2), &Value::Str("hp".to_string()));

        let mut pos = 0;
        let tag = read_varint(&buf, &mut pos);
        assert_eq!(tag, (4 << 3) | u64::from(WIRE_LEN));
        let len = read_varint(&buf, &mut pos) as usize;
        let entry = &buf[pos..pos + len];
        // 1: varint 2, 2: "hp"
        assert_eq!(entry, b"\x08\x02\x12\x02hp");
    }

    #[test]
    fn map_entry_omits_default_parts() {
        let mut buf = Vec::new();
        put_map_entry(&mut buf, 1, &Value::Int(0), &Value::Int(5));
        // the zero key is omitted inside the entry
        assert_eq!(buf, b"\x0a\x02\x10\x05");
    }
}
