//! Message to wire bytes.

use super::wire::{
    encode_key, encode_varint, encoded_len_varint, key_len, zigzag_encode32, zigzag_encode64,
};
use crate::descriptor::{FieldDescriptor, FieldType};
use crate::reflect::{DynamicMessage, FieldValueRef, Value};
use bytes::BufMut;

/// Writes every present field in tag order. Repeated fields emit one record
/// per element.
pub(crate) fn encode_message(message: &DynamicMessage, buf: &mut impl BufMut) {
    for (field, values) in message.present_fields() {
        match values {
            FieldValueRef::Singular(value) => encode_field(&field, value, buf),
            FieldValueRef::Repeated(values) => {
                for value in values {
                    encode_field(&field, value, buf);
                }
            }
        }
    }
}

/// Exact number of bytes [`encode_message`] writes for `message`
pub(crate) fn encoded_len(message: &DynamicMessage) -> usize {
    message
        .present_fields()
        .map(|(field, values)| match values {
            FieldValueRef::Singular(value) => key_len(field.tag()) + payload_len(&field, value),
            FieldValueRef::Repeated(values) => values
                .iter()
                .map(|value| key_len(field.tag()) + payload_len(&field, value))
                .sum(),
        })
        .sum()
}

fn encode_field(field: &FieldDescriptor, value: &Value, buf: &mut impl BufMut) {
    encode_key(field.tag(), field.wire_type(), buf);
    match *value {
        Value::Bool(v) => encode_varint(u64::from(v), buf),
        Value::I32(v) => match field.field_type() {
            FieldType::Sint32 => encode_varint(u64::from(zigzag_encode32(v)), buf),
            FieldType::Sfixed32 => buf.put_i32_le(v),
            // int32 negatives are sign-extended to ten bytes
            _ => encode_varint(v as i64 as u64, buf),
        },
        Value::I64(v) => match field.field_type() {
            FieldType::Sint64 => encode_varint(zigzag_encode64(v), buf),
            FieldType::Sfixed64 => buf.put_i64_le(v),
            _ => encode_varint(v as u64, buf),
        },
        Value::U32(v) => match field.field_type() {
            FieldType::Fixed32 => buf.put_u32_le(v),
            _ => encode_varint(u64::from(v), buf),
        },
        Value::U64(v) => match field.field_type() {
            FieldType::Fixed64 => buf.put_u64_le(v),
            _ => encode_varint(v, buf),
        },
        Value::F32(v) => buf.put_f32_le(v),
        Value::F64(v) => buf.put_f64_le(v),
        Value::EnumNumber(v) => encode_varint(v as i64 as u64, buf),
        Value::String(ref v) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v.as_bytes());
        }
        Value::Bytes(ref v) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v);
        }
        Value::Message(ref v) => {
            encode_varint(encoded_len(v) as u64, buf);
            encode_message(v, buf);
        }
    }
}

fn payload_len(field: &FieldDescriptor, value: &Value) -> usize {
    match *value {
        Value::Bool(_) => 1,
        Value::I32(v) => match field.field_type() {
            FieldType::Sint32 => encoded_len_varint(u64::from(zigzag_encode32(v))),
            FieldType::Sfixed32 => 4,
            _ => encoded_len_varint(v as i64 as u64),
        },
        Value::I64(v) => match field.field_type() {
            FieldType::Sint64 => encoded_len_varint(zigzag_encode64(v)),
            FieldType::Sfixed64 => 8,
            _ => encoded_len_varint(v as u64),
        },
        Value::U32(v) => match field.field_type() {
            FieldType::Fixed32 => 4,
            _ => encoded_len_varint(u64::from(v)),
        },
        Value::U64(v) => match field.field_type() {
            FieldType::Fixed64 => 8,
            _ => encoded_len_varint(v),
        },
        Value::F32(_) => 4,
        Value::F64(_) => 8,
        Value::EnumNumber(v) => encoded_len_varint(v as i64 as u64),
        Value::String(ref v) => encoded_len_varint(v.len() as u64) + v.len(),
        Value::Bytes(ref v) => encoded_len_varint(v.len() as u64) + v.len(),
        Value::Message(ref v) => {
            let len = encoded_len(v);
            encoded_len_varint(len as u64) + len
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldBuilder, FileDescriptorBuilder, MessageBuilder};
    use pretty_assertions::assert_eq;

    fn scalars() -> DynamicMessage {
        let mut message = MessageBuilder::new("Scalars");
        message
            .add_field(FieldBuilder::new("i32", 1, FieldType::Int32))
            .unwrap()
            .add_field(FieldBuilder::new("s32", 2, FieldType::Sint32))
            .unwrap()
            .add_field(FieldBuilder::new("f32", 3, FieldType::Fixed32))
            .unwrap()
            .add_field(FieldBuilder::new("d", 4, FieldType::Double))
            .unwrap()
            .add_field(FieldBuilder::new("s", 5, FieldType::String))
            .unwrap()
            .add_field(FieldBuilder::new("sf64", 6, FieldType::Sfixed64))
            .unwrap();
        let mut file = FileDescriptorBuilder::new("scalars.proto", "");
        file.add_message(message).unwrap();
        let file = file.build().unwrap();
        DynamicMessage::new(file.find_message_type_by_name("Scalars").unwrap())
    }

    fn encode(message: &DynamicMessage) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_message(message, &mut buf);
        assert_eq!(buf.len(), encoded_len(message));
        buf
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let message = scalars();
        assert!(encode(&message).is_empty());
    }

    #[test]
    fn test_negative_int32_sign_extended() {
        let mut message = scalars();
        message.set_by_name("i32", -1).unwrap();
        let mut expected = vec![0x08];
        expected.extend_from_slice(&[0xff; 9]);
        expected.push(0x01);
        assert_eq!(encode(&message), expected);
    }

    #[test]
    fn test_sint32_zigzag() {
        let mut message = scalars();
        message.set_by_name("s32", -1).unwrap();
        assert_eq!(encode(&message), vec![0x10, 0x01]);
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let mut message = scalars();
        message.set_by_name("f32", 1u32).unwrap();
        message.set_by_name("d", 1.0f64).unwrap();
        message.set_by_name("sf64", -2i64).unwrap();
        let mut expected = vec![0x1d, 1, 0, 0, 0, 0x21];
        expected.extend_from_slice(&1.0f64.to_le_bytes());
        expected.push(0x31);
        expected.extend_from_slice(&(-2i64).to_le_bytes());
        assert_eq!(encode(&message), expected);
    }

    #[test]
    fn test_tag_order_regardless_of_set_order() {
        let mut message = scalars();
        message.set_by_name("s", "hi").unwrap();
        message.set_by_name("i32", 150).unwrap();
        assert_eq!(encode(&message), vec![0x08, 0x96, 0x01, 0x2a, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_default_valued_present_field_is_encoded() {
        let mut message = scalars();
        message.set_by_name("i32", 0).unwrap();
        assert_eq!(encode(&message), vec![0x08, 0x00]);
    }
}
