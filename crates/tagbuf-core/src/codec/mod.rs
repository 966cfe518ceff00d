//! Binary wire codec for [`DynamicMessage`].
//!
//! Encoding walks the present fields of a message in ascending tag order and
//! writes one record per singular field and one record per repeated element
//! (repeated scalars are never packed). Decoding is the inverse and merges
//! into an existing message.
//!
//! ```
//! use tagbuf_core::descriptor::{FieldBuilder, FieldType, FileDescriptorBuilder, MessageBuilder};
//! use tagbuf_core::DynamicMessage;
//!
//! let mut student = MessageBuilder::new("Student");
//! student
//!     .add_field(FieldBuilder::new("name", 1, FieldType::String))?
//!     .add_field(FieldBuilder::new("age", 2, FieldType::Int32))?;
//! let mut file = FileDescriptorBuilder::new("student.proto", "");
//! file.add_message(student)?;
//! let file = file.build()?;
//! let student = file.find_message_type_by_name("Student").unwrap();
//!
//! let mut msg = DynamicMessage::new(student.clone());
//! msg.set_by_name("name", "hy")?;
//! let bytes = msg.serialize();
//! assert_eq!(bytes.as_bytes(), b"\x0a\x02hy");
//!
//! let mut copy = DynamicMessage::new(student);
//! copy.deserialize(bytes.as_bytes())?;
//! assert_eq!(copy, msg);
//! # Ok::<(), tagbuf_core::Error>(())
//! ```

mod decode;
mod encode;
pub mod wire;

pub use decode::{Decoder, DecoderConfig};
pub use wire::WireType;

use crate::error::Result;
use crate::reflect::DynamicMessage;
use bytes::{BufMut, Bytes, BytesMut};
use std::ops::Deref;

/// Encoded bytes of one message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializedMessage {
    bytes: Bytes,
}

impl SerializedMessage {
    /// Wraps already encoded bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the data as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of encoded bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for the encoding of a message with no present fields
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the wrapper and returns the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl Deref for SerializedMessage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for SerializedMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<SerializedMessage> for Bytes {
    fn from(message: SerializedMessage) -> Self {
        message.bytes
    }
}

impl DynamicMessage {
    /// Encodes the message into a fresh buffer
    pub fn serialize(&self) -> SerializedMessage {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        SerializedMessage {
            bytes: buf.freeze(),
        }
    }

    /// Appends the encoded message to `buf`
    pub fn encode(&self, buf: &mut impl BufMut) {
        encode::encode_message(self, buf);
    }

    /// Exact size of the encoded message in bytes
    pub fn encoded_len(&self) -> usize {
        encode::encoded_len(self)
    }

    /// Parses `data` and merges it into this message with default settings
    ///
    /// See [`Decoder`] for merge semantics and error behavior.
    pub fn deserialize(&mut self, data: &[u8]) -> Result<()> {
        Decoder::new().decode(data, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        EnumBuilder, FieldBuilder, FieldType, FileDescriptor, FileDescriptorBuilder,
        MessageBuilder,
    };
    use crate::reflect::Value;
    use prost::Message;
    use prost_reflect::DescriptorPool;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{
        DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    };
    use pretty_assertions::assert_eq;

    fn student_file() -> FileDescriptor {
        let mut student = MessageBuilder::new("Student");
        student
            .add_field(FieldBuilder::new("name", 1, FieldType::String))
            .unwrap()
            .add_field(FieldBuilder::new("age", 2, FieldType::Int32))
            .unwrap()
            .add_field(FieldBuilder::new("graduated", 3, FieldType::Bool))
            .unwrap()
            .add_field(FieldBuilder::new("weight", 4, FieldType::Double))
            .unwrap();
        let mut file = FileDescriptorBuilder::new("student.proto", "school");
        file.add_message(student).unwrap();
        file.build().unwrap()
    }

    #[test]
    fn test_student_round_trip() {
        let file = student_file();
        let desc = file.find_message_type_by_name("school.Student").unwrap();

        let mut student = DynamicMessage::new(desc.clone());
        student.set_by_name("name", "hy").unwrap();
        student.set_by_name("age", 24).unwrap();
        student.set_by_name("graduated", true).unwrap();
        let bytes = student.serialize();
        assert_eq!(
            bytes.as_bytes(),
            &[0x0a, 0x02, b'h', b'y', 0x10, 0x18, 0x18, 0x01]
        );
        assert_eq!(bytes.len(), student.encoded_len());

        let mut decoded = DynamicMessage::new(desc);
        decoded.deserialize(&bytes).unwrap();
        assert_eq!(decoded.get_by_name("name").unwrap().as_str(), Some("hy"));
        assert_eq!(decoded.get_by_name("age").unwrap().as_i32(), Some(24));
        assert_eq!(decoded.get_by_name("graduated").unwrap().as_bool(), Some(true));
        assert!(!decoded.has_by_name("weight").unwrap());
        assert_eq!(decoded.get_by_name("weight").unwrap().as_f64(), Some(0.0));
        assert_eq!(decoded, student);
    }

    #[test]
    fn test_round_trip_every_scalar_type() {
        let types = [
            ("f_double", FieldType::Double, Value::F64(-2.5)),
            ("f_float", FieldType::Float, Value::F32(3.25)),
            ("f_int32", FieldType::Int32, Value::I32(-7)),
            ("f_int64", FieldType::Int64, Value::I64(-1 << 40)),
            ("f_uint32", FieldType::Uint32, Value::U32(u32::MAX)),
            ("f_uint64", FieldType::Uint64, Value::U64(u64::MAX)),
            ("f_sint32", FieldType::Sint32, Value::I32(i32::MIN)),
            ("f_sint64", FieldType::Sint64, Value::I64(i64::MIN)),
            ("f_fixed32", FieldType::Fixed32, Value::U32(0xdead_beef)),
            ("f_fixed64", FieldType::Fixed64, Value::U64(1 << 63)),
            ("f_sfixed32", FieldType::Sfixed32, Value::I32(-12)),
            ("f_sfixed64", FieldType::Sfixed64, Value::I64(-13)),
            ("f_bool", FieldType::Bool, Value::Bool(true)),
            ("f_string", FieldType::String, Value::from("héllo")),
            ("f_bytes", FieldType::Bytes, Value::from(vec![0u8, 255, 1])),
        ];

        let mut all = MessageBuilder::new("AllTypes");
        for (tag, (name, field_type, _)) in types.iter().enumerate() {
            all.add_field(FieldBuilder::new(*name, tag as u32 + 1, *field_type))
                .unwrap();
        }
        let mut file = FileDescriptorBuilder::new("all.proto", "");
        file.add_message(all).unwrap();
        let file = file.build().unwrap();
        let desc = file.find_message_type_by_name("AllTypes").unwrap();

        // Non-default values, then explicitly set zero values
        let mut values = DynamicMessage::new(desc.clone());
        let mut zeros = DynamicMessage::new(desc.clone());
        for (name, field_type, value) in &types {
            values.set_by_name(name, value.clone()).unwrap();
            zeros.set_by_name(name, Value::zero(*field_type).unwrap()).unwrap();
        }

        for original in [values, zeros] {
            let mut decoded = DynamicMessage::new(desc.clone());
            decoded.deserialize(&original.serialize()).unwrap();
            assert_eq!(decoded, original);
            for (name, _, _) in &types {
                assert!(decoded.has_by_name(name).unwrap());
            }
        }
    }

    #[test]
    fn test_round_trip_enums_and_sub_message() {
        let mut mood = EnumBuilder::new("Mood");
        mood.add_value("GRUMPY", -5)
            .unwrap()
            .add_value("CALM", 0)
            .unwrap()
            .add_value("HAPPY", 2)
            .unwrap();

        let mut inner = MessageBuilder::new("Inner");
        inner
            .add_field(FieldBuilder::new("n", 1, FieldType::Int32))
            .unwrap();

        let mut outer = MessageBuilder::new("Outer");
        outer
            .add_field(FieldBuilder::enumeration("mood", 1, "Mood"))
            .unwrap()
            .add_field(FieldBuilder::enumeration("history", 2, "Mood").repeated())
            .unwrap()
            .add_field(FieldBuilder::message("inner", 3, "Inner"))
            .unwrap();

        let mut file = FileDescriptorBuilder::new("mood.proto", "");
        file.add_enum(mood).unwrap();
        file.add_message(inner).unwrap();
        file.add_message(outer).unwrap();
        let file = file.build().unwrap();
        let desc = file.find_message_type_by_name("Outer").unwrap();

        let mut original = DynamicMessage::new(desc.clone());
        original.set_by_name("mood", Value::EnumNumber(-5)).unwrap();
        let history = original.field_by_name("history").unwrap();
        original.push(&history, Value::EnumNumber(2)).unwrap();
        original.push(&history, Value::EnumNumber(-5)).unwrap();
        let inner_field = original.field_by_name("inner").unwrap();
        original
            .mutable_message(&inner_field)
            .unwrap()
            .set_by_name("n", -1)
            .unwrap();

        let bytes = original.serialize();
        assert_eq!(bytes.len(), original.encoded_len());

        let mut decoded = DynamicMessage::new(desc);
        decoded.deserialize(&bytes).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.has_by_name("mood").unwrap());
        assert!(decoded.has_by_name("inner").unwrap());
        assert_eq!(
            decoded.get_by_name("mood").unwrap().into_owned(),
            Value::EnumNumber(-5)
        );
        assert_eq!(
            decoded.get_repeated(&history).unwrap(),
            &[Value::EnumNumber(2), Value::EnumNumber(-5)]
        );
        let inner = decoded.get_message(&inner_field).unwrap();
        assert_eq!(inner.get_by_name("n").unwrap().as_i32(), Some(-1));
    }

    #[test]
    fn test_empty_message_serializes_to_nothing() {
        let file = student_file();
        let desc = file.find_message_type_by_name("school.Student").unwrap();
        let student = DynamicMessage::new(desc);
        assert!(student.serialize().is_empty());
    }

    fn student_proto() -> FileDescriptorProto {
        let field = |name: &str, number: i32, ty: Type, label: Label| FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(ty as i32),
            label: Some(label as i32),
            ..Default::default()
        };
        FileDescriptorProto {
            name: Some("student.proto".to_string()),
            package: Some("school".to_string()),
            syntax: Some("proto2".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Student".to_string()),
                field: vec![
                    field("name", 1, Type::String, Label::Optional),
                    field("age", 2, Type::Int32, Label::Optional),
                    field("graduated", 3, Type::Bool, Label::Optional),
                    field("weight", 4, Type::Double, Label::Optional),
                    field("scores", 5, Type::Sint32, Label::Repeated),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn reference_pool() -> DescriptorPool {
        DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
            file: vec![student_proto()],
        })
        .unwrap()
    }

    #[test]
    fn test_encoding_matches_reference_decoder() {
        let file = FileDescriptor::from_proto(&student_proto()).unwrap();
        let desc = file.find_message_type_by_name("school.Student").unwrap();
        let mut student = DynamicMessage::new(desc);
        student.set_by_name("name", "hy").unwrap();
        student.set_by_name("age", -24).unwrap();
        student.set_by_name("weight", 70.5).unwrap();
        let scores = student.field_by_name("scores").unwrap();
        student.push(&scores, -3).unwrap();
        student.push(&scores, 7).unwrap();

        let pool = reference_pool();
        let desc = pool.get_message_by_name("school.Student").unwrap();
        let reference =
            prost_reflect::DynamicMessage::decode(desc, student.serialize().as_bytes()).unwrap();

        assert_eq!(reference.get_field_by_name("name").unwrap().as_str(), Some("hy"));
        assert_eq!(reference.get_field_by_name("age").unwrap().as_i32(), Some(-24));
        assert_eq!(reference.get_field_by_name("weight").unwrap().as_f64(), Some(70.5));
        assert!(!reference.has_field_by_name("graduated"));
        let reference_scores: Vec<i32> = reference
            .get_field_by_name("scores")
            .unwrap()
            .as_list()
            .unwrap()
            .iter()
            .filter_map(prost_reflect::Value::as_i32)
            .collect();
        assert_eq!(reference_scores, vec![-3, 7]);
    }

    #[test]
    fn test_decoding_reference_encoding() {
        let pool = reference_pool();
        let desc = pool.get_message_by_name("school.Student").unwrap();
        let mut reference = prost_reflect::DynamicMessage::new(desc);
        reference.set_field_by_name("name", prost_reflect::Value::String("hy".to_string()));
        reference.set_field_by_name("graduated", prost_reflect::Value::Bool(true));
        reference.set_field_by_name(
            "scores",
            prost_reflect::Value::List(vec![prost_reflect::Value::I32(-1)]),
        );
        let bytes = reference.encode_to_vec();

        let file = FileDescriptor::from_proto(&student_proto()).unwrap();
        let desc = file.find_message_type_by_name("school.Student").unwrap();
        let mut student = DynamicMessage::new(desc);
        student.deserialize(&bytes).unwrap();

        assert_eq!(student.get_by_name("name").unwrap().as_str(), Some("hy"));
        assert_eq!(student.get_by_name("graduated").unwrap().as_bool(), Some(true));
        assert!(!student.has_by_name("age").unwrap());
        let scores = student.field_by_name("scores").unwrap();
        assert_eq!(student.get_repeated(&scores).unwrap(), &[Value::I32(-1)]);
    }
}
