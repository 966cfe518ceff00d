//! Dynamically typed field values.

use super::DynamicMessage;
use crate::descriptor::{FieldDescriptor, FieldType};
use bytes::Bytes;

/// Value of one singular field or one repeated-field element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// bool
    Bool(bool),
    /// int32, sint32, sfixed32
    I32(i32),
    /// int64, sint64, sfixed64
    I64(i64),
    /// uint32, fixed32
    U32(u32),
    /// uint64, fixed64
    U64(u64),
    /// float
    F32(f32),
    /// double
    F64(f64),
    /// string
    String(String),
    /// bytes
    Bytes(Bytes),
    /// Enum number, which need not be a declared value
    EnumNumber(i32),
    /// Embedded message
    Message(DynamicMessage),
}

impl Value {
    /// Zero value of a scalar type; `None` for messages
    pub fn zero(field_type: FieldType) -> Option<Value> {
        let value = match field_type {
            FieldType::Double => Value::F64(0.0),
            FieldType::Float => Value::F32(0.0),
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => Value::I32(0),
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => Value::I64(0),
            FieldType::Uint32 | FieldType::Fixed32 => Value::U32(0),
            FieldType::Uint64 | FieldType::Fixed64 => Value::U64(0),
            FieldType::Bool => Value::Bool(false),
            FieldType::String => Value::String(String::new()),
            FieldType::Bytes => Value::Bytes(Bytes::new()),
            FieldType::Enum => Value::EnumNumber(0),
            FieldType::Message => return None,
        };
        Some(value)
    }

    /// Returns true if this value can be stored in `field`
    ///
    /// Message values must also be instances of the field's message type.
    pub fn is_valid_for_field(&self, field: &FieldDescriptor) -> bool {
        match (self, field.field_type()) {
            (Value::Message(message), FieldType::Message) => {
                field.message_type().as_ref() == Some(message.descriptor())
            }
            (value, field_type) => value.is_valid_for_type(field_type),
        }
    }

    fn is_valid_for_type(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (Value::Bool(_), FieldType::Bool)
                | (
                    Value::I32(_),
                    FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32
                )
                | (
                    Value::I64(_),
                    FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64
                )
                | (Value::U32(_), FieldType::Uint32 | FieldType::Fixed32)
                | (Value::U64(_), FieldType::Uint64 | FieldType::Fixed64)
                | (Value::F32(_), FieldType::Float)
                | (Value::F64(_), FieldType::Double)
                | (Value::String(_), FieldType::String)
                | (Value::Bytes(_), FieldType::Bytes)
                | (Value::EnumNumber(_), FieldType::Enum)
                | (Value::Message(_), FieldType::Message)
        )
    }

    /// Short name of the value's runtime kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::EnumNumber(_) => "enum number",
            Value::Message(_) => "message",
        }
    }

    /// Returns the value as a bool, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as an i32, if it is one
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a u32, if it is one
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a u64, if it is one
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as an f32, if it is one
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is one
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as bytes, if it is bytes
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the enum number, if this is an enum value
    pub fn as_enum_number(&self) -> Option<i32> {
        match *self {
            Value::EnumNumber(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the embedded message, if this is one
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the embedded message mutably, if this is one
    pub fn as_message_mut(&mut self) -> Option<&mut DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Bytes => Bytes,
    Vec<u8> => Bytes,
    DynamicMessage => Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero(FieldType::Sint32), Some(Value::I32(0)));
        assert_eq!(Value::zero(FieldType::Fixed64), Some(Value::U64(0)));
        assert_eq!(Value::zero(FieldType::Bytes), Some(Value::Bytes(Bytes::new())));
        assert_eq!(Value::zero(FieldType::Message), None);
    }

    #[test]
    fn test_type_compatibility() {
        assert!(Value::I32(-3).is_valid_for_type(FieldType::Sint32));
        assert!(Value::I32(-3).is_valid_for_type(FieldType::Sfixed32));
        assert!(!Value::I32(-3).is_valid_for_type(FieldType::Int64));
        assert!(!Value::U32(3).is_valid_for_type(FieldType::Int32));
        assert!(!Value::I32(1).is_valid_for_type(FieldType::Enum));
        assert!(Value::EnumNumber(1).is_valid_for_type(FieldType::Enum));
        assert!(!Value::String("x".into()).is_valid_for_type(FieldType::Bytes));
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("hy"), Value::String("hy".to_string()));
        assert_eq!(Value::from(24), Value::I32(24));
        assert_eq!(Value::from(70.5), Value::F64(70.5));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(Bytes::from_static(&[1, 2])));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::I64(-1).as_i32(), None);
    }
}
