//! Wire bytes to message.

use super::wire::{zigzag_decode32, zigzag_decode64, WireReader};
use crate::descriptor::{FieldDescriptor, FieldType};
use crate::error::{Error, Result};
use crate::reflect::{DynamicMessage, Value};
use bytes::Bytes;
use tracing::{debug, trace};

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum nesting depth of embedded messages
    pub recursion_limit: usize,
    /// Decode into a scratch copy and only replace the target on success
    pub transactional: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 100,
            transactional: false,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth of embedded messages
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Sets whether a failed decode leaves the target untouched
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }
}

/// Merges wire-format bytes into a [`DynamicMessage`]
///
/// Decoding merges: scalar fields take the last value seen, repeated fields
/// append, and singular message fields merge into the existing instance.
/// Records with unknown tags are skipped.
///
/// Nested messages are materialized with [`DynamicMessage::new`] from the
/// field's message type, the same constructor that backs
/// [`MessageFactory`](crate::MessageFactory) prototypes, so a decoded child
/// is indistinguishable from one created through the factory. Use
/// [`MessageFactory::decode`](crate::MessageFactory::decode) when only the
/// type name is known.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Parses `data` and merges it into `target`
    ///
    /// Without [`DecoderConfig::transactional`], fields decoded before an
    /// error stay applied to `target`.
    pub fn decode(&self, data: &[u8], target: &mut DynamicMessage) -> Result<()> {
        trace!(
            "Decoding {} bytes into {}",
            data.len(),
            target.descriptor().full_name()
        );

        if !self.config.transactional {
            return self.merge(&mut WireReader::new(data), target, 0);
        }

        let mut scratch = target.clone();
        match self.merge(&mut WireReader::new(data), &mut scratch, 0) {
            Ok(()) => {
                *target = scratch;
                Ok(())
            }
            Err(e) => {
                debug!(
                    "Discarding partial decode of {}: {}",
                    target.descriptor().full_name(),
                    e
                );
                Err(e)
            }
        }
    }

    fn merge(
        &self,
        reader: &mut WireReader<'_>,
        message: &mut DynamicMessage,
        depth: usize,
    ) -> Result<()> {
        while !reader.is_empty() {
            let offset = reader.offset();
            let (tag, wire_type) = reader.read_key()?;

            let Some(field) = message.descriptor().find_field_by_tag(tag) else {
                trace!(
                    "Skipping unknown field {} ({:?}) at offset {}",
                    tag,
                    wire_type,
                    offset
                );
                reader.skip(wire_type)?;
                continue;
            };

            if wire_type != field.wire_type() {
                return Err(Error::WireTypeMismatch {
                    field: field.full_name().to_string(),
                    expected: field.wire_type().as_u8(),
                    actual: wire_type.as_u8(),
                    offset,
                });
            }
            trace!("Decoding field {} at offset {}", field.full_name(), offset);

            if field.is_message_type() {
                if depth >= self.config.recursion_limit {
                    return Err(Error::RecursionLimitExceeded {
                        limit: self.config.recursion_limit,
                    });
                }
                let mut nested = reader.read_nested()?;
                if field.is_repeated_type() {
                    let child = message.add_message(&field)?;
                    self.merge(&mut nested, child, depth + 1)?;
                } else {
                    let child = message.mutable_message(&field)?;
                    self.merge(&mut nested, child, depth + 1)?;
                    message.mark_present(&field)?;
                }
                continue;
            }

            let value = read_scalar(reader, &field)?;
            if field.is_repeated_type() {
                message.push(&field, value)?;
            } else {
                message.set(&field, value)?;
            }
        }
        Ok(())
    }
}

fn read_scalar(reader: &mut WireReader<'_>, field: &FieldDescriptor) -> Result<Value> {
    let value = match field.field_type() {
        // Truncation to 32 bits mirrors how int32 values are widened on encode
        FieldType::Int32 => Value::I32(reader.read_varint()? as i32),
        FieldType::Int64 => Value::I64(reader.read_varint()? as i64),
        FieldType::Uint32 => Value::U32(reader.read_varint()? as u32),
        FieldType::Uint64 => Value::U64(reader.read_varint()?),
        FieldType::Sint32 => Value::I32(zigzag_decode32(reader.read_varint()? as u32)),
        FieldType::Sint64 => Value::I64(zigzag_decode64(reader.read_varint()?)),
        FieldType::Bool => Value::Bool(reader.read_varint()? != 0),
        FieldType::Enum => Value::EnumNumber(reader.read_varint()? as i32),
        FieldType::Fixed32 => Value::U32(reader.read_fixed32()?),
        FieldType::Sfixed32 => Value::I32(reader.read_fixed32()? as i32),
        FieldType::Float => Value::F32(f32::from_bits(reader.read_fixed32()?)),
        FieldType::Fixed64 => Value::U64(reader.read_fixed64()?),
        FieldType::Sfixed64 => Value::I64(reader.read_fixed64()? as i64),
        FieldType::Double => Value::F64(f64::from_bits(reader.read_fixed64()?)),
        FieldType::String => {
            let offset = reader.offset();
            let raw = reader.read_len_delimited()?;
            let text = std::str::from_utf8(raw).map_err(|_| Error::InvalidUtf8 {
                field: field.full_name().to_string(),
                offset,
            })?;
            Value::String(text.to_string())
        }
        FieldType::Bytes => Value::Bytes(Bytes::copy_from_slice(reader.read_len_delimited()?)),
        FieldType::Message => {
            return Err(Error::invalid_wire_format(
                reader.offset(),
                format!("field '{}' is a message, not a scalar", field.full_name()),
            ))
        }
    };
    Ok(value)
}
