//! Loading descriptors from compiled `FileDescriptorProto` schemas.
//!
//! This is the path for schemas produced by `protoc --descriptor_set_out`
//! or embedded by code generators. The proto is mapped onto the builder API,
//! so the same validation and resolution rules apply as for hand-built
//! descriptors.

use super::builder::{
    EnumBuilder, FieldBuilder, FileDescriptorBuilder, MessageBuilder, ServiceBuilder,
};
use super::{FieldType, FileDescriptor};
use crate::error::{Error, Result};
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};
use std::path::Path;
use tracing::debug;

impl FileDescriptor {
    /// Creates a descriptor from an encoded `FileDescriptorProto`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let proto = FileDescriptorProto::decode(data)?;
        Self::from_proto(&proto)
    }

    /// Reads and decodes a `FileDescriptorProto` from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
        debug!("Read {} bytes of descriptor from {}", data.len(), path.display());
        Self::from_bytes(&data)
    }

    /// Creates a descriptor from a `FileDescriptorProto`
    ///
    /// Groups are rejected with [`Error::UnsupportedFieldType`]. Extensions
    /// and options are ignored.
    pub fn from_proto(proto: &FileDescriptorProto) -> Result<Self> {
        let mut builder = FileDescriptorBuilder::new(proto.name(), proto.package());

        for message in &proto.message_type {
            builder.add_message(message_builder(message)?)?;
        }
        for enum_type in &proto.enum_type {
            builder.add_enum(enum_builder(enum_type)?)?;
        }
        for service in &proto.service {
            builder.add_service(service_builder(service)?)?;
        }

        builder.build()
    }
}

fn message_builder(proto: &DescriptorProto) -> Result<MessageBuilder> {
    let mut message = MessageBuilder::new(proto.name());

    for nested in &proto.nested_type {
        message.add_message(message_builder(nested)?)?;
    }
    for enum_type in &proto.enum_type {
        message.add_enum(enum_builder(enum_type)?)?;
    }
    for field in &proto.field {
        message.add_field(field_builder(proto.name(), field)?)?;
    }

    Ok(message)
}

fn field_builder(message: &str, proto: &FieldDescriptorProto) -> Result<FieldBuilder> {
    let unsupported = |type_name: &str| Error::UnsupportedFieldType {
        field: format!("{}.{}", message, proto.name()),
        type_name: type_name.to_string(),
    };

    let proto_type = proto
        .r#type
        .and_then(|t| Type::try_from(t).ok())
        .ok_or_else(|| unsupported("unspecified"))?;

    let field_type = match proto_type {
        Type::Double => FieldType::Double,
        Type::Float => FieldType::Float,
        Type::Int64 => FieldType::Int64,
        Type::Uint64 => FieldType::Uint64,
        Type::Int32 => FieldType::Int32,
        Type::Fixed64 => FieldType::Fixed64,
        Type::Fixed32 => FieldType::Fixed32,
        Type::Bool => FieldType::Bool,
        Type::String => FieldType::String,
        Type::Group => return Err(unsupported("group")),
        Type::Message => FieldType::Message,
        Type::Bytes => FieldType::Bytes,
        Type::Uint32 => FieldType::Uint32,
        Type::Enum => FieldType::Enum,
        Type::Sfixed32 => FieldType::Sfixed32,
        Type::Sfixed64 => FieldType::Sfixed64,
        Type::Sint32 => FieldType::Sint32,
        Type::Sint64 => FieldType::Sint64,
    };

    // Negative numbers map to 0, which the builder rejects as out of range
    let tag = u32::try_from(proto.number()).unwrap_or(0);
    let mut field = FieldBuilder::new(proto.name(), tag, field_type);

    if proto.label() == Label::Repeated {
        field = field.repeated();
    }
    if !proto.type_name().is_empty() {
        field = field.type_name(proto.type_name());
    }
    if let Some(default) = &proto.default_value {
        field = field.default_value(default.as_str());
    }

    Ok(field)
}

fn enum_builder(proto: &EnumDescriptorProto) -> Result<EnumBuilder> {
    let mut enum_type = EnumBuilder::new(proto.name());
    for value in &proto.value {
        enum_type.add_value(value.name(), value.number())?;
    }
    Ok(enum_type)
}

fn service_builder(proto: &ServiceDescriptorProto) -> Result<ServiceBuilder> {
    let mut service = ServiceBuilder::new(proto.name());
    for method in &proto.method {
        service.add_method(method.name(), method.input_type(), method.output_type())?;
    }
    Ok(service)
}
