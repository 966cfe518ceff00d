//! # tagbuf-core
//!
//! A schema-driven serialization library for tagged binary messages.
//!
//! This crate provides the core functionality for:
//! - Describing message, field, enum and service types in an immutable descriptor model
//! - Reading and writing message fields generically through those descriptors
//! - Encoding messages to the compact tag/varint wire format and decoding them back
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`descriptor`]: Schema metadata, its builder, and `FileDescriptorProto` ingestion
//! - [`reflect`]: Dynamic message instances and field values
//! - [`codec`]: Wire format primitives, encoder and decoder
//! - [`factory`]: Creating message instances by type name
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use tagbuf_core::descriptor::{FieldBuilder, FieldType, FileDescriptorBuilder, MessageBuilder};
//! use tagbuf_core::MessageFactory;
//!
//! let mut student = MessageBuilder::new("Student");
//! student
//!     .add_field(FieldBuilder::new("name", 1, FieldType::String))?
//!     .add_field(FieldBuilder::new("age", 2, FieldType::Int32))?
//!     .add_field(FieldBuilder::new("graduated", 3, FieldType::Bool))?;
//!
//! let mut file = FileDescriptorBuilder::new("student.proto", "school");
//! file.add_message(student)?;
//! let factory = MessageFactory::new(file.build()?);
//!
//! let mut msg = factory.create("school.Student").unwrap();
//! msg.set_by_name("name", "hy")?;
//! msg.set_by_name("age", 24)?;
//! msg.set_by_name("graduated", true)?;
//!
//! let decoded = factory.decode("school.Student", msg.serialize().as_bytes())?;
//! assert_eq!(decoded.get_by_name("age")?.as_i32(), Some(24));
//! # Ok::<(), tagbuf_core::Error>(())
//! ```
//!
//! Schemas compiled by `protoc` can be loaded with
//! [`FileDescriptor::from_bytes`] or [`FileDescriptor::from_file`].

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod reflect;

// Re-export primary types for convenience
pub use codec::{Decoder, DecoderConfig, SerializedMessage, WireType};
pub use descriptor::{
    EnumDescriptor, FieldDescriptor, FieldType, FileDescriptor, MessageDescriptor,
    ServiceDescriptor,
};
pub use error::{Error, Result};
pub use factory::MessageFactory;
pub use reflect::{DynamicMessage, Value};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;
