//! Error types for the tagbuf-core library.
//!
//! Every fallible operation in the crate reports one of the variants below.
//! Schema-build errors come out of the descriptor builder, decode errors out
//! of the wire codec, and reflection errors out of [`DynamicMessage`] access
//! with a field or value of the wrong shape.
//!
//! [`DynamicMessage`]: crate::reflect::DynamicMessage

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tagbuf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all tagbuf operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A field with the same name was already added to the message
    #[error("field name '{name}' already exists in message '{message}'")]
    DuplicateField {
        /// Offending field name
        name: String,
        /// Message the field was added to
        message: String,
    },

    /// A field with the same tag number was already added to the message
    #[error("tag {tag} of field '{name}' is already used by field '{existing}' in message '{message}'")]
    DuplicateTag {
        /// Duplicated tag number
        tag: u32,
        /// Field that was rejected
        name: String,
        /// Field that owns the tag
        existing: String,
        /// Message the field was added to
        message: String,
    },

    /// A message, enum or service name is declared twice in one scope
    #[error("type name '{name}' already exists in scope '{scope}'")]
    DuplicateType {
        /// Offending type name
        name: String,
        /// Enclosing package or message
        scope: String,
    },

    /// An enum value name is declared twice in one enum
    #[error("enum value '{name}' already exists in enum '{enum_name}'")]
    DuplicateEnumValue {
        /// Offending value name
        name: String,
        /// Enum the value was added to
        enum_name: String,
    },

    /// A method name is declared twice in one service
    #[error("method '{name}' already exists in service '{service}'")]
    DuplicateMethod {
        /// Offending method name
        name: String,
        /// Service the method was added to
        service: String,
    },

    /// Invalid field number in descriptor
    #[error("invalid field number {number} for field '{field}': must be between 1 and {max}")]
    InvalidFieldNumber {
        /// Field carrying the number
        field: String,
        /// The invalid field number
        number: u32,
        /// Maximum valid field number
        max: u32,
    },

    /// A message or enum reference could not be resolved within the file
    #[error("field '{field}' references unknown {expected} type '{type_name}'")]
    UnresolvedType {
        /// Field holding the reference
        field: String,
        /// Referenced type name as written in the schema
        type_name: String,
        /// "message" or "enum"
        expected: &'static str,
    },

    /// A default value could not be applied to its field
    #[error("invalid default value '{value}' for field '{field}': {reason}")]
    InvalidDefault {
        /// Field carrying the default
        field: String,
        /// Default value text
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A field uses a type this crate does not model
    #[error("field '{field}' has unsupported type '{type_name}'")]
    UnsupportedFieldType {
        /// Offending field
        field: String,
        /// Type as reported by the schema source
        type_name: String,
    },

    /// Failed to decode varint
    #[error("failed to decode varint at offset {offset}: buffer too small or invalid encoding")]
    VarintDecode {
        /// Byte offset where the error occurred
        offset: usize,
    },

    /// Invalid wire format
    #[error("invalid wire format at offset {offset}: {details}")]
    InvalidWireFormat {
        /// Byte offset where the error occurred
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// A known field arrived with a wire type other than its declared one
    #[error("field '{field}' expects wire type {expected} but record at offset {offset} has wire type {actual}")]
    WireTypeMismatch {
        /// Field the tag resolved to
        field: String,
        /// Wire type implied by the field's declared type
        expected: u8,
        /// Wire type found in the record key
        actual: u8,
        /// Byte offset of the record key
        offset: usize,
    },

    /// A string field payload is not valid UTF-8
    #[error("string field '{field}' at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field being decoded
        field: String,
        /// Byte offset of the payload
        offset: usize,
    },

    /// Embedded messages nest deeper than the decoder allows
    #[error("message nesting exceeds recursion limit of {limit}")]
    RecursionLimitExceeded {
        /// Configured limit
        limit: usize,
    },

    /// A value's runtime kind disagrees with the field's declared type
    #[error("field '{field}' expects a {expected} value, got {actual}")]
    TypeMismatch {
        /// Field being written
        field: String,
        /// Declared type of the field
        expected: String,
        /// Kind of the supplied value
        actual: &'static str,
    },

    /// A singular-only operation was used on a repeated field or vice versa
    #[error("field '{field}' is not a {expected} field")]
    LabelMismatch {
        /// Field being accessed
        field: String,
        /// Label the operation requires
        expected: &'static str,
    },

    /// A field descriptor from another message was used to access this one
    #[error("field '{field}' does not belong to message '{message}'")]
    ForeignField {
        /// Full name of the field
        field: String,
        /// Message being accessed
        message: String,
    },

    /// No field with this name exists in the message
    #[error("message '{message}' has no field named '{name}'")]
    UnknownField {
        /// Requested name
        name: String,
        /// Message being accessed
        message: String,
    },

    /// Repeated field index past the end
    #[error("index {index} out of bounds for repeated field '{field}' of size {size}")]
    IndexOutOfBounds {
        /// Field being accessed
        field: String,
        /// Requested index
        index: usize,
        /// Current number of elements
        size: usize,
    },

    /// The factory has no message type with this name
    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    /// Failed to read a descriptor file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse FileDescriptorProto
    #[error("failed to parse FileDescriptorProto: {0}")]
    DescriptorParse(#[from] prost::DecodeError),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new duplicate field error
    pub fn duplicate_field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DuplicateField {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new duplicate type error
    pub fn duplicate_type(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::DuplicateType {
            name: name.into(),
            scope: scope.into(),
        }
    }

    /// Creates a new invalid default error
    pub fn invalid_default(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDefault {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new wire format error
    pub fn invalid_wire_format(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidWireFormat {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new varint decode error
    pub fn varint_decode(offset: usize) -> Self {
        Self::VarintDecode { offset }
    }

    /// Creates a new label mismatch error
    pub fn label_mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        Self::LabelMismatch {
            field: field.into(),
            expected,
        }
    }

    /// Returns true if this error was raised while building descriptors
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateField { .. }
                | Self::DuplicateTag { .. }
                | Self::DuplicateType { .. }
                | Self::DuplicateEnumValue { .. }
                | Self::DuplicateMethod { .. }
                | Self::InvalidFieldNumber { .. }
                | Self::UnresolvedType { .. }
                | Self::InvalidDefault { .. }
                | Self::UnsupportedFieldType { .. }
        )
    }

    /// Returns true if this error was raised while decoding wire data
    ///
    /// A message that failed to decode may be partially populated and
    /// should be discarded by the caller.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::VarintDecode { .. }
                | Self::InvalidWireFormat { .. }
                | Self::WireTypeMismatch { .. }
                | Self::InvalidUtf8 { .. }
                | Self::RecursionLimitExceeded { .. }
        )
    }
}
