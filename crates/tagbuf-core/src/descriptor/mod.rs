//! Immutable schema metadata.
//!
//! A [`FileDescriptor`] is produced once by [`FileDescriptorBuilder::build`]
//! (or ingested from a `FileDescriptorProto`) and is read-only afterwards.
//! All other descriptor types are cheap handles: an `Arc` to the frozen file
//! plus an index. Cross-references between types are indices resolved in
//! the builder's second pass, so recursive and mutually recursive messages
//! never form an ownership cycle.
//!
//! ## Lookup
//!
//! ```
//! use tagbuf_core::descriptor::{FieldBuilder, FieldType, FileDescriptorBuilder, MessageBuilder};
//!
//! let mut student = MessageBuilder::new("Student");
//! student
//!     .add_field(FieldBuilder::new("name", 1, FieldType::String))?
//!     .add_field(FieldBuilder::new("age", 2, FieldType::Int32))?;
//!
//! let mut file = FileDescriptorBuilder::new("school.proto", "school");
//! file.add_message(student)?;
//! let file = file.build()?;
//!
//! let student = file.find_message_type_by_name("school.Student").unwrap();
//! assert_eq!(student.find_field_by_tag(2).unwrap().name(), "age");
//! # Ok::<(), tagbuf_core::Error>(())
//! ```

mod builder;
mod proto;

pub use builder::{EnumBuilder, FieldBuilder, FileDescriptorBuilder, MessageBuilder, ServiceBuilder};

use crate::codec::WireType;
use crate::reflect::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cardinality of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    /// At most one value, with an explicit presence flag
    Singular,
    /// Ordered sequence of values
    Repeated,
}

impl FieldLabel {
    /// Returns the label as written in a schema
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldLabel::Singular => "singular",
            FieldLabel::Repeated => "repeated",
        }
    }
}

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 64-bit float, fixed-width on the wire
    Double,
    /// 32-bit float, fixed-width on the wire
    Float,
    /// Signed 32-bit varint, negatives sign-extended
    Int32,
    /// Signed 64-bit varint
    Int64,
    /// Unsigned 32-bit varint
    Uint32,
    /// Unsigned 64-bit varint
    Uint64,
    /// Signed 32-bit zig-zag varint
    Sint32,
    /// Signed 64-bit zig-zag varint
    Sint64,
    /// Unsigned 32-bit fixed-width
    Fixed32,
    /// Unsigned 64-bit fixed-width
    Fixed64,
    /// Signed 32-bit fixed-width
    Sfixed32,
    /// Signed 64-bit fixed-width
    Sfixed64,
    /// Boolean varint
    Bool,
    /// UTF-8 text, length-delimited
    String,
    /// Raw bytes, length-delimited
    Bytes,
    /// Enum number, varint
    Enum,
    /// Embedded message, length-delimited
    Message,
}

impl FieldType {
    /// Coarse kind used by the classification predicates
    pub fn kind(self) -> FieldKind {
        match self {
            FieldType::String | FieldType::Bytes => FieldKind::String,
            FieldType::Enum => FieldKind::Enum,
            FieldType::Message => FieldKind::Message,
            _ => FieldKind::Numeric,
        }
    }

    /// Wire type used for values of this type
    pub fn wire_type(self) -> WireType {
        match self {
            FieldType::Double | FieldType::Fixed64 | FieldType::Sfixed64 => WireType::I64,
            FieldType::Float | FieldType::Fixed32 | FieldType::Sfixed32 => WireType::I32,
            FieldType::String | FieldType::Bytes | FieldType::Message => WireType::Len,
            FieldType::Int32
            | FieldType::Int64
            | FieldType::Uint32
            | FieldType::Uint64
            | FieldType::Sint32
            | FieldType::Sint64
            | FieldType::Bool
            | FieldType::Enum => WireType::Varint,
        }
    }

    /// Returns the type name as written in a schema
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Uint32 => "uint32",
            FieldType::Uint64 => "uint64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Enum => "enum",
            FieldType::Message => "message",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Integers, floats and booleans
    Numeric,
    /// Strings and bytes
    String,
    /// Enum numbers
    Enum,
    /// Embedded messages
    Message,
}

struct FileInner {
    path: String,
    package: String,
    messages: Vec<MessageInner>,
    enums: Vec<EnumInner>,
    services: Vec<ServiceInner>,
    message_index: HashMap<String, usize>,
    enum_index: HashMap<String, usize>,
    service_index: HashMap<String, usize>,
}

struct MessageInner {
    name: String,
    full_name: String,
    parent: Option<usize>,
    fields: Vec<FieldInner>,
    tag_order: Vec<usize>,
    fields_by_tag: HashMap<u32, usize>,
    fields_by_name: HashMap<String, usize>,
    nested_enums: HashMap<String, usize>,
    nested_messages: Vec<usize>,
}

struct FieldInner {
    name: String,
    full_name: String,
    label: FieldLabel,
    field_type: FieldType,
    tag: u32,
    default: Option<Value>,
    explicit_default: bool,
    type_ref: Option<TypeRef>,
}

#[derive(Debug, Clone, Copy)]
enum TypeRef {
    Message(usize),
    Enum(usize),
}

struct EnumInner {
    name: String,
    full_name: String,
    parent: Option<usize>,
    values: Vec<(String, i32)>,
    values_by_name: HashMap<String, usize>,
}

struct ServiceInner {
    name: String,
    full_name: String,
    methods: Vec<MethodDescriptor>,
}

/// Descriptor of one schema source file
///
/// Owns every message, enum and service declared in the file, nested
/// declarations included. Cloning is cheap and clones share the same data.
#[derive(Clone)]
pub struct FileDescriptor {
    inner: Arc<FileInner>,
}

impl FileDescriptor {
    /// Path of the schema source
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Package the file declares (may be empty)
    pub fn package(&self) -> &str {
        &self.inner.package
    }

    /// Number of messages, nested ones included
    pub fn num_messages(&self) -> usize {
        self.inner.messages.len()
    }

    /// Number of top-level enums
    pub fn num_enums(&self) -> usize {
        self.inner.enums.iter().filter(|e| e.parent.is_none()).count()
    }

    /// Number of enums declared inside a message
    pub fn num_nested_enums(&self) -> usize {
        self.inner.enums.iter().filter(|e| e.parent.is_some()).count()
    }

    /// Number of services
    pub fn num_services(&self) -> usize {
        self.inner.services.len()
    }

    /// Iterates over all messages in declaration order, nested ones included
    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(|index| self.message(index))
    }

    /// Iterates over all enums, nested ones included
    pub fn enums(&self) -> impl ExactSizeIterator<Item = EnumDescriptor> + '_ {
        (0..self.inner.enums.len()).map(|index| EnumDescriptor {
            file: self.clone(),
            index,
        })
    }

    /// Iterates over all services
    pub fn services(&self) -> impl ExactSizeIterator<Item = ServiceDescriptor> + '_ {
        (0..self.inner.services.len()).map(|index| ServiceDescriptor {
            file: self.clone(),
            index,
        })
    }

    /// Find a message by full name, `.`-prefixed full name, or package-relative name
    pub fn find_message_type_by_name(&self, name: &str) -> Option<MessageDescriptor> {
        self.inner
            .message_index
            .get(strip_leading_dot(name))
            .map(|&index| self.message(index))
    }

    /// Find an enum by full name, `.`-prefixed full name, or package-relative name
    pub fn find_enum_type_by_name(&self, name: &str) -> Option<EnumDescriptor> {
        self.inner
            .enum_index
            .get(strip_leading_dot(name))
            .map(|&index| EnumDescriptor {
                file: self.clone(),
                index,
            })
    }

    /// Find a service by full name or package-relative name
    pub fn find_service_type_by_name(&self, name: &str) -> Option<ServiceDescriptor> {
        self.inner
            .service_index
            .get(strip_leading_dot(name))
            .map(|&index| ServiceDescriptor {
                file: self.clone(),
                index,
            })
    }

    /// Find any declared type by name
    pub fn find_type_by_name(&self, name: &str) -> Option<TypeDescriptor> {
        self.find_message_type_by_name(name)
            .map(TypeDescriptor::Message)
            .or_else(|| self.find_enum_type_by_name(name).map(TypeDescriptor::Enum))
            .or_else(|| {
                self.find_service_type_by_name(name)
                    .map(TypeDescriptor::Service)
            })
    }

    pub(crate) fn message(&self, index: usize) -> MessageDescriptor {
        MessageDescriptor {
            file: self.clone(),
            index,
        }
    }
}

impl PartialEq for FileDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for FileDescriptor {}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("path", &self.inner.path)
            .field("package", &self.inner.package)
            .field("messages", &self.inner.messages.len())
            .field("enums", &self.inner.enums.len())
            .field("services", &self.inner.services.len())
            .finish()
    }
}

fn strip_leading_dot(name: &str) -> &str {
    name.strip_prefix('.').unwrap_or(name)
}

/// Any named type declared in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A message type
    Message(MessageDescriptor),
    /// An enum type
    Enum(EnumDescriptor),
    /// A service
    Service(ServiceDescriptor),
}

impl TypeDescriptor {
    /// Short name
    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Message(m) => m.name(),
            TypeDescriptor::Enum(e) => e.name(),
            TypeDescriptor::Service(s) => s.name(),
        }
    }

    /// Fully qualified name (`package.Outer.name`)
    pub fn full_name(&self) -> &str {
        match self {
            TypeDescriptor::Message(m) => m.full_name(),
            TypeDescriptor::Enum(e) => e.full_name(),
            TypeDescriptor::Service(s) => s.full_name(),
        }
    }

    /// Owning file
    pub fn file(&self) -> &FileDescriptor {
        match self {
            TypeDescriptor::Message(m) => m.file(),
            TypeDescriptor::Enum(e) => e.file(),
            TypeDescriptor::Service(s) => s.file(),
        }
    }

    /// Enclosing package
    pub fn package(&self) -> &str {
        self.file().package()
    }

    /// "message", "enum" or "service"
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Message(_) => "message",
            TypeDescriptor::Enum(_) => "enum",
            TypeDescriptor::Service(_) => "service",
        }
    }

    /// Returns the message descriptor if this is a message type
    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match self {
            TypeDescriptor::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the enum descriptor if this is an enum type
    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            TypeDescriptor::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// Descriptor of a message type
#[derive(Clone)]
pub struct MessageDescriptor {
    file: FileDescriptor,
    index: usize,
}

impl MessageDescriptor {
    fn inner(&self) -> &MessageInner {
        &self.file.inner.messages[self.index]
    }

    /// Short name
    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// Fully qualified name
    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Enclosing package
    pub fn package(&self) -> &str {
        self.file.package()
    }

    /// Owning file
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// The message this one is declared in, if nested
    pub fn containing_type(&self) -> Option<MessageDescriptor> {
        self.inner().parent.map(|index| self.file.message(index))
    }

    /// Number of fields
    pub fn num_fields(&self) -> usize {
        self.inner().fields.len()
    }

    /// Number of enums declared inside this message
    pub fn num_nested_enums(&self) -> usize {
        self.inner().nested_enums.len()
    }

    /// Field at `index` in declaration order
    pub fn field(&self, index: usize) -> Option<FieldDescriptor> {
        (index < self.num_fields()).then(|| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    /// Iterates over fields in declaration order
    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        (0..self.num_fields()).map(|index| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    /// Iterates over fields in ascending tag order
    pub fn fields_in_tag_order(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        self.inner().tag_order.iter().map(|&index| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    /// Find a field by its tag number
    pub fn find_field_by_tag(&self, tag: u32) -> Option<FieldDescriptor> {
        self.inner()
            .fields_by_tag
            .get(&tag)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    /// Find a field by name
    pub fn find_field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.inner()
            .fields_by_name
            .get(name)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    /// Find an enum declared inside this message by its short name
    pub fn find_nested_enum_type_by_name(&self, name: &str) -> Option<EnumDescriptor> {
        self.inner()
            .nested_enums
            .get(name)
            .map(|&index| EnumDescriptor {
                file: self.file.clone(),
                index,
            })
    }

    /// Iterates over messages declared directly inside this one
    pub fn nested_messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        self.inner()
            .nested_messages
            .iter()
            .map(|&index| self.file.message(index))
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn field_default(&self, field_index: usize) -> Option<&Value> {
        self.inner().fields[field_index].default.as_ref()
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.file == other.file
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.full_name())
            .finish()
    }
}

/// Descriptor of one field of a message
#[derive(Clone)]
pub struct FieldDescriptor {
    message: MessageDescriptor,
    index: usize,
}

impl FieldDescriptor {
    fn inner(&self) -> &FieldInner {
        &self.message.inner().fields[self.index]
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// Containing message's full name plus the field name
    ///
    /// Unique across the whole file, e.g. `school.Student.age`.
    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Singular or repeated
    pub fn label(&self) -> FieldLabel {
        self.inner().label
    }

    /// Declared type
    pub fn field_type(&self) -> FieldType {
        self.inner().field_type
    }

    /// Coarse kind of the declared type
    pub fn kind(&self) -> FieldKind {
        self.field_type().kind()
    }

    /// Tag number used as the wire key
    pub fn tag(&self) -> u32 {
        self.inner().tag
    }

    /// Wire type of each record this field produces
    pub fn wire_type(&self) -> WireType {
        self.field_type().wire_type()
    }

    /// Value read back for an unset singular field
    ///
    /// `None` for message-typed and repeated fields, which have no default.
    pub fn default_value(&self) -> Option<&Value> {
        self.inner().default.as_ref()
    }

    /// Returns true if the schema declared an explicit default
    pub fn has_default_value(&self) -> bool {
        self.inner().explicit_default
    }

    /// The message this field belongs to
    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Referenced type for enum and message fields
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        let file = self.message.file();
        self.inner().type_ref.map(|r| match r {
            TypeRef::Message(index) => TypeDescriptor::Message(file.message(index)),
            TypeRef::Enum(index) => TypeDescriptor::Enum(EnumDescriptor {
                file: file.clone(),
                index,
            }),
        })
    }

    /// Referenced message type for message fields
    pub fn message_type(&self) -> Option<MessageDescriptor> {
        match self.inner().type_ref {
            Some(TypeRef::Message(index)) => Some(self.message.file().message(index)),
            _ => None,
        }
    }

    /// Referenced enum type for enum fields
    pub fn enum_type(&self) -> Option<EnumDescriptor> {
        match self.inner().type_ref {
            Some(TypeRef::Enum(index)) => Some(EnumDescriptor {
                file: self.message.file().clone(),
                index,
            }),
            _ => None,
        }
    }

    // Classification. Enum fields count as primitive and numeric.

    /// Not message-typed
    pub fn is_primitive_type(&self) -> bool {
        !self.is_message_type()
    }

    /// Message-typed
    pub fn is_message_type(&self) -> bool {
        self.kind() == FieldKind::Message
    }

    /// Singular label
    pub fn is_singular_type(&self) -> bool {
        self.label() == FieldLabel::Singular
    }

    /// Repeated label
    pub fn is_repeated_type(&self) -> bool {
        self.label() == FieldLabel::Repeated
    }

    /// Singular numeric, bool or enum
    pub fn is_singular_numeric_type(&self) -> bool {
        self.is_singular_type() && self.is_numeric()
    }

    /// Singular string or bytes
    pub fn is_singular_string_type(&self) -> bool {
        self.is_singular_type() && self.kind() == FieldKind::String
    }

    /// Singular message
    pub fn is_singular_message_type(&self) -> bool {
        self.is_singular_type() && self.is_message_type()
    }

    /// Repeated numeric, bool or enum
    pub fn is_repeated_numeric_type(&self) -> bool {
        self.is_repeated_type() && self.is_numeric()
    }

    /// Repeated string or bytes
    pub fn is_repeated_string_type(&self) -> bool {
        self.is_repeated_type() && self.kind() == FieldKind::String
    }

    /// Repeated message
    pub fn is_repeated_message_type(&self) -> bool {
        self.is_repeated_type() && self.is_message_type()
    }

    fn is_numeric(&self) -> bool {
        matches!(self.kind(), FieldKind::Numeric | FieldKind::Enum)
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.message == other.message
    }
}

impl Eq for FieldDescriptor {}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.full_name())
            .field("tag", &self.tag())
            .field("label", &self.label())
            .field("type", &self.field_type())
            .finish()
    }
}

/// Descriptor of an enum type
#[derive(Clone)]
pub struct EnumDescriptor {
    file: FileDescriptor,
    index: usize,
}

impl EnumDescriptor {
    fn inner(&self) -> &EnumInner {
        &self.file.inner.enums[self.index]
    }

    /// Short name
    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// Fully qualified name
    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Enclosing package
    pub fn package(&self) -> &str {
        self.file.package()
    }

    /// Owning file
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// Returns true if declared inside a message
    pub fn is_nested(&self) -> bool {
        self.inner().parent.is_some()
    }

    /// The message this enum is declared in, if nested
    pub fn containing_type(&self) -> Option<MessageDescriptor> {
        self.inner().parent.map(|index| self.file.message(index))
    }

    /// Number of declared values
    pub fn number_of_values(&self) -> usize {
        self.inner().values.len()
    }

    /// Iterates over `(name, number)` pairs in declaration order
    pub fn values(&self) -> impl ExactSizeIterator<Item = (&str, i32)> + '_ {
        self.inner()
            .values
            .iter()
            .map(|(name, number)| (name.as_str(), *number))
    }

    /// Returns true if a value with this symbolic name exists
    pub fn contains_value(&self, name: &str) -> bool {
        self.inner().values_by_name.contains_key(name)
    }

    /// Symbolic name of the first value declared with `number`
    pub fn value_name(&self, number: i32) -> Option<&str> {
        self.inner()
            .values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| name.as_str())
    }

    /// Number of the value with this symbolic name
    pub fn value_number(&self, name: &str) -> Option<i32> {
        self.inner().value_number(name)
    }
}

impl EnumInner {
    fn value_number(&self, name: &str) -> Option<i32> {
        self.values_by_name
            .get(name)
            .map(|&index| self.values[index].1)
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.file == other.file
    }
}

impl Eq for EnumDescriptor {}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumDescriptor")
            .field(&self.full_name())
            .finish()
    }
}

/// Descriptor of a service
#[derive(Clone)]
pub struct ServiceDescriptor {
    file: FileDescriptor,
    index: usize,
}

impl ServiceDescriptor {
    fn inner(&self) -> &ServiceInner {
        &self.file.inner.services[self.index]
    }

    /// Short name
    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// Fully qualified name
    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Enclosing package
    pub fn package(&self) -> &str {
        self.file.package()
    }

    /// Owning file
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// Declared methods
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.inner().methods
    }

    /// Find a method by name
    pub fn find_method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods().iter().find(|m| m.name == name)
    }
}

impl PartialEq for ServiceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.file == other.file
    }
}

impl Eq for ServiceDescriptor {}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceDescriptor")
            .field(&self.full_name())
            .finish()
    }
}

/// One method of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    input_type: String,
    output_type: String,
}

impl MethodDescriptor {
    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request message type name as declared
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    /// Response message type name as declared
    pub fn output_type(&self) -> &str {
        &self.output_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn school() -> FileDescriptor {
        let mut sex = EnumBuilder::new("Sex");
        sex.add_value("MALE", 0).unwrap().add_value("FEMALE", 1).unwrap();

        let mut family = MessageBuilder::new("FamilyInfo");
        family
            .add_field(FieldBuilder::new("address", 1, FieldType::String))
            .unwrap()
            .add_field(FieldBuilder::new("numberdogs", 2, FieldType::Int32))
            .unwrap();

        let mut student = MessageBuilder::new("Student");
        student
            .add_enum(sex)
            .unwrap()
            .add_field(FieldBuilder::new("name", 1, FieldType::String))
            .unwrap()
            .add_field(FieldBuilder::new("age", 2, FieldType::Int32).default_value("18"))
            .unwrap()
            .add_field(FieldBuilder::enumeration("sex", 8, "Sex"))
            .unwrap()
            .add_field(FieldBuilder::message("family", 4, "FamilyInfo"))
            .unwrap()
            .add_field(FieldBuilder::new("alias", 3, FieldType::String).repeated())
            .unwrap();

        let mut file = FileDescriptorBuilder::new("school.proto", "HaiZhong");
        file.add_message(family).unwrap().add_message(student).unwrap();
        file.build().unwrap()
    }

    #[test]
    fn test_file_lookup() {
        let file = school();
        assert_eq!(file.path(), "school.proto");
        assert_eq!(file.num_messages(), 2);
        assert_eq!(file.num_enums(), 0);
        assert_eq!(file.num_nested_enums(), 1);

        let by_full = file.find_message_type_by_name("HaiZhong.Student").unwrap();
        let by_dot = file.find_message_type_by_name(".HaiZhong.Student").unwrap();
        let by_relative = file.find_message_type_by_name("Student").unwrap();
        assert_eq!(by_full, by_dot);
        assert_eq!(by_full, by_relative);
        assert!(file.find_message_type_by_name("Teacher").is_none());

        let sex = file.find_enum_type_by_name("HaiZhong.Student.Sex").unwrap();
        assert!(sex.is_nested());
        assert_eq!(sex.containing_type().unwrap(), by_full);
    }

    #[test]
    fn test_type_descriptor_variants() {
        let file = school();
        let ty = file.find_type_by_name("Student.Sex").unwrap();
        assert_eq!(ty.kind_name(), "enum");
        assert_eq!(ty.name(), "Sex");
        assert_eq!(ty.full_name(), "HaiZhong.Student.Sex");
        assert_eq!(ty.package(), "HaiZhong");
        assert!(ty.as_enum().is_some());
        assert!(ty.as_message().is_none());
    }

    #[test]
    fn test_field_lookup() {
        let file = school();
        let student = file.find_message_type_by_name("Student").unwrap();

        let age = student.find_field_by_tag(2).unwrap();
        assert_eq!(age.name(), "age");
        assert_eq!(age.full_name(), "HaiZhong.Student.age");
        assert_eq!(student.find_field_by_name("age").unwrap(), age);
        assert!(student.find_field_by_tag(99).is_none());
        assert!(student.find_field_by_name("height").is_none());

        let tags: Vec<u32> = student.fields_in_tag_order().map(|f| f.tag()).collect();
        assert_eq!(tags, vec![1, 2, 3, 4, 8]);
        let names: Vec<String> = student.fields().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["name", "age", "sex", "family", "alias"]);
    }

    #[test]
    fn test_field_references() {
        let file = school();
        let student = file.find_message_type_by_name("Student").unwrap();

        let family = student.find_field_by_name("family").unwrap();
        assert_eq!(family.message_type().unwrap().name(), "FamilyInfo");
        assert!(family.enum_type().is_none());
        assert!(family.default_value().is_none());

        let sex = student.find_field_by_name("sex").unwrap();
        let sex_enum = sex.enum_type().unwrap();
        assert_eq!(Some(sex_enum.clone()), student.find_nested_enum_type_by_name("Sex"));
        assert_eq!(sex.default_value(), Some(&Value::EnumNumber(0)));
        assert_eq!(sex_enum.value_name(1), Some("FEMALE"));
        assert_eq!(sex_enum.value_number("MALE"), Some(0));
        assert!(sex_enum.contains_value("FEMALE"));
        assert_eq!(sex_enum.number_of_values(), 2);
    }

    #[test]
    fn test_classification_is_exclusive() {
        let file = school();
        for message in file.messages() {
            for field in message.fields() {
                assert_ne!(field.is_primitive_type(), field.is_message_type());
                assert_ne!(field.is_singular_type(), field.is_repeated_type());

                let classes = [
                    field.is_singular_numeric_type(),
                    field.is_singular_string_type(),
                    field.is_singular_message_type(),
                    field.is_repeated_numeric_type(),
                    field.is_repeated_string_type(),
                    field.is_repeated_message_type(),
                ];
                assert_eq!(classes.iter().filter(|&&c| c).count(), 1, "{:?}", field);
            }
        }

        let student = file.find_message_type_by_name("Student").unwrap();
        assert!(student.find_field_by_name("sex").unwrap().is_singular_numeric_type());
        assert!(student.find_field_by_name("alias").unwrap().is_repeated_string_type());
        assert!(student.find_field_by_name("family").unwrap().is_singular_message_type());
    }

    #[test]
    fn test_defaults() {
        let file = school();
        let student = file.find_message_type_by_name("Student").unwrap();

        let age = student.find_field_by_name("age").unwrap();
        assert!(age.has_default_value());
        assert_eq!(age.default_value(), Some(&Value::I32(18)));

        let name = student.find_field_by_name("name").unwrap();
        assert!(!name.has_default_value());
        assert_eq!(name.default_value(), Some(&Value::String(String::new())));

        let alias = student.find_field_by_name("alias").unwrap();
        assert!(alias.default_value().is_none());
    }

    #[test]
    fn test_wire_types() {
        assert_eq!(FieldType::Double.wire_type(), WireType::I64);
        assert_eq!(FieldType::Float.wire_type(), WireType::I32);
        assert_eq!(FieldType::Sint64.wire_type(), WireType::Varint);
        assert_eq!(FieldType::Enum.wire_type(), WireType::Varint);
        assert_eq!(FieldType::Message.wire_type(), WireType::Len);
        assert_eq!(FieldType::Bytes.kind(), FieldKind::String);
    }

    #[test]
    fn test_descriptors_shared_across_threads() {
        let file = school();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let file = file.clone();
                std::thread::spawn(move || {
                    let student = file.find_message_type_by_name("Student").unwrap();
                    student.find_field_by_tag(2).unwrap().name().to_string()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "age");
        }
    }
}
