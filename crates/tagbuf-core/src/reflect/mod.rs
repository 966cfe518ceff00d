//! Descriptor-driven access to message fields.
//!
//! [`DynamicMessage`] is a message instance whose layout comes entirely from
//! a [`MessageDescriptor`]. Every accessor takes a [`FieldDescriptor`] (or a
//! field name) and checks it against the message, so generic code such as
//! the wire codec can read and write any message without compiled-in
//! accessors.
//!
//! ## Presence
//!
//! Each singular field carries a presence flag independent of its value:
//! setting a field to its default still makes it present, and clearing it
//! makes it absent again. Singular message fields are materialized lazily by
//! [`DynamicMessage::mutable_message`]; materializing alone does not make the
//! field present, but any write into the materialized sub-message does. The
//! field then stays present until it is cleared or released, even if the
//! write is later undone inside the sub-message.
//!
//! ```
//! use tagbuf_core::descriptor::{FieldBuilder, FieldType, FileDescriptorBuilder, MessageBuilder};
//! use tagbuf_core::DynamicMessage;
//!
//! let mut dog = MessageBuilder::new("DogInfo");
//! dog.add_field(FieldBuilder::new("age", 1, FieldType::Int32))?;
//! let mut file = FileDescriptorBuilder::new("dog.proto", "");
//! file.add_message(dog)?;
//! let file = file.build()?;
//!
//! let mut msg = DynamicMessage::new(file.find_message_type_by_name("DogInfo").unwrap());
//! assert!(!msg.has_by_name("age")?);
//! msg.set_by_name("age", 0)?;
//! assert!(msg.has_by_name("age")?);
//! # Ok::<(), tagbuf_core::Error>(())
//! ```

pub mod value;

pub use value::Value;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone)]
enum FieldStorage {
    /// `value` is `None` until set or materialized. For message fields a
    /// materialized default may sit in `value` with `present` still false.
    Singular { value: Option<Value>, present: bool },
    Repeated(Vec<Value>),
}

/// Borrowed contents of a field that contributes to the encoded form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValueRef<'a> {
    /// A present singular field
    Singular(&'a Value),
    /// A non-empty repeated field, in insertion order
    Repeated(&'a [Value]),
}

/// A message instance described at runtime by a [`MessageDescriptor`]
#[derive(Clone)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    fields: Vec<FieldStorage>,
    /// Set by every successful mutation; makes a materialized sub-message
    /// present in its parent.
    written: bool,
}

impl DynamicMessage {
    /// Creates an empty instance with every field absent
    pub fn new(desc: MessageDescriptor) -> Self {
        let fields = desc
            .fields()
            .map(|field| {
                if field.is_repeated_type() {
                    FieldStorage::Repeated(Vec::new())
                } else {
                    FieldStorage::Singular {
                        value: None,
                        present: false,
                    }
                }
            })
            .collect();

        Self {
            desc,
            fields,
            written: false,
        }
    }

    /// The message type of this instance
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.desc
    }

    /// Presence flag of a singular field
    pub fn has(&self, field: &FieldDescriptor) -> Result<bool> {
        match self.storage(field)? {
            FieldStorage::Singular { value, present } => {
                Ok(*present || value.as_ref().map_or(false, is_written_message))
            }
            FieldStorage::Repeated(_) => Err(Error::label_mismatch(field.full_name(), "singular")),
        }
    }

    /// Number of elements of a repeated field
    pub fn size(&self, field: &FieldDescriptor) -> Result<usize> {
        Ok(self.repeated(field)?.len())
    }

    /// Current value of a singular field, or its default when absent
    ///
    /// An absent message field reads as a fresh default instance of its type.
    pub fn get(&self, field: &FieldDescriptor) -> Result<Cow<'_, Value>> {
        match self.storage(field)? {
            FieldStorage::Singular {
                value: Some(value), ..
            } => Ok(Cow::Borrowed(value)),
            FieldStorage::Singular { value: None, .. } => self.default_for(field),
            FieldStorage::Repeated(_) => Err(Error::label_mismatch(field.full_name(), "singular")),
        }
    }

    /// Current value of a singular message field
    pub fn get_message(&self, field: &FieldDescriptor) -> Result<Cow<'_, DynamicMessage>> {
        match self.get(field)? {
            Cow::Borrowed(Value::Message(message)) => Ok(Cow::Borrowed(message)),
            Cow::Owned(Value::Message(message)) => Ok(Cow::Owned(message)),
            _ => Err(Error::label_mismatch(field.full_name(), "singular message")),
        }
    }

    /// Stores a value in a singular field and marks it present
    pub fn set(&mut self, field: &FieldDescriptor, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        check_value(field, &value)?;
        match self.storage_mut(field)? {
            FieldStorage::Singular {
                value: slot,
                present,
            } => {
                *slot = Some(value);
                *present = true;
                self.written = true;
                Ok(())
            }
            FieldStorage::Repeated(_) => Err(Error::label_mismatch(field.full_name(), "singular")),
        }
    }

    /// Moves `message` into a singular message field without copying it
    pub fn set_allocated(
        &mut self,
        field: &FieldDescriptor,
        message: DynamicMessage,
    ) -> Result<()> {
        self.set(field, Value::Message(message))
    }

    /// Transfers ownership of a singular message field to the caller
    ///
    /// Returns `None` if the field was not present. Either way the field is
    /// absent afterwards and the next read yields a fresh default instance.
    pub fn release(&mut self, field: &FieldDescriptor) -> Result<Option<DynamicMessage>> {
        if !field.is_singular_message_type() {
            return Err(Error::label_mismatch(field.full_name(), "singular message"));
        }
        let has = self.has(field)?;
        match self.storage_mut(field)? {
            FieldStorage::Singular { value, present } => {
                *present = false;
                let taken = value.take();
                self.written = true;
                match taken {
                    Some(Value::Message(message)) if has => Ok(Some(message)),
                    _ => Ok(None),
                }
            }
            FieldStorage::Repeated(_) => Ok(None),
        }
    }

    /// Resets a field: singular fields become absent, repeated fields empty
    pub fn clear(&mut self, field: &FieldDescriptor) -> Result<()> {
        match self.storage_mut(field)? {
            FieldStorage::Singular { value, present } => {
                *value = None;
                *present = false;
            }
            FieldStorage::Repeated(values) => values.clear(),
        }
        self.written = true;
        Ok(())
    }

    /// Resets every field
    pub fn clear_all(&mut self) {
        for storage in &mut self.fields {
            match storage {
                FieldStorage::Singular { value, present } => {
                    *value = None;
                    *present = false;
                }
                FieldStorage::Repeated(values) => values.clear(),
            }
        }
        self.written = true;
    }

    /// Writable handle to a singular message field
    ///
    /// Materializes a default instance if the field holds none. This does not
    /// mark the field present; writing into the returned message does.
    pub fn mutable_message(&mut self, field: &FieldDescriptor) -> Result<&mut DynamicMessage> {
        if !field.is_singular_message_type() {
            return Err(Error::label_mismatch(field.full_name(), "singular message"));
        }
        let message_type = message_type(field)?;
        match self.storage_mut(field)? {
            FieldStorage::Singular { value, .. } => {
                let value = value
                    .get_or_insert_with(|| Value::Message(DynamicMessage::new(message_type)));
                value
                    .as_message_mut()
                    .ok_or_else(|| Error::label_mismatch(field.full_name(), "singular message"))
            }
            FieldStorage::Repeated(_) => Err(Error::label_mismatch(field.full_name(), "singular")),
        }
    }

    /// Elements of a repeated field in insertion order
    pub fn get_repeated(&self, field: &FieldDescriptor) -> Result<&[Value]> {
        self.repeated(field)
    }

    /// Element `index` of a repeated field
    pub fn get_index(&self, field: &FieldDescriptor, index: usize) -> Result<&Value> {
        let values = self.repeated(field)?;
        values
            .get(index)
            .ok_or_else(|| out_of_bounds(field, index, values.len()))
    }

    /// Replaces element `index` of a repeated field
    pub fn set_index(
        &mut self,
        field: &FieldDescriptor,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<()> {
        let value = value.into();
        check_value(field, &value)?;
        let values = self.repeated_mut(field)?;
        let size = values.len();
        let slot = values
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(field, index, size))?;
        *slot = value;
        self.written = true;
        Ok(())
    }

    /// Writable handle to element `index` of a repeated message field
    pub fn mutable_index_message(
        &mut self,
        field: &FieldDescriptor,
        index: usize,
    ) -> Result<&mut DynamicMessage> {
        let values = self.repeated_mut(field)?;
        let size = values.len();
        values
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(field, index, size))?
            .as_message_mut()
            .ok_or_else(|| Error::label_mismatch(field.full_name(), "repeated message"))
    }

    /// Appends a value to a repeated field
    pub fn push(&mut self, field: &FieldDescriptor, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        check_value(field, &value)?;
        self.repeated_mut(field)?.push(value);
        self.written = true;
        Ok(())
    }

    /// Appends a default instance to a repeated message field and returns it
    pub fn add_message(&mut self, field: &FieldDescriptor) -> Result<&mut DynamicMessage> {
        if !field.is_repeated_message_type() {
            return Err(Error::label_mismatch(field.full_name(), "repeated message"));
        }
        let message_type = message_type(field)?;
        self.repeated_mut(field)?
            .push(Value::Message(DynamicMessage::new(message_type)));
        self.written = true;
        self.repeated_mut(field)?
            .last_mut()
            .and_then(Value::as_message_mut)
            .ok_or_else(|| Error::label_mismatch(field.full_name(), "repeated message"))
    }

    /// Returns true if any field is present or non-empty
    pub fn has_any_field(&self) -> bool {
        self.present_fields().next().is_some()
    }

    /// Iterates over fields that contribute to the encoded form, in tag order
    pub fn present_fields(
        &self,
    ) -> impl Iterator<Item = (FieldDescriptor, FieldValueRef<'_>)> + '_ {
        self.desc
            .fields_in_tag_order()
            .filter_map(move |field| match &self.fields[field.index()] {
                FieldStorage::Singular {
                    value: Some(value),
                    present,
                } if *present || is_written_message(value) => {
                    Some((field, FieldValueRef::Singular(value)))
                }
                FieldStorage::Repeated(values) if !values.is_empty() => {
                    Some((field, FieldValueRef::Repeated(values)))
                }
                _ => None,
            })
    }

    /// Looks up a field of this message by name
    pub fn field_by_name(&self, name: &str) -> Result<FieldDescriptor> {
        self.desc
            .find_field_by_name(name)
            .ok_or_else(|| Error::UnknownField {
                name: name.to_string(),
                message: self.desc.full_name().to_string(),
            })
    }

    /// [`has`](Self::has) by field name
    pub fn has_by_name(&self, name: &str) -> Result<bool> {
        self.has(&self.field_by_name(name)?)
    }

    /// [`get`](Self::get) by field name
    pub fn get_by_name(&self, name: &str) -> Result<Cow<'_, Value>> {
        let field = self.field_by_name(name)?;
        self.get(&field)
    }

    /// [`set`](Self::set) by field name
    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.field_by_name(name)?;
        self.set(&field, value)
    }

    /// [`clear`](Self::clear) by field name
    pub fn clear_by_name(&mut self, name: &str) -> Result<()> {
        let field = self.field_by_name(name)?;
        self.clear(&field)
    }

    pub(crate) fn mark_present(&mut self, field: &FieldDescriptor) -> Result<()> {
        if let FieldStorage::Singular { present, .. } = self.storage_mut(field)? {
            *present = true;
        }
        self.written = true;
        Ok(())
    }

    fn default_for(&self, field: &FieldDescriptor) -> Result<Cow<'_, Value>> {
        if field.is_message_type() {
            return Ok(Cow::Owned(Value::Message(DynamicMessage::new(
                message_type(field)?,
            ))));
        }
        match self.desc.field_default(field.index()) {
            Some(value) => Ok(Cow::Borrowed(value)),
            None => Value::zero(field.field_type())
                .map(Cow::Owned)
                .ok_or_else(|| Error::label_mismatch(field.full_name(), "scalar")),
        }
    }

    fn storage(&self, field: &FieldDescriptor) -> Result<&FieldStorage> {
        self.check_owner(field)?;
        Ok(&self.fields[field.index()])
    }

    fn storage_mut(&mut self, field: &FieldDescriptor) -> Result<&mut FieldStorage> {
        self.check_owner(field)?;
        Ok(&mut self.fields[field.index()])
    }

    fn repeated(&self, field: &FieldDescriptor) -> Result<&[Value]> {
        match self.storage(field)? {
            FieldStorage::Repeated(values) => Ok(values),
            FieldStorage::Singular { .. } => {
                Err(Error::label_mismatch(field.full_name(), "repeated"))
            }
        }
    }

    fn repeated_mut(&mut self, field: &FieldDescriptor) -> Result<&mut Vec<Value>> {
        match self.storage_mut(field)? {
            FieldStorage::Repeated(values) => Ok(values),
            FieldStorage::Singular { .. } => {
                Err(Error::label_mismatch(field.full_name(), "repeated"))
            }
        }
    }

    fn check_owner(&self, field: &FieldDescriptor) -> Result<()> {
        if field.containing_message() != &self.desc {
            return Err(Error::ForeignField {
                field: field.full_name().to_string(),
                message: self.desc.full_name().to_string(),
            });
        }
        Ok(())
    }
}

/// A materialized sub-message counts as present once it, or anything below
/// it, was written to.
fn is_written_message(value: &Value) -> bool {
    matches!(value, Value::Message(message) if message.written || message.has_any_field())
}

fn check_value(field: &FieldDescriptor, value: &Value) -> Result<()> {
    if value.is_valid_for_field(field) {
        return Ok(());
    }
    let expected = match field.message_type() {
        Some(message_type) => message_type.full_name().to_string(),
        None => field.field_type().to_string(),
    };
    Err(Error::TypeMismatch {
        field: field.full_name().to_string(),
        expected,
        actual: value.kind_name(),
    })
}

fn message_type(field: &FieldDescriptor) -> Result<MessageDescriptor> {
    field.message_type().ok_or_else(|| Error::UnresolvedType {
        field: field.full_name().to_string(),
        type_name: String::new(),
        expected: "message",
    })
}

fn out_of_bounds(field: &FieldDescriptor, index: usize, size: usize) -> Error {
    Error::IndexOutOfBounds {
        field: field.full_name().to_string(),
        index,
        size,
    }
}

impl PartialEq for DynamicMessage {
    /// Field-by-field comparison of presence and values
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.present_fields().eq(other.present_fields())
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (field, value) in self.present_fields() {
            match value {
                FieldValueRef::Singular(value) => map.entry(&field.name(), value),
                FieldValueRef::Repeated(values) => map.entry(&field.name(), &values),
            };
        }
        map.finish()
    }
}
