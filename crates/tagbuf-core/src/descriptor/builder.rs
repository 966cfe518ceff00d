//! Construction API for descriptors.
//!
//! Builders are mutable and only exist before a [`FileDescriptor`] is frozen.
//! Duplicate names and tags are rejected at the point they are added, and the
//! first definition is kept. [`FileDescriptorBuilder::build`] then runs a
//! second pass that resolves message/enum references by scoped name lookup
//! and parses default values against the resolved types.

use super::{
    EnumInner, FieldInner, FieldLabel, FieldType, FileDescriptor, FileInner, MessageInner,
    MethodDescriptor, ServiceInner, TypeRef,
};
use crate::error::{Error, Result};
use crate::reflect::Value;
use crate::MAX_FIELD_NUMBER;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Definition of one field, added to a [`MessageBuilder`]
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    tag: u32,
    label: FieldLabel,
    field_type: FieldType,
    type_name: Option<String>,
    default_value: Option<String>,
}

impl FieldBuilder {
    /// Creates a singular field of a scalar type
    pub fn new(name: impl Into<String>, tag: u32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            tag,
            label: FieldLabel::Singular,
            field_type,
            type_name: None,
            default_value: None,
        }
    }

    /// Creates a singular field referencing a message type
    pub fn message(name: impl Into<String>, tag: u32, type_name: impl Into<String>) -> Self {
        Self::new(name, tag, FieldType::Message).type_name(type_name)
    }

    /// Creates a singular field referencing an enum type
    pub fn enumeration(name: impl Into<String>, tag: u32, type_name: impl Into<String>) -> Self {
        Self::new(name, tag, FieldType::Enum).type_name(type_name)
    }

    /// Marks the field as repeated
    pub fn repeated(self) -> Self {
        self.label(FieldLabel::Repeated)
    }

    /// Sets the field label
    pub fn label(mut self, label: FieldLabel) -> Self {
        self.label = label;
        self
    }

    /// Sets the referenced message or enum type name
    ///
    /// Relative names are resolved from the containing message outward.
    /// A leading `.` makes the name fully qualified.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Sets the default value as schema text
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Definition of an enum
#[derive(Debug, Clone)]
pub struct EnumBuilder {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumBuilder {
    /// Creates an enum with no values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Adds a value, rejecting a duplicate symbolic name
    ///
    /// Several names may share one number.
    pub fn add_value(&mut self, name: impl Into<String>, number: i32) -> Result<&mut Self> {
        let name = name.into();
        if self.values.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::DuplicateEnumValue {
                name,
                enum_name: self.name.clone(),
            });
        }
        self.values.push((name, number));
        Ok(self)
    }
}

/// Definition of a message type
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    name: String,
    fields: Vec<FieldBuilder>,
    enums: Vec<EnumBuilder>,
    messages: Vec<MessageBuilder>,
}

impl MessageBuilder {
    /// Creates a message with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            enums: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Adds a field, rejecting an out-of-range tag, a duplicate name or a duplicate tag
    pub fn add_field(&mut self, field: FieldBuilder) -> Result<&mut Self> {
        if field.tag == 0 || field.tag > MAX_FIELD_NUMBER {
            return Err(Error::InvalidFieldNumber {
                field: field.name,
                number: field.tag,
                max: MAX_FIELD_NUMBER,
            });
        }

        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(Error::duplicate_field(field.name, &self.name));
        }

        if let Some(existing) = self.fields.iter().find(|f| f.tag == field.tag) {
            return Err(Error::DuplicateTag {
                tag: field.tag,
                name: field.name,
                existing: existing.name.clone(),
                message: self.name.clone(),
            });
        }

        self.fields.push(field);
        Ok(self)
    }

    /// Adds an enum declared inside this message
    pub fn add_enum(&mut self, enum_type: EnumBuilder) -> Result<&mut Self> {
        self.check_type_name(&enum_type.name)?;
        self.enums.push(enum_type);
        Ok(self)
    }

    /// Adds a message declared inside this message
    pub fn add_message(&mut self, message: MessageBuilder) -> Result<&mut Self> {
        self.check_type_name(&message.name)?;
        self.messages.push(message);
        Ok(self)
    }

    fn check_type_name(&self, name: &str) -> Result<()> {
        let taken = self.enums.iter().any(|e| e.name == name)
            || self.messages.iter().any(|m| m.name == name);
        if taken {
            return Err(Error::duplicate_type(name, &self.name));
        }
        Ok(())
    }
}

/// Definition of a service
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    name: String,
    methods: Vec<MethodDescriptor>,
}

impl ServiceBuilder {
    /// Creates a service with no methods
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Adds a method, rejecting a duplicate name
    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if self.methods.iter().any(|m| m.name == name) {
            return Err(Error::DuplicateMethod {
                name,
                service: self.name.clone(),
            });
        }
        self.methods.push(MethodDescriptor {
            name,
            input_type: input_type.into(),
            output_type: output_type.into(),
        });
        Ok(self)
    }
}

/// Builder for a [`FileDescriptor`]
#[derive(Debug, Clone)]
pub struct FileDescriptorBuilder {
    path: String,
    package: String,
    messages: Vec<MessageBuilder>,
    enums: Vec<EnumBuilder>,
    services: Vec<ServiceBuilder>,
}

impl FileDescriptorBuilder {
    /// Creates a builder for the file at `path` declaring `package`
    pub fn new(path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            messages: Vec::new(),
            enums: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Adds a top-level message
    pub fn add_message(&mut self, message: MessageBuilder) -> Result<&mut Self> {
        self.check_type_name(&message.name)?;
        self.messages.push(message);
        Ok(self)
    }

    /// Adds a top-level enum
    pub fn add_enum(&mut self, enum_type: EnumBuilder) -> Result<&mut Self> {
        self.check_type_name(&enum_type.name)?;
        self.enums.push(enum_type);
        Ok(self)
    }

    /// Adds a service
    pub fn add_service(&mut self, service: ServiceBuilder) -> Result<&mut Self> {
        self.check_type_name(&service.name)?;
        self.services.push(service);
        Ok(self)
    }

    fn check_type_name(&self, name: &str) -> Result<()> {
        let taken = self.messages.iter().any(|m| m.name == name)
            || self.enums.iter().any(|e| e.name == name)
            || self.services.iter().any(|s| s.name == name);
        if taken {
            return Err(Error::duplicate_type(name, &self.package));
        }
        Ok(())
    }

    /// Freezes the definitions into an immutable [`FileDescriptor`]
    ///
    /// Fails if a field references a type that cannot be resolved within the
    /// file, or if a default value does not parse for its field.
    pub fn build(self) -> Result<FileDescriptor> {
        let mut layout = Layout::new(self.package.clone());

        for enum_type in self.enums {
            layout.add_enum(enum_type, None, &self.package)?;
        }
        for message in self.messages {
            layout.add_message(message, None, &self.package)?;
        }

        let mut services = Vec::with_capacity(self.services.len());
        let mut service_index = HashMap::new();
        for (index, service) in self.services.into_iter().enumerate() {
            let full_name = qualify(&self.package, &service.name);
            index_name(&self.package, &mut service_index, &full_name, index);
            services.push(ServiceInner {
                name: service.name,
                full_name,
                methods: service.methods,
            });
        }

        let messages = layout.resolve_fields()?;

        debug!(
            "Built descriptor for {}: {} messages, {} enums, {} services",
            self.path,
            messages.len(),
            layout.enums.len(),
            services.len()
        );

        Ok(FileDescriptor {
            inner: Arc::new(FileInner {
                path: self.path,
                package: self.package,
                messages,
                enums: layout.enums,
                services,
                message_index: layout.message_index,
                enum_index: layout.enum_index,
                service_index,
            }),
        })
    }
}

/// First-pass state: every type has an index, fields are not yet resolved.
struct Layout {
    package: String,
    messages: Vec<MessageInner>,
    pending: Vec<Vec<FieldBuilder>>,
    enums: Vec<EnumInner>,
    /// Full names only; the indices below also hold package-relative aliases.
    full_names: HashSet<String>,
    message_index: HashMap<String, usize>,
    enum_index: HashMap<String, usize>,
}

impl Layout {
    fn new(package: String) -> Self {
        Self {
            package,
            messages: Vec::new(),
            pending: Vec::new(),
            enums: Vec::new(),
            full_names: HashSet::new(),
            message_index: HashMap::new(),
            enum_index: HashMap::new(),
        }
    }

    fn add_enum(
        &mut self,
        builder: EnumBuilder,
        parent: Option<usize>,
        scope: &str,
    ) -> Result<usize> {
        let index = self.enums.len();
        let full_name = qualify(scope, &builder.name);
        self.check_unique(&full_name, scope)?;
        index_name(&self.package, &mut self.enum_index, &full_name, index);

        let values_by_name = builder
            .values
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();

        self.enums.push(EnumInner {
            name: builder.name,
            full_name,
            parent,
            values: builder.values,
            values_by_name,
        });
        Ok(index)
    }

    fn add_message(
        &mut self,
        builder: MessageBuilder,
        parent: Option<usize>,
        scope: &str,
    ) -> Result<usize> {
        let index = self.messages.len();
        let full_name = qualify(scope, &builder.name);
        self.check_unique(&full_name, scope)?;
        index_name(&self.package, &mut self.message_index, &full_name, index);

        self.messages.push(MessageInner {
            name: builder.name,
            full_name: full_name.clone(),
            parent,
            fields: Vec::new(),
            tag_order: Vec::new(),
            fields_by_tag: HashMap::new(),
            fields_by_name: HashMap::new(),
            nested_enums: HashMap::new(),
            nested_messages: Vec::new(),
        });
        self.pending.push(builder.fields);

        for enum_type in builder.enums {
            let name = enum_type.name.clone();
            let enum_index = self.add_enum(enum_type, Some(index), &full_name)?;
            self.messages[index].nested_enums.insert(name, enum_index);
        }
        for nested in builder.messages {
            let nested_index = self.add_message(nested, Some(index), &full_name)?;
            self.messages[index].nested_messages.push(nested_index);
        }

        Ok(index)
    }

    fn check_unique(&mut self, full_name: &str, scope: &str) -> Result<()> {
        if !self.full_names.insert(full_name.to_string()) {
            let name = full_name.rsplit('.').next().unwrap_or(full_name);
            return Err(Error::duplicate_type(name, scope));
        }
        Ok(())
    }

    /// Second pass: resolve references, parse defaults, build field indices.
    fn resolve_fields(&mut self) -> Result<Vec<MessageInner>> {
        let pending = std::mem::take(&mut self.pending);
        let mut messages = std::mem::take(&mut self.messages);

        for (message, fields) in messages.iter_mut().zip(pending) {
            for field in fields {
                let index = message.fields.len();
                let inner = self.resolve_field(&message.full_name, field)?;
                message.fields_by_tag.insert(inner.tag, index);
                message.fields_by_name.insert(inner.name.clone(), index);
                message.fields.push(inner);
            }

            let mut tag_order: Vec<usize> = (0..message.fields.len()).collect();
            tag_order.sort_by_key(|&i| message.fields[i].tag);
            message.tag_order = tag_order;
        }

        Ok(messages)
    }

    fn resolve_field(&self, scope: &str, field: FieldBuilder) -> Result<FieldInner> {
        let full_name = format!("{}.{}", scope, field.name);

        let type_ref = match field.field_type {
            FieldType::Message => Some(TypeRef::Message(self.resolve(
                &self.message_index,
                scope,
                &field,
                "message",
            )?)),
            FieldType::Enum => Some(TypeRef::Enum(self.resolve(
                &self.enum_index,
                scope,
                &field,
                "enum",
            )?)),
            _ => None,
        };

        let enum_inner = match type_ref {
            Some(TypeRef::Enum(index)) => Some(&self.enums[index]),
            _ => None,
        };

        let has_no_default =
            field.label == FieldLabel::Repeated || field.field_type == FieldType::Message;

        let default = match (&field.default_value, has_no_default) {
            (Some(text), true) => {
                return Err(Error::invalid_default(
                    &full_name,
                    text,
                    format!(
                        "{} {} fields cannot have a default value",
                        field.label.as_str(),
                        field.field_type
                    ),
                ));
            }
            (None, true) => None,
            (Some(text), false) => Some(parse_default(
                &full_name,
                field.field_type,
                text,
                enum_inner,
            )?),
            (None, false) => Value::zero(field.field_type).map(|zero| match enum_inner {
                // Without an explicit default an enum reads back as its first value.
                Some(e) => e
                    .values
                    .first()
                    .map_or(zero, |(_, n)| Value::EnumNumber(*n)),
                None => zero,
            }),
        };

        trace!("Resolved field {} = {}", full_name, field.tag);

        Ok(FieldInner {
            name: field.name,
            full_name,
            label: field.label,
            field_type: field.field_type,
            tag: field.tag,
            explicit_default: field.default_value.is_some(),
            default,
            type_ref,
        })
    }

    /// Scoped lookup: innermost enclosing scope first, then outward.
    fn resolve(
        &self,
        index: &HashMap<String, usize>,
        scope: &str,
        field: &FieldBuilder,
        expected: &'static str,
    ) -> Result<usize> {
        let unresolved = || Error::UnresolvedType {
            field: qualify(scope, &field.name),
            type_name: field.type_name.clone().unwrap_or_default(),
            expected,
        };

        let type_name = field.type_name.as_deref().ok_or_else(unresolved)?;
        if let Some(absolute) = type_name.strip_prefix('.') {
            return index.get(absolute).copied().ok_or_else(unresolved);
        }

        let mut scope = scope;
        loop {
            let candidate = qualify(scope, type_name);
            if let Some(&found) = index.get(&candidate) {
                return Ok(found);
            }
            if scope.is_empty() {
                return Err(unresolved());
            }
            scope = scope.rfind('.').map_or("", |pos| &scope[..pos]);
        }
    }
}

/// Registers `full_name` and, inside a package, its package-relative form.
///
/// Full names win over relative names that happen to collide with them.
fn index_name(package: &str, index: &mut HashMap<String, usize>, full_name: &str, value: usize) {
    index.insert(full_name.to_string(), value);
    if !package.is_empty() {
        let relative = &full_name[package.len() + 1..];
        index.entry(relative.to_string()).or_insert(value);
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

fn parse_default(
    field: &str,
    field_type: FieldType,
    text: &str,
    enum_inner: Option<&EnumInner>,
) -> Result<Value> {
    let invalid = |reason: String| Error::invalid_default(field, text, reason);

    let value = match field_type {
        FieldType::Double => Value::F64(text.parse().map_err(|e| invalid(format!("{}", e)))?),
        FieldType::Float => Value::F32(text.parse().map_err(|e| invalid(format!("{}", e)))?),
        FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => {
            Value::I32(text.parse().map_err(|e| invalid(format!("{}", e)))?)
        }
        FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => {
            Value::I64(text.parse().map_err(|e| invalid(format!("{}", e)))?)
        }
        FieldType::Uint32 | FieldType::Fixed32 => {
            Value::U32(text.parse().map_err(|e| invalid(format!("{}", e)))?)
        }
        FieldType::Uint64 | FieldType::Fixed64 => {
            Value::U64(text.parse().map_err(|e| invalid(format!("{}", e)))?)
        }
        FieldType::Bool => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(invalid("expected 'true' or 'false'".to_string())),
        },
        FieldType::String => Value::String(text.to_string()),
        FieldType::Bytes => Value::Bytes(Bytes::copy_from_slice(text.as_bytes())),
        FieldType::Enum => {
            let enum_inner =
                enum_inner.ok_or_else(|| invalid("enum type is unresolved".to_string()))?;
            let number = enum_inner
                .value_number(text)
                .ok_or_else(|| invalid(format!("not a value of enum '{}'", enum_inner.full_name)))?;
            Value::EnumNumber(number)
        }
        FieldType::Message => {
            return Err(invalid("message fields cannot have a default value".to_string()))
        }
    };

    Ok(value)
}
