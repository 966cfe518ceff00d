//! Creating message instances by type name.
//!
//! A [`MessageFactory`] is bound to one [`FileDescriptor`] and keeps an
//! empty prototype per message type, so tooling that only knows a type name
//! at runtime can create and decode instances.

use crate::codec::{Decoder, DecoderConfig};
use crate::descriptor::{FileDescriptor, MessageDescriptor};
use crate::error::{Error, Result};
use crate::reflect::DynamicMessage;
use tracing::debug;

/// Creates empty messages for the types declared in one file
#[derive(Debug, Clone)]
pub struct MessageFactory {
    file: FileDescriptor,
    prototypes: Vec<DynamicMessage>,
    decoder: Decoder,
}

impl MessageFactory {
    /// Creates a factory with a prototype for every message in `file`
    pub fn new(file: FileDescriptor) -> Self {
        let prototypes: Vec<_> = file.messages().map(DynamicMessage::new).collect();
        debug!(
            "Created message factory for {} with {} prototypes",
            file.path(),
            prototypes.len()
        );
        Self {
            file,
            prototypes,
            decoder: Decoder::new(),
        }
    }

    /// Sets the decoder configuration used by [`decode`](Self::decode)
    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder = Decoder::with_config(config);
        self
    }

    /// The file this factory creates messages for
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// Empty prototype of a message type, if the file declares it
    pub fn prototype(&self, name: &str) -> Option<&DynamicMessage> {
        let desc = self.file.find_message_type_by_name(name)?;
        self.prototypes.get(desc.index())
    }

    /// New empty instance of the named message type
    ///
    /// Accepts the same name forms as
    /// [`FileDescriptor::find_message_type_by_name`].
    pub fn create(&self, name: &str) -> Option<DynamicMessage> {
        self.prototype(name).cloned()
    }

    /// New empty instance of `desc`, which must belong to this factory's file
    pub fn create_for(&self, desc: &MessageDescriptor) -> Option<DynamicMessage> {
        self.prototypes
            .get(desc.index())
            .filter(|prototype| prototype.descriptor() == desc)
            .cloned()
    }

    /// Creates an instance of the named type and decodes `data` into it
    pub fn decode(&self, name: &str, data: &[u8]) -> Result<DynamicMessage> {
        let mut message = self
            .create(name)
            .ok_or_else(|| Error::UnknownMessageType(name.to_string()))?;
        self.decoder.decode(data, &mut message)?;
        Ok(message)
    }
}
