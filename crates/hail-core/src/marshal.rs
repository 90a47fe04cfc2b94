//! Marshalling: the bridge between typed messages and wire payloads.

use bytes::{Bytes, BytesMut};

use crate::codec::{select_codec, Codec};
use crate::error::{DecodeError, EncodeError};
use crate::frame::PayloadChunks;
use crate::message::Message;

/// Serialize half of a [`Marshaller`].
pub type SerializeFn<T> = fn(&T, &mut SerializationContext) -> Result<(), EncodeError>;
/// Deserialize half of a [`Marshaller`].
pub type DeserializeFn<T> = fn(&mut DeserializationContext<'_>) -> Result<T, DecodeError>;

/// The encode/decode pair bound to one message type.
///
/// Constructed once per type, immutable, shared by every call that uses
/// the type. The usual constructor is [`for_message`](Self::for_message),
/// which dispatches on the cached codec selection; [`from_fns`]
/// (Self::from_fns) exists for types marshalled by hand.
pub struct Marshaller<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

impl<T> Clone for Marshaller<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Marshaller<T> {}

impl<T> Marshaller<T> {
    pub const fn from_fns(serialize: SerializeFn<T>, deserialize: DeserializeFn<T>) -> Self {
        Marshaller {
            serialize,
            deserialize,
        }
    }

    pub fn serialize(&self, value: &T, ctx: &mut SerializationContext) -> Result<(), EncodeError> {
        (self.serialize)(value, ctx)
    }

    pub fn deserialize(&self, ctx: &mut DeserializationContext<'_>) -> Result<T, DecodeError> {
        (self.deserialize)(ctx)
    }
}

impl<T: Message> Marshaller<T> {
    /// The marshaller for a [`Message`] type, dispatching per the codec
    /// selected for `T`.
    pub const fn for_message() -> Self {
        Marshaller {
            serialize: serialize_message::<T>,
            deserialize: deserialize_message::<T>,
        }
    }
}

fn serialize_message<T: Message>(
    value: &T,
    ctx: &mut SerializationContext,
) -> Result<(), EncodeError> {
    match select_codec::<T>() {
        Codec::Buffered => {
            ctx.set_payload_length(value.encoded_len()?);
            value.encode_into(ctx.buffer_writer())?;
            ctx.complete();
            Ok(())
        }
        Codec::Contiguous => {
            let bytes = value.encode_to_vec()?;
            ctx.complete_with(bytes);
            Ok(())
        }
    }
}

fn deserialize_message<T: Message>(
    ctx: &mut DeserializationContext<'_>,
) -> Result<T, DecodeError> {
    match select_codec::<T>() {
        Codec::Buffered => T::decode_chunks(ctx.payload_chunks()),
        Codec::Contiguous => T::decode(&ctx.payload_to_vec()),
    }
}

/// Outgoing payload assembly.
///
/// Both wire paths go through this context so the transport only ever sees
/// an explicitly completed payload: the buffered path declares the length,
/// streams into [`buffer_writer`](Self::buffer_writer), then calls
/// [`complete`](Self::complete); the contiguous path hands over the whole
/// array via [`complete_with`](Self::complete_with). Call exactly one
/// completion method, exactly once.
#[derive(Debug, Default)]
pub struct SerializationContext {
    declared: Option<usize>,
    buf: BytesMut,
    payload: Option<Bytes>,
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the payload length up front (buffered path).
    pub fn set_payload_length(&mut self, len: usize) {
        self.declared = Some(len);
        self.buf.reserve(len);
    }

    /// The growable buffer the message streams itself into.
    pub fn buffer_writer(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Signal that the streamed payload is complete.
    pub fn complete(&mut self) {
        self.payload = Some(self.buf.split().freeze());
    }

    /// Hand over a fully materialized payload (contiguous path).
    pub fn complete_with(&mut self, bytes: Vec<u8>) {
        self.payload = Some(Bytes::from(bytes));
    }

    /// The completed payload.
    ///
    /// Fails with [`EncodeError::Incomplete`] if completion was never
    /// signalled, or [`EncodeError::LengthMismatch`] if the written length
    /// contradicts a declared length.
    pub fn into_payload(self) -> Result<Bytes, EncodeError> {
        let payload = self.payload.ok_or(EncodeError::Incomplete)?;
        if let Some(declared) = self.declared {
            if declared != payload.len() {
                return Err(EncodeError::LengthMismatch {
                    declared,
                    actual: payload.len(),
                });
            }
        }
        Ok(payload)
    }
}

/// Incoming payload access for the deserialize half.
#[derive(Debug)]
pub struct DeserializationContext<'a> {
    payload: &'a PayloadChunks,
}

impl<'a> DeserializationContext<'a> {
    pub fn new(payload: &'a PayloadChunks) -> Self {
        DeserializationContext { payload }
    }

    /// The received payload as its segment sequence (buffered path).
    pub fn payload_chunks(&self) -> &'a PayloadChunks {
        self.payload
    }

    /// The received payload gathered into one fresh buffer (contiguous
    /// path).
    pub fn payload_to_vec(&self) -> Vec<u8> {
        self.payload.to_vec()
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
