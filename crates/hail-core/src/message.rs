//! The contract supplied by the message-definition layer.

use bytes::BytesMut;

use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError};
use crate::frame::PayloadChunks;

/// An opaque, serializable wire message.
///
/// The invocation layer never inspects message contents; it only needs a
/// deterministic encode/decode pair. `encode_to_vec` and `decode` must be
/// inverses over the full value space.
///
/// Types whose representation supports zero-copy, length-prefixed streaming
/// report [`Codec::Buffered`] from [`capability`](Self::capability) and
/// override `encoded_len`, `encode_into`, and `decode_chunks` together.
/// The defaults delegate to the contiguous pair, so both wire paths decode
/// to the same value for the same bytes regardless of which hooks a type
/// overrides.
pub trait Message: Sized + Send + 'static {
    /// Serialize the whole message into one contiguous buffer.
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError>;

    /// Parse the message from one contiguous buffer.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Which wire path this type supports. Consulted once per type and
    /// cached by [`select_codec`](crate::codec::select_codec).
    fn capability() -> Codec {
        Codec::Contiguous
    }

    /// Exact encoded length, declared up front on the buffered path.
    ///
    /// Only consulted when [`capability`](Self::capability) reports
    /// [`Codec::Buffered`].
    fn encoded_len(&self) -> Result<usize, EncodeError> {
        Ok(self.encode_to_vec()?.len())
    }

    /// Stream the encoding directly into a caller-supplied buffer.
    ///
    /// Only consulted when [`capability`](Self::capability) reports
    /// [`Codec::Buffered`].
    fn encode_into(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.encode_to_vec()?);
        Ok(())
    }

    /// Parse directly from a possibly non-contiguous received payload.
    ///
    /// Only consulted when [`capability`](Self::capability) reports
    /// [`Codec::Buffered`].
    fn decode_chunks(payload: &PayloadChunks) -> Result<Self, DecodeError> {
        Self::decode(&payload.to_vec())
    }
}
