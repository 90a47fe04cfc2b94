//! Wire frames exchanged with the transport collaborator.

use std::time::Duration;

use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::error::ErrorCode;
use crate::metadata::Metadata;

bitflags! {
    /// Flags carried in each call descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u32 {
        /// Outgoing request.
        const REQUEST  = 0b0001;
        /// Response to a request.
        const RESPONSE = 0b0010;
        /// Response carrying a remote-reported failure.
        const ERROR    = 0b0100;
        /// Best-effort notification that the caller abandoned the call.
        const CANCEL   = 0b1000;
    }
}

/// Descriptor for one frame.
///
/// Request frames carry headers in `metadata`; response frames carry
/// trailing metadata there. `method` is the wire identity
/// `"{service}/{name}"` exactly as declared.
#[derive(Debug, Clone)]
pub struct CallDesc {
    /// Unique per channel, allocated by the caller side.
    pub call_id: u64,
    pub method: String,
    /// Per-call host override, passed through untouched.
    pub host: Option<String>,
    pub flags: FrameFlags,
    /// Remaining call lifetime at send time, if a deadline was set.
    pub timeout: Option<Duration>,
    pub metadata: Metadata,
}

/// One frame: descriptor plus payload.
#[derive(Debug, Clone)]
pub struct Frame {
    pub desc: CallDesc,
    pub payload: PayloadChunks,
}

impl Frame {
    /// Build a request frame.
    pub fn request(
        call_id: u64,
        method: String,
        host: Option<String>,
        metadata: Metadata,
        timeout: Option<Duration>,
        payload: Bytes,
    ) -> Self {
        Frame {
            desc: CallDesc {
                call_id,
                method,
                host,
                flags: FrameFlags::REQUEST,
                timeout,
                metadata,
            },
            payload: PayloadChunks::from_bytes(payload),
        }
    }

    /// Build a successful response frame. `trailers` become the response's
    /// trailing metadata.
    pub fn response(call_id: u64, method: String, trailers: Metadata, payload: Bytes) -> Self {
        Frame {
            desc: CallDesc {
                call_id,
                method,
                host: None,
                flags: FrameFlags::RESPONSE,
                timeout: None,
                metadata: trailers,
            },
            payload: PayloadChunks::from_bytes(payload),
        }
    }

    /// Build an error response frame carrying a remote-reported status.
    pub fn error(
        call_id: u64,
        method: String,
        code: ErrorCode,
        message: &str,
        trailers: Metadata,
    ) -> Self {
        Frame {
            desc: CallDesc {
                call_id,
                method,
                host: None,
                flags: FrameFlags::RESPONSE | FrameFlags::ERROR,
                timeout: None,
                metadata: trailers,
            },
            payload: PayloadChunks::from_vec(encode_status(code, message)),
        }
    }

    /// Build a cancel notification frame.
    pub fn cancel(call_id: u64, method: String) -> Self {
        Frame {
            desc: CallDesc {
                call_id,
                method,
                host: None,
                flags: FrameFlags::CANCEL,
                timeout: None,
                metadata: Metadata::new(),
            },
            payload: PayloadChunks::empty(),
        }
    }
}

/// Encode a status payload: `u32-le code + u32-le message-len + message`.
pub fn encode_status(code: ErrorCode, message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + message.len());
    bytes.extend_from_slice(&code.as_u32().to_le_bytes());
    bytes.extend_from_slice(&(message.len() as u32).to_le_bytes());
    bytes.extend_from_slice(message.as_bytes());
    bytes
}

/// Parse a status payload. Lenient: anything malformed degrades to
/// `Internal` rather than failing the parse itself.
pub fn parse_status(payload: &[u8]) -> (ErrorCode, String) {
    if payload.len() < 8 {
        return (ErrorCode::Internal, "malformed error response".into());
    }
    let code = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let message_len = u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]) as usize;
    if payload.len() < 8 + message_len {
        return (ErrorCode::Internal, "malformed error response".into());
    }
    let code = ErrorCode::from_u32(code).unwrap_or(ErrorCode::Internal);
    let message = String::from_utf8_lossy(&payload[8..8 + message_len]).into_owned();
    (code, message)
}

/// A received payload as an ordered sequence of byte segments.
///
/// Transports may deliver a payload in one piece or several; this view
/// lets buffered-capable message types parse without a gather copy, while
/// [`to_vec`](Self::to_vec) serves the contiguous path.
#[derive(Debug, Clone, Default)]
pub struct PayloadChunks {
    chunks: Vec<Bytes>,
    len: usize,
}

impl PayloadChunks {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::from_bytes(Bytes::from(bytes))
    }

    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let len = bytes.len();
        PayloadChunks {
            chunks: vec![bytes],
            len,
        }
    }

    /// Assemble from segments. Empty segments are dropped so readers never
    /// observe spurious zero-length chunks.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let chunks: Vec<Bytes> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        let len = chunks.iter().map(Bytes::len).sum();
        PayloadChunks { chunks, len }
    }

    /// Total payload length across all segments.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The underlying segments, in order.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Borrow the payload as one slice if it happens to be contiguous.
    pub fn as_contiguous(&self) -> Option<&[u8]> {
        match self.chunks.as_slice() {
            [] => Some(&[]),
            [single] => Some(single),
            _ => None,
        }
    }

    /// Gather-copy the payload into one fresh buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// A [`Buf`] cursor over the segments for direct streaming reads.
    pub fn reader(&self) -> ChunksReader<'_> {
        ChunksReader {
            chunks: &self.chunks,
            index: 0,
            offset: 0,
            remaining: self.len,
        }
    }
}

/// Cursor over a [`PayloadChunks`], implementing [`Buf`].
#[derive(Debug)]
pub struct ChunksReader<'a> {
    chunks: &'a [Bytes],
    index: usize,
    offset: usize,
    remaining: usize,
}

impl Buf for ChunksReader<'_> {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.chunks.get(self.index) {
            Some(chunk) => &chunk[self.offset..],
            None => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.remaining, "advance past end of payload");
        self.remaining -= cnt;
        while cnt > 0 {
            let left = self.chunks[self.index].len() - self.offset;
            if cnt < left {
                self.offset += cnt;
                return;
            }
            cnt -= left;
            self.index += 1;
            self.offset = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_roundtrip() {
        let payload = encode_status(ErrorCode::NotFound, "no such recipe");
        let (code, message) = parse_status(&payload);
        assert_eq!(code, ErrorCode::NotFound);
        assert_eq!(message, "no such recipe");
    }

    #[test]
    fn status_parse_is_lenient() {
        assert_eq!(parse_status(&[]).0, ErrorCode::Internal);
        assert_eq!(parse_status(&[1, 2, 3]).0, ErrorCode::Internal);
        // Declared message length longer than the payload.
        let mut bad = encode_status(ErrorCode::Aborted, "x");
        bad.truncate(9);
        assert_eq!(parse_status(&bad).0, ErrorCode::Internal);
    }

    #[test]
    fn chunks_gather_and_contiguous() {
        let chunks = PayloadChunks::from_chunks(vec![
            Bytes::from_static(b"he"),
            Bytes::new(),
            Bytes::from_static(b"llo"),
        ]);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.to_vec(), b"hello");
        assert!(chunks.as_contiguous().is_none());

        let single = PayloadChunks::from_vec(b"hello".to_vec());
        assert_eq!(single.as_contiguous(), Some(&b"hello"[..]));
        assert_eq!(PayloadChunks::empty().as_contiguous(), Some(&[][..]));
    }

    #[test]
    fn reader_walks_segments() {
        let chunks = PayloadChunks::from_chunks(vec![
            Bytes::from_static(&[1, 2]),
            Bytes::from_static(&[3]),
            Bytes::from_static(&[4, 5, 6]),
        ]);
        let mut reader = chunks.reader();
        assert_eq!(reader.remaining(), 6);
        assert_eq!(reader.get_u8(), 1);
        let mut rest = [0u8; 5];
        reader.copy_to_slice(&mut rest);
        assert_eq!(rest, [2, 3, 4, 5, 6]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn cancel_frame_shape() {
        let frame = Frame::cancel(7, "RecipeSearchService/GetHealth".into());
        assert!(frame.desc.flags.contains(FrameFlags::CANCEL));
        assert!(frame.payload.is_empty());
    }
}
