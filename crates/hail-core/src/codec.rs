//! Per-type wire path selection.

use std::any::TypeId;
use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::message::Message;

/// The two wire paths a message type can take.
///
/// They are observably equivalent; they differ only in copy count and
/// allocation behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    /// Zero-copy path: the payload length is declared up front, bytes are
    /// streamed into a caller-supplied buffer, and decoding reads from the
    /// received segments without an intermediate gather copy.
    Buffered,
    /// Fallback path: serialization materializes one byte array, and
    /// decoding is handed one freshly gathered buffer.
    Contiguous,
}

static REGISTRY: Mutex<BTreeMap<TypeId, Codec>> = Mutex::new(BTreeMap::new());

/// The wire path for `T`, decided on first use and cached for the process
/// lifetime.
///
/// A type lacking the buffered capability is the normal case, not an
/// error. Concurrent first use may probe the capability more than once;
/// the cached result is consistent either way (first insert wins, and the
/// probe is deterministic).
pub fn select_codec<T: Message>() -> Codec {
    let id = TypeId::of::<T>();
    if let Some(codec) = REGISTRY.lock().get(&id) {
        return *codec;
    }
    // Probe outside the lock; duplicated work on a race is acceptable.
    let probed = T::capability();
    let codec = *REGISTRY.lock().entry(id).or_insert(probed);
    debug!(message_type = std::any::type_name::<T>(), ?codec, "selected wire codec");
    codec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, EncodeError};

    struct Plain(u8);

    impl Message for Plain {
        fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
            Ok(vec![self.0])
        }
        fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
            match bytes {
                [b] => Ok(Plain(*b)),
                _ => Err(DecodeError::Truncated),
            }
        }
    }

    struct Streamed(u8);

    impl Message for Streamed {
        fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
            Ok(vec![self.0])
        }
        fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
            match bytes {
                [b] => Ok(Streamed(*b)),
                _ => Err(DecodeError::Truncated),
            }
        }
        fn capability() -> Codec {
            Codec::Buffered
        }
    }

    #[test]
    fn selection_follows_capability() {
        assert_eq!(select_codec::<Plain>(), Codec::Contiguous);
        assert_eq!(select_codec::<Streamed>(), Codec::Buffered);
    }

    #[test]
    fn selection_is_stable() {
        let first = select_codec::<Plain>();
        for _ in 0..100 {
            assert_eq!(select_codec::<Plain>(), first);
        }
    }

    #[test]
    fn concurrent_first_use_is_consistent() {
        struct Racy;
        impl Message for Racy {
            fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
                Ok(Vec::new())
            }
            fn decode(_: &[u8]) -> Result<Self, DecodeError> {
                Ok(Racy)
            }
            fn capability() -> Codec {
                Codec::Buffered
            }
        }

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(select_codec::<Racy>))
            .collect();
        let picks: Vec<Codec> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(picks.iter().all(|&c| c == Codec::Buffered));
    }
}
