//! hail-transport-mem: In-process transport for hail.
//!
//! This is the semantic reference implementation. All other transports
//! must behave identically to this one; if behavior differs, the other
//! transport has a bug.
//!
//! Characteristics:
//! - No framing or I/O; frames cross an in-memory channel pair
//! - Still participates fully in call semantics (deadlines, cancellation,
//!   error statuses, trailing metadata)
//! - Can deliver payloads in bounded segments to exercise the buffered
//!   decode path ([`InProcTransport::pair_chunked`])

#![deny(unsafe_code)]

use std::future::Future;

use bytes::Bytes;
use hail_core::{Frame, PayloadChunks, Transport, TransportError};
use tokio::sync::{mpsc, watch};

/// One end of an in-process transport pair.
pub struct InProcTransport {
    tx: parking_lot::Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Frame>>,
    /// Local close signal; ends an in-flight `recv` without touching the
    /// receiver it is blocked on.
    closed: watch::Sender<bool>,
    chunk_limit: Option<usize>,
}

impl InProcTransport {
    /// A connected pair of transports; frames sent on one end arrive on
    /// the other, in order.
    pub fn pair() -> (Self, Self) {
        Self::pair_inner(None)
    }

    /// Like [`pair`](Self::pair), but outgoing payloads are re-delivered
    /// as segments of at most `max_chunk` bytes.
    pub fn pair_chunked(max_chunk: usize) -> (Self, Self) {
        Self::pair_inner(Some(max_chunk.max(1)))
    }

    fn pair_inner(chunk_limit: Option<usize>) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        let end = |tx, rx| InProcTransport {
            tx: parking_lot::Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
            closed: watch::channel(false).0,
            chunk_limit,
        };
        (end(a_tx, a_rx), end(b_tx, b_rx))
    }
}

fn rechunk(payload: PayloadChunks, limit: usize) -> PayloadChunks {
    let bytes = Bytes::from(payload.to_vec());
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(limit));
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + limit).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    PayloadChunks::from_chunks(chunks)
}

impl Transport for InProcTransport {
    fn send(&self, mut frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send {
        if let Some(limit) = self.chunk_limit {
            frame.payload = rechunk(frame.payload, limit);
        }
        let tx = self.tx.lock().clone();
        async move {
            let tx = tx.ok_or(TransportError::Closed)?;
            tx.send(frame).map_err(|_| TransportError::Closed)
        }
    }

    fn recv(&self) -> impl Future<Output = Result<Frame, TransportError>> + Send {
        async move {
            let mut closed = self.closed.subscribe();
            if *closed.borrow_and_update() {
                return Err(TransportError::Closed);
            }
            let mut rx = self.rx.lock().await;
            tokio::select! {
                frame = rx.recv() => frame.ok_or(TransportError::Closed),
                _ = closed.changed() => Err(TransportError::Closed),
            }
        }
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        // Dropping our sender ends the peer's receive stream; the watch
        // signal ends our own, even one already blocked in recv.
        self.tx.lock().take();
        self.closed.send_replace(true);
        std::future::ready(())
    }
}
