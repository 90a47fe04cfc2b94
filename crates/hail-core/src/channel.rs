//! Channel: the live [`CallInvoker`] over a [`Transport`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::descriptor::MethodDescriptor;
use crate::error::{RpcError, TransportError};
use crate::frame::{parse_status, Frame, FrameFlags};
use crate::invoker::{CallInvoker, UnaryCall};
use crate::marshal::{DeserializationContext, Marshaller, SerializationContext};
use crate::message::Message;
use crate::options::CallOptions;
use crate::transport::Transport;

/// Channel behavior knobs.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Send a best-effort `CANCEL` frame when a call is abandoned locally
    /// (deadline expiry or cancellation). Peers may ignore it; bytes
    /// already sent are never recalled either way.
    pub send_cancel_frames: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            send_cancel_frames: true,
        }
    }
}

/// A cheaply clonable invoker bound to one transport.
///
/// All stub instances created from a channel share its state; the channel
/// tolerates concurrent blocking and non-blocking calls interleaved
/// arbitrarily. A demux task spawned at construction is the only caller
/// of `transport.recv()`: it routes response frames to pending waiters by
/// call id, so concurrent callers never compete for incoming frames.
pub struct Channel<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<T> {
    transport: Arc<T>,
    /// Pending response waiters: call_id -> oneshot sender. A call
    /// registers itself before its request frame is sent; the demux loop
    /// delivers the matching response and removes the entry. Abandoned
    /// calls remove their own entry.
    pending: Mutex<HashMap<u64, oneshot::Sender<Frame>>>,
    next_call_id: AtomicU64,
    runtime: tokio::runtime::Handle,
    config: ChannelConfig,
}

impl<T: Transport> Channel<T> {
    /// Wrap a connected transport.
    ///
    /// Captures the current tokio runtime to drive calls and the demux
    /// loop; panics if called outside one.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ChannelConfig::default())
    }

    pub fn with_config(transport: T, config: ChannelConfig) -> Self {
        let runtime = tokio::runtime::Handle::current();
        let inner = Arc::new(Inner {
            transport: Arc::new(transport),
            pending: Mutex::new(HashMap::new()),
            next_call_id: AtomicU64::new(1),
            runtime: runtime.clone(),
            config,
        });
        runtime.spawn(demux(inner.clone()));
        Channel { inner }
    }

    /// Close the underlying transport. In-flight calls fail with
    /// [`TransportError::Closed`].
    pub async fn close(&self) {
        self.inner.transport.close().await;
    }
}

/// The demux loop: receives every incoming frame and routes responses to
/// their pending waiters. Exits when the transport closes, failing
/// whatever is still in flight.
async fn demux<T: Transport>(inner: Arc<Inner<T>>) {
    loop {
        let frame = match inner.transport.recv().await {
            Ok(frame) => frame,
            Err(TransportError::Closed) => break,
            Err(e) => {
                warn!(error = %e, "transport receive failed, closing channel");
                break;
            }
        };

        if !frame.desc.flags.contains(FrameFlags::RESPONSE) {
            debug!(
                call_id = frame.desc.call_id,
                flags = ?frame.desc.flags,
                "dropping non-response frame on client channel"
            );
            continue;
        }

        let call_id = frame.desc.call_id;
        let waiter = inner.pending.lock().remove(&call_id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(frame);
            }
            // Normal after a local abandon: the response raced our cancel.
            None => debug!(call_id, "no pending call for response, dropping"),
        }
    }

    // Dropping the waiters resolves every in-flight call as Closed.
    let orphaned = {
        let mut pending = inner.pending.lock();
        let count = pending.len();
        pending.clear();
        count
    };
    if orphaned > 0 {
        debug!(orphaned, "transport closed with calls in flight");
    }
}

impl<T: Transport> CallInvoker for Channel<T> {
    fn unary<Req: Message, Resp: Message>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        host: Option<&str>,
        options: CallOptions,
        request: &Req,
    ) -> UnaryCall<Resp> {
        // Serialize on the caller's thread; an encode failure never
        // reaches the transport.
        let mut ctx = SerializationContext::new();
        if let Err(e) = method.request_marshaller().serialize(request, &mut ctx) {
            return UnaryCall::ready(Err(RpcError::Encode(e)));
        }
        let payload = match ctx.into_payload() {
            Ok(payload) => payload,
            Err(e) => return UnaryCall::ready(Err(RpcError::Encode(e))),
        };

        // A deadline already in the past terminates the call before
        // anything is sent.
        let now = Instant::now();
        let deadline = options.deadline();
        if let Some(d) = deadline {
            if d <= now {
                return UnaryCall::ready(Err(RpcError::DeadlineExceeded));
            }
        }

        let call_id = self.inner.next_call_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(call_id, tx);

        let frame = Frame::request(
            call_id,
            method.full_name(),
            host.map(str::to_owned),
            options.metadata().clone(),
            deadline.map(|d| d - now),
            payload,
        );

        let (done_tx, done_rx) = oneshot::channel();
        self.inner.runtime.spawn(drive_unary(
            self.inner.clone(),
            call_id,
            frame,
            deadline,
            options.cancellation().cloned(),
            rx,
            *method.response_marshaller(),
            done_tx,
        ));
        UnaryCall::pending(done_rx)
    }
}

/// Drives one call to a terminal state: sends the request, then waits
/// under a biased select ordered deadline -> cancellation -> response.
///
/// The bias is the tie-break for the race where both the deadline and the
/// token have fired by evaluation time: `DeadlineExceeded` wins,
/// deterministically.
#[allow(clippy::too_many_arguments)]
async fn drive_unary<T: Transport, Resp: Send + 'static>(
    inner: Arc<Inner<T>>,
    call_id: u64,
    frame: Frame,
    deadline: Option<Instant>,
    cancel: Option<crate::cancel::CancellationToken>,
    rx: oneshot::Receiver<Frame>,
    response_marshaller: Marshaller<Resp>,
    done: oneshot::Sender<Result<Resp, RpcError>>,
) {
    let method = frame.desc.method.clone();

    if let Err(e) = inner.transport.send(frame).await {
        inner.pending.lock().remove(&call_id);
        let _ = done.send(Err(RpcError::Transport(e)));
        return;
    }

    let expired = async {
        match deadline {
            Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
            None => std::future::pending().await,
        }
    };
    let cancelled = async {
        match &cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = expired => {
            abandon(&inner, call_id, &method).await;
            Err(RpcError::DeadlineExceeded)
        }
        _ = cancelled => {
            abandon(&inner, call_id, &method).await;
            Err(RpcError::Cancelled)
        }
        received = rx => match received {
            Ok(frame) => decode_response(frame, &response_marshaller),
            // Demux exited with this call still pending.
            Err(_) => Err(RpcError::Transport(TransportError::Closed)),
        }
    };

    // If the holder is gone the outcome is simply discarded; a token
    // triggered after this point is a no-op by construction.
    let _ = done.send(outcome);
}

/// Remove the pending entry for a locally abandoned call and notify the
/// peer, best-effort.
async fn abandon<T: Transport>(inner: &Inner<T>, call_id: u64, method: &str) {
    inner.pending.lock().remove(&call_id);
    debug!(call_id, method, "call abandoned before response");
    if inner.config.send_cancel_frames {
        let _ = inner
            .transport
            .send(Frame::cancel(call_id, method.to_owned()))
            .await;
    }
}

fn decode_response<Resp>(
    frame: Frame,
    marshaller: &Marshaller<Resp>,
) -> Result<Resp, RpcError> {
    if frame.desc.flags.contains(FrameFlags::ERROR) {
        let (code, message) = parse_status(&frame.payload.to_vec());
        return Err(RpcError::Status {
            code,
            message,
            trailers: frame.desc.metadata,
        });
    }
    let mut ctx = DeserializationContext::new(&frame.payload);
    marshaller.deserialize(&mut ctx).map_err(RpcError::Malformed)
}

// Note: Channel end-to-end tests live in hail-testkit to avoid circular
// dev-dependencies between hail-core and hail-transport-mem.
