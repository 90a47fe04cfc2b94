//! A scriptable peer serving the far end of an in-process transport.

use std::time::Duration;

use bytes::Bytes;
use hail_core::{CallDesc, ErrorCode, Frame, FrameFlags, Metadata, Transport};
use tokio::task::JoinHandle;
use tracing::debug;

/// What the peer does with one incoming request.
#[derive(Debug)]
pub enum PeerReply {
    /// Respond with this encoded payload.
    Payload(Vec<u8>),
    /// Respond with this encoded payload after a delay.
    PayloadAfter(Duration, Vec<u8>),
    /// Respond with a failure status and trailing metadata.
    Status(ErrorCode, String, Metadata),
    /// Never respond; the caller's deadline or token has to end the call.
    Silent,
}

/// Serve `transport` with `handler` until the transport closes.
///
/// Requests are handled in arrival order. `CANCEL` frames are logged and
/// dropped, as a peer that ignores cancellation notifications is allowed
/// to.
pub fn spawn_peer<T, F>(transport: T, handler: F) -> JoinHandle<()>
where
    T: Transport,
    F: Fn(&CallDesc, Vec<u8>) -> PeerReply + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            let frame = match transport.recv().await {
                Ok(frame) => frame,
                Err(_) => break,
            };
            if frame.desc.flags.contains(FrameFlags::CANCEL) {
                debug!(call_id = frame.desc.call_id, "peer ignoring cancel frame");
                continue;
            }
            let payload = frame.payload.to_vec();
            let reply = handler(&frame.desc, payload);
            let call_id = frame.desc.call_id;
            let method = frame.desc.method.clone();
            match reply {
                PeerReply::Payload(bytes) => {
                    let _ = transport
                        .send(Frame::response(call_id, method, Metadata::new(), Bytes::from(bytes)))
                        .await;
                }
                PeerReply::PayloadAfter(delay, bytes) => {
                    tokio::time::sleep(delay).await;
                    let _ = transport
                        .send(Frame::response(call_id, method, Metadata::new(), Bytes::from(bytes)))
                        .await;
                }
                PeerReply::Status(code, message, trailers) => {
                    let _ = transport
                        .send(Frame::error(call_id, method, code, &message, trailers))
                        .await;
                }
                PeerReply::Silent => {}
            }
        }
    })
}

/// A peer that echoes every request payload back verbatim.
pub fn spawn_echo_peer<T: Transport>(transport: T) -> JoinHandle<()> {
    spawn_peer(transport, |_, payload| PeerReply::Payload(payload))
}
