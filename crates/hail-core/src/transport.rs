//! The transport collaborator contract.

use std::future::Future;

use crate::error::TransportError;
use crate::frame::Frame;

/// A connected, bidirectional frame transport.
///
/// The invocation layer requires nothing else from a transport: connection
/// establishment, reconnects, and framing below this level are the
/// transport's own business. Implementations must tolerate concurrent
/// `send` calls; `recv` is only ever driven by one task (the channel's
/// demux loop).
pub trait Transport: Send + Sync + 'static {
    /// Send one frame to the peer.
    fn send(&self, frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next frame from the peer.
    ///
    /// Resolves with [`TransportError::Closed`] once the transport is done.
    fn recv(&self) -> impl Future<Output = Result<Frame, TransportError>> + Send;

    /// Close the transport. Subsequent sends fail with
    /// [`TransportError::Closed`]; the peer's `recv` drains and then
    /// reports the same.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
