//! The call invoker abstraction: the single choke point every stub method
//! passes through.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::descriptor::MethodDescriptor;
use crate::error::{RpcError, TransportError};
use crate::message::Message;
use crate::options::CallOptions;

/// Performs calls given a descriptor, a request, and options.
///
/// One interface covers live channels and test doubles alike; stubs are
/// generic over it and hold it by value (implementations are cheap
/// handles). Implementations must be safe for concurrent use by multiple
/// callers, must attach the options exactly as given, and must not retry,
/// batch, or reorder calls.
pub trait CallInvoker: Send + Sync {
    /// Issue a unary call and return a handle to its eventual outcome.
    ///
    /// The call is issued eagerly; completion, failure, and cancellation
    /// are observed through the returned [`UnaryCall`].
    fn unary<Req: Message, Resp: Message>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        host: Option<&str>,
        options: CallOptions,
        request: &Req,
    ) -> UnaryCall<Resp>;

    /// Issue a unary call and block the calling thread until it completes.
    ///
    /// A true blocking wait, subject to the deadline in `options`. Must
    /// not be called from async context; use [`unary`](Self::unary) there.
    fn unary_blocking<Req: Message, Resp: Message>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        host: Option<&str>,
        options: CallOptions,
        request: &Req,
    ) -> Result<Resp, RpcError> {
        self.unary(method, host, options, request).wait()
    }
}

/// Handle to an in-flight unary call.
///
/// Await it to observe the outcome, or [`wait`](Self::wait) to block for
/// it. Success and every failure kind arrive through the same handle.
#[derive(Debug)]
pub struct UnaryCall<T> {
    state: State<T>,
}

#[derive(Debug)]
enum State<T> {
    Ready(Option<Result<T, RpcError>>),
    Pending(oneshot::Receiver<Result<T, RpcError>>),
}

impl<T> UnaryCall<T> {
    /// A call that already completed (used for short-circuit outcomes such
    /// as an already-expired deadline).
    pub fn ready(result: Result<T, RpcError>) -> Self {
        UnaryCall {
            state: State::Ready(Some(result)),
        }
    }

    /// A call whose outcome will arrive on `rx`.
    ///
    /// If the sender is dropped without a result, the call resolves to
    /// [`TransportError::Closed`].
    pub fn pending(rx: oneshot::Receiver<Result<T, RpcError>>) -> Self {
        UnaryCall {
            state: State::Pending(rx),
        }
    }

    /// Block the calling thread until the call completes.
    pub fn wait(self) -> Result<T, RpcError> {
        futures::executor::block_on(self)
    }
}

// UnaryCall never pin-projects into T; the result is only ever moved out.
impl<T> Unpin for UnaryCall<T> {}

impl<T> Future for UnaryCall<T> {
    type Output = Result<T, RpcError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Ready(slot) => {
                Poll::Ready(slot.take().expect("UnaryCall polled after completion"))
            }
            State::Pending(rx) => Pin::new(rx).poll(cx).map(|received| match received {
                Ok(outcome) => outcome,
                Err(_) => Err(RpcError::Transport(TransportError::Closed)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_call_resolves() {
        let call = UnaryCall::ready(Ok(7u32));
        assert_eq!(call.await.unwrap(), 7);
    }

    #[test]
    fn wait_blocks_for_the_result() {
        let (tx, rx) = oneshot::channel();
        let call = UnaryCall::<u32>::pending(rx);
        let handle = std::thread::spawn(move || call.wait());
        tx.send(Ok(11)).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 11);
    }

    #[tokio::test]
    async fn dropped_sender_reads_as_closed_transport() {
        let (tx, rx) = oneshot::channel::<Result<u32, RpcError>>();
        drop(tx);
        let err = UnaryCall::pending(rx).await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(TransportError::Closed)));
    }
}
