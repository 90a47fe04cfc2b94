//! Invoker test doubles.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use hail_core::{
    CallInvoker, CallOptions, DeserializationContext, ErrorCode, Message, MethodDescriptor,
    Metadata, PayloadChunks, RpcError, SerializationContext, UnaryCall,
};
use parking_lot::Mutex;

/// One call as observed at the invoker boundary.
///
/// `options` is exactly what the stub passed in: header order, deadline,
/// and cancellation token are recorded unmutated.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Wire identity, `"{service}/{name}"`.
    pub method: String,
    pub host: Option<String>,
    pub options: CallOptions,
    /// The request as encoded by the method's real request marshaller.
    pub request: Vec<u8>,
}

/// A scripted reply for one call.
#[derive(Debug)]
pub enum MockReply {
    /// An encoded response payload, decoded through the method's real
    /// response marshaller.
    Payload(Vec<u8>),
    /// A terminal failure.
    Error(RpcError),
}

/// An invoker that records every call and replies from per-method queues.
///
/// Calls to methods with no scripted reply left complete with
/// [`ErrorCode::Unimplemented`].
#[derive(Clone, Default)]
pub struct MockInvoker {
    shared: Arc<MockShared>,
}

#[derive(Default)]
struct MockShared {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<HashMap<String, VecDeque<MockReply>>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the method with the given full name.
    pub fn enqueue(&self, method: &str, reply: MockReply) {
        self.shared
            .replies
            .lock()
            .entry(method.to_owned())
            .or_default()
            .push_back(reply);
    }

    /// Queue a typed reply, encoded through the message's own marshalling.
    pub fn enqueue_message<M: Message>(&self, method: &str, value: &M) {
        self.enqueue(method, MockReply::Payload(encode_message(value)));
    }

    /// Every call recorded so far, in issue order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().clone()
    }

    /// Drain the recorded calls.
    pub fn take_calls(&self) -> Vec<RecordedCall> {
        std::mem::take(&mut *self.shared.calls.lock())
    }
}

impl CallInvoker for MockInvoker {
    fn unary<Req: Message, Resp: Message>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        host: Option<&str>,
        options: CallOptions,
        request: &Req,
    ) -> UnaryCall<Resp> {
        let mut ctx = SerializationContext::new();
        let encoded = method
            .request_marshaller()
            .serialize(request, &mut ctx)
            .and_then(|()| ctx.into_payload());
        let encoded = match encoded {
            Ok(payload) => payload.to_vec(),
            Err(e) => return UnaryCall::ready(Err(RpcError::Encode(e))),
        };

        let full_name = method.full_name();
        self.shared.calls.lock().push(RecordedCall {
            method: full_name.clone(),
            host: host.map(str::to_owned),
            options,
            request: encoded,
        });

        let reply = self
            .shared
            .replies
            .lock()
            .get_mut(&full_name)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(MockReply::Payload(bytes)) => {
                let payload = PayloadChunks::from_vec(bytes);
                let mut ctx = DeserializationContext::new(&payload);
                match method.response_marshaller().deserialize(&mut ctx) {
                    Ok(response) => UnaryCall::ready(Ok(response)),
                    Err(e) => UnaryCall::ready(Err(RpcError::Malformed(e))),
                }
            }
            Some(MockReply::Error(e)) => UnaryCall::ready(Err(e)),
            None => UnaryCall::ready(Err(RpcError::Status {
                code: ErrorCode::Unimplemented,
                message: format!("no scripted reply for {full_name}"),
                trailers: Metadata::new(),
            })),
        }
    }
}

/// An invoker for stubs that are constructed but never expected to be
/// called (the parameterless test-double constructor). Every call
/// completes with [`ErrorCode::FailedPrecondition`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NullInvoker;

impl CallInvoker for NullInvoker {
    fn unary<Req: Message, Resp: Message>(
        &self,
        _method: &MethodDescriptor<Req, Resp>,
        _host: Option<&str>,
        _options: CallOptions,
        _request: &Req,
    ) -> UnaryCall<Resp> {
        UnaryCall::ready(Err(RpcError::Status {
            code: ErrorCode::FailedPrecondition,
            message: "stub created without a channel".into(),
            trailers: Metadata::new(),
        }))
    }
}

/// Encode a message through its own marshalling, as the wire would see it.
pub fn encode_message<M: Message>(value: &M) -> Vec<u8> {
    let marshaller = hail_core::Marshaller::<M>::for_message();
    let mut ctx = SerializationContext::new();
    marshaller
        .serialize(value, &mut ctx)
        .expect("test message failed to encode");
    ctx.into_payload()
        .expect("test message never completed encoding")
        .to_vec()
}

/// Decode a message through its own marshalling.
pub fn decode_message<M: Message>(bytes: &[u8]) -> Result<M, hail_core::DecodeError> {
    let marshaller = hail_core::Marshaller::<M>::for_message();
    let payload = PayloadChunks::from_vec(bytes.to_vec());
    let mut ctx = DeserializationContext::new(&payload);
    marshaller.deserialize(&mut ctx)
}
