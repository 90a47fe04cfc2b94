//! hail-core: Core types and traits for the hail RPC client stack.
//!
//! This crate defines:
//! - The message contract and per-type codec selection ([`Message`],
//!   [`select_codec`])
//! - Marshalling ([`Marshaller`], [`SerializationContext`],
//!   [`DeserializationContext`])
//! - Method and service descriptors ([`MethodDescriptor`],
//!   [`ServiceDescriptor`])
//! - Call options ([`CallOptions`], [`Metadata`], [`CancellationToken`])
//! - Call invocation ([`CallInvoker`], [`UnaryCall`], [`Channel`])
//! - Wire frames ([`Frame`], [`CallDesc`], [`PayloadChunks`])
//! - Errors ([`ErrorCode`], [`RpcError`], [`TransportError`])

#![deny(unsafe_code)]

mod cancel;
mod channel;
mod codec;
mod descriptor;
mod error;
mod frame;
mod invoker;
mod marshal;
mod message;
mod metadata;
mod options;
mod transport;

pub use cancel::*;
pub use channel::*;
pub use codec::*;
pub use descriptor::*;
pub use error::*;
pub use frame::*;
pub use invoker::*;
pub use marshal::*;
pub use message::*;
pub use metadata::*;
pub use options::*;
pub use transport::*;
