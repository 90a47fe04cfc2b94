//! hail-recipe-search: typed hail client for the recipe search service.
//!
//! The message types are opaque serializable values to the invocation
//! layer; the client is the uniform per-operation expansion over
//! [`hail_core::CallInvoker`].

#![deny(unsafe_code)]

mod client;
mod messages;

pub use client::*;
pub use messages::*;
