//! Per-call options: headers, deadline, cancellation.

use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::metadata::{Metadata, MetadataValue};

/// The cross-cutting options carried by every call.
///
/// Constructed fresh per call and never shared or mutated by the
/// invocation layer. Defaults: empty headers, no deadline, no
/// cancellation.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    metadata: Metadata,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing headers.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append one outgoing header, preserving order.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.push(key, value);
        self
    }

    /// Bound the call's total lifetime by an absolute point in time.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Bound the call's total lifetime relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}
