//! Method and service descriptors.

use crate::marshal::Marshaller;
use crate::message::Message;

/// The kind of a remote operation. Only unary calls are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// One request message, one response message, no streaming.
    Unary,
}

/// The immutable identity + marshaller binding for one remote operation.
///
/// Constructed once (usually as a `static`) and shared across all
/// invocations and all stub instances. Call sites pass descriptors by
/// reference and dispatch on identity; the names only matter for wire
/// compatibility.
pub struct MethodDescriptor<Req, Resp> {
    service: &'static str,
    name: &'static str,
    kind: MethodKind,
    request: Marshaller<Req>,
    response: Marshaller<Resp>,
}

impl<Req, Resp> MethodDescriptor<Req, Resp> {
    /// Bind a descriptor with explicit marshallers.
    pub const fn with_marshallers(
        service: &'static str,
        name: &'static str,
        kind: MethodKind,
        request: Marshaller<Req>,
        response: Marshaller<Resp>,
    ) -> Self {
        MethodDescriptor {
            service,
            name,
            kind,
            request,
            response,
        }
    }

    /// The owning service's fixed name.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// The operation name exactly as exposed on the wire.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// The wire identity, `"{service}/{name}"`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.service, self.name)
    }

    pub fn request_marshaller(&self) -> &Marshaller<Req> {
        &self.request
    }

    pub fn response_marshaller(&self) -> &Marshaller<Resp> {
        &self.response
    }
}

impl<Req: Message, Resp: Message> MethodDescriptor<Req, Resp> {
    /// Bind a unary operation whose request and response are [`Message`]
    /// types.
    pub const fn unary(service: &'static str, name: &'static str) -> Self {
        Self::with_marshallers(
            service,
            name,
            MethodKind::Unary,
            Marshaller::for_message(),
            Marshaller::for_message(),
        )
    }
}

/// Reflection entry for one operation in a [`ServiceDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: &'static str,
    pub kind: MethodKind,
}

/// The authoritative list of a service's operations.
///
/// Introspection only; call dispatch never consults it.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDescriptor {
    name: &'static str,
    methods: &'static [MethodInfo],
}

impl ServiceDescriptor {
    pub const fn new(name: &'static str, methods: &'static [MethodInfo]) -> Self {
        ServiceDescriptor { name, methods }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn methods(&self) -> &'static [MethodInfo] {
        self.methods
    }

    pub fn find(&self, name: &str) -> Option<&'static MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, EncodeError};

    #[derive(Debug, PartialEq)]
    struct Ping;

    impl Message for Ping {
        fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
            Ok(Vec::new())
        }
        fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
            if bytes.is_empty() {
                Ok(Ping)
            } else {
                Err(DecodeError::Invalid("expected empty payload".into()))
            }
        }
    }

    static PING: MethodDescriptor<Ping, Ping> = MethodDescriptor::unary("EchoService", "Ping");

    #[test]
    fn descriptor_identity() {
        assert_eq!(PING.service(), "EchoService");
        assert_eq!(PING.name(), "Ping");
        assert_eq!(PING.kind(), MethodKind::Unary);
        assert_eq!(PING.full_name(), "EchoService/Ping");
    }

    #[test]
    fn service_descriptor_lookup() {
        static METHODS: [MethodInfo; 2] = [
            MethodInfo {
                name: "Ping",
                kind: MethodKind::Unary,
            },
            MethodInfo {
                name: "Pong",
                kind: MethodKind::Unary,
            },
        ];
        static SERVICE: ServiceDescriptor = ServiceDescriptor::new("EchoService", &METHODS);

        assert_eq!(SERVICE.name(), "EchoService");
        assert_eq!(SERVICE.methods().len(), 2);
        assert_eq!(SERVICE.find("Pong").unwrap().name, "Pong");
        assert!(SERVICE.find("Quux").is_none());
    }
}
