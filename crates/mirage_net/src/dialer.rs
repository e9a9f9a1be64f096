use std::io;
use std::sync::Arc;

use mirage_core::HandshakeSpec;
use tokio::net::lookup_host;
use tracing::debug;

use crate::engine::{EstablishedConn, HandshakeEngine, NativeEngine, NegotiatedProtocol, TlsOptions};
use crate::error::ClientError;
use crate::transport::TransportBuilder;

/// Opens fingerprinted TLS connections from an immutable handshake spec.
///
/// Per connection the dialer moves strictly through
/// Dialing -> Handshaking -> ProtocolSelected; any failure terminates that
/// attempt with no retry. The dialer holds no mutable state, so one
/// instance serves any number of concurrent `dial` calls.
pub struct Ja3Dialer {
    spec: Arc<HandshakeSpec>,
    engine: Arc<dyn HandshakeEngine>,
    options: TlsOptions,
}

impl Ja3Dialer {
    pub fn new(spec: HandshakeSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            engine: Arc::new(NativeEngine),
            options: TlsOptions::default(),
        }
    }

    /// Swaps the handshake capability, e.g. for an engine that serializes
    /// the hello byte-exactly.
    pub fn with_engine(mut self, engine: Arc<dyn HandshakeEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_options(mut self, options: TlsOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.options.insecure = insecure;
        self
    }

    pub fn spec(&self) -> &HandshakeSpec {
        &self.spec
    }

    /// Connect, handshake, and classify the negotiated protocol.
    pub async fn dial(&self, host: &str, port: u16) -> Result<EstablishedConn, ClientError> {
        let target = format!("{host}:{port}");

        let addr = lookup_host(target.as_str())
            .await
            .map_err(|e| ClientError::Dial {
                addr: target.clone(),
                source: e,
            })?
            .next()
            .ok_or_else(|| ClientError::Dial {
                addr: target.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no address resolved"),
            })?;

        debug!(%target, "dialing");
        let tcp = TransportBuilder::connect(addr, None)
            .await
            .map_err(|e| ClientError::Dial {
                addr: target.clone(),
                source: e,
            })?;

        debug!(%target, "handshaking");
        let conn = self
            .engine
            .handshake(&self.spec, &self.options, host, tcp)
            .await?;

        if let NegotiatedProtocol::Unexpected(alpn) = &conn.protocol {
            return Err(ClientError::UnexpectedProtocol { alpn: alpn.clone() });
        }

        debug!(%target, protocol = ?conn.protocol, "established");
        Ok(conn)
    }
}
