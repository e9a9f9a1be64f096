use std::sync::Arc;

use async_trait::async_trait;
use mirage_core::HandshakeSpec;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::ClientError;
use crate::transport::{DialStream, TransportBuilder};

/// Application protocol settled by the ALPN exchange. The client facade
/// picks its framing from this state; anything outside `h2` / `http/1.1` /
/// absent is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiatedProtocol {
    H2,
    Http11,
    Unexpected(String),
}

impl NegotiatedProtocol {
    /// Maps the raw ALPN outcome; an absent protocol means HTTP/1.1.
    pub fn from_alpn(alpn: Option<&[u8]>) -> Self {
        match alpn {
            None => NegotiatedProtocol::Http11,
            Some(p) if p == b"h2" => NegotiatedProtocol::H2,
            Some(p) if p == b"http/1.1" => NegotiatedProtocol::Http11,
            Some(p) => NegotiatedProtocol::Unexpected(String::from_utf8_lossy(p).into_owned()),
        }
    }
}

/// A TLS session produced by a handshake engine, plus its settled protocol.
pub struct EstablishedConn {
    pub stream: DialStream,
    pub protocol: NegotiatedProtocol,
}

impl std::fmt::Debug for EstablishedConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstablishedConn")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// Per-client TLS knobs callers may override before the first connection.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Overrides the SNI value derived from the target host.
    pub server_name: Option<String>,
    /// Disables server-certificate verification.
    pub insecure: bool,
    /// Replaces the built-in webpki trust anchors.
    pub roots: Option<RootCertStore>,
}

impl TlsOptions {
    pub fn server_name(mut self, server_name: &str) -> Self {
        self.server_name = Some(server_name.to_string());
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn roots(mut self, roots: RootCertStore) -> Self {
        self.roots = Some(roots);
        self
    }
}

/// The consumed handshake capability: turns a raw TCP stream plus an
/// immutable [`HandshakeSpec`] into an encrypted session. Engines own
/// ClientHello serialization; the dialer owns everything before and after.
/// Implementations must be safe to share across concurrent dials.
#[async_trait]
pub trait HandshakeEngine: Send + Sync {
    async fn handshake(
        &self,
        spec: &HandshakeSpec,
        opts: &TlsOptions,
        host: &str,
        stream: TcpStream,
    ) -> Result<EstablishedConn, ClientError>;
}

/// Default engine backed by rustls. It honors the spec's ALPN offer and
/// the trust options; hello byte layout stays whatever rustls emits, so a
/// custom engine is swapped in when byte-exact mimicry of the full hello
/// is required.
pub struct NativeEngine;

impl NativeEngine {
    /// Caller-supplied trust anchors win; otherwise the webpki set applies.
    fn trust_roots(opts: &TlsOptions) -> RootCertStore {
        if let Some(roots) = &opts.roots {
            return roots.clone();
        }
        let mut roots = RootCertStore::empty();
        roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));
        roots
    }

    fn client_config(spec: &HandshakeSpec, opts: &TlsOptions) -> Arc<ClientConfig> {
        let mut config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(Self::trust_roots(opts))
            .with_no_client_auth();

        if let Some(protocols) = spec.alpn_protocols() {
            config.alpn_protocols = protocols.iter().map(|p| p.clone().into_bytes()).collect();
        }

        if opts.insecure {
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(NoVerifier));
        }

        Arc::new(config)
    }
}

#[async_trait]
impl HandshakeEngine for NativeEngine {
    async fn handshake(
        &self,
        spec: &HandshakeSpec,
        opts: &TlsOptions,
        host: &str,
        stream: TcpStream,
    ) -> Result<EstablishedConn, ClientError> {
        let sni = opts.server_name.as_deref().unwrap_or(host);
        let server_name =
            ServerName::try_from(sni).map_err(|e| ClientError::Handshake {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let connector = TlsConnector::from(Self::client_config(spec, opts));
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ClientError::Handshake {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let protocol = NegotiatedProtocol::from_alpn(tls.get_ref().1.alpn_protocol());
        Ok(EstablishedConn {
            stream: TransportBuilder::into_stream(tls),
            protocol,
        })
    }
}

struct NoVerifier;

impl rustls::client::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}
