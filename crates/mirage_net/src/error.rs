use std::io;
use std::time::Duration;

use mirage_core::Ja3Error;
use thiserror::Error;

/// Errors surfaced by the dialer and client facade, tagged by the pipeline
/// stage that produced them. Nothing in this layer retries; resilience
/// policy belongs to callers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Signature parsing or spec building failed before any network I/O.
    #[error(transparent)]
    Signature(#[from] Ja3Error),

    #[error("transport connect to {addr} failed: {source}")]
    Dial { addr: String, source: io::Error },

    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("server negotiated unexpected ALPN protocol {alpn:?}")]
    UnexpectedProtocol { alpn: String },

    #[error("deadline of {after:?} exceeded before response headers arrived")]
    Deadline { after: Duration },

    #[error("request URI {uri:?} has no host")]
    MissingHost { uri: String },

    #[error("invalid request URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),

    #[error("request construction failed: {0}")]
    Request(#[from] http::Error),

    #[error("HTTP/1.1 exchange failed: {0}")]
    Http1(#[from] hyper::Error),

    #[error("HTTP/2 exchange failed: {0}")]
    Http2(#[from] h2::Error),

    #[error("plain-HTTP request failed: {0}")]
    Plain(#[from] reqwest::Error),
}
