//! Network layer for JA3-fingerprinted HTTPS: transport preflight, the
//! handshake-engine capability boundary, the custom dialer, and the HTTP
//! client facade built on top of it.

pub mod client;
pub mod dialer;
pub mod engine;
pub mod error;
pub mod transport;

pub use client::{Ja3Client, Response};
pub use dialer::Ja3Dialer;
pub use engine::{EstablishedConn, HandshakeEngine, NativeEngine, NegotiatedProtocol, TlsOptions};
pub use error::ClientError;
