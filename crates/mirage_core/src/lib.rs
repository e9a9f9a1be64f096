//! JA3 translation pipeline: signature parsing, extension resolution, and
//! handshake-spec construction. Everything in this crate is pure and
//! performs no I/O; the network layer lives in `mirage_net`.

pub mod browser;
pub mod error;
pub mod ext;
pub mod signature;
pub mod spec;

pub use browser::Browser;
pub use error::{Ja3Error, SignatureField};
pub use ext::{Extension, GREASE_PLACEHOLDER};
pub use signature::Ja3Signature;
pub use spec::HandshakeSpec;
