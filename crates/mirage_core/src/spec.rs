use sha2::{Digest, Sha256};

use crate::error::Ja3Error;
use crate::ext::{self, Extension};
use crate::signature::Ja3Signature;

/// Derives a fixed-size session identifier from arbitrary input bytes.
pub type SessionIdRule = fn(&[u8]) -> [u8; 32];

/// SHA-256 session-ID derivation attached to every spec this crate builds.
pub fn sha256_session_id(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// Immutable ClientHello blueprint consumed by a handshake engine.
///
/// The version range never spans: both bounds equal the signature's
/// version. Cipher suites and extensions keep the signature's exact order;
/// `extensions.len() == extension_ids.len()` holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSpec {
    pub version_min: u16,
    pub version_max: u16,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
    pub session_id: SessionIdRule,
}

impl HandshakeSpec {
    /// Parses a JA3 string and builds the spec in one step.
    pub fn from_ja3(ja3: &str) -> Result<Self, Ja3Error> {
        Self::from_signature(&ja3.parse()?)
    }

    /// Resolves every extension ID in signature order. Pure: no I/O, no
    /// shared state touched.
    pub fn from_signature(sig: &Ja3Signature) -> Result<Self, Ja3Error> {
        let extensions = sig
            .extension_ids
            .iter()
            .map(|&id| ext::resolve(id, sig))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version_min: sig.version,
            version_max: sig.version,
            cipher_suites: sig.cipher_suites.clone(),
            compression_methods: vec![0],
            extensions,
            session_id: sha256_session_id,
        })
    }

    /// The ALPN protocols this spec offers, when extension 16 is present.
    pub fn alpn_protocols(&self) -> Option<&[String]> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Alpn(protocols) => Some(protocols.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_spec_with_extensions_in_signature_order() {
        let spec = HandshakeSpec::from_ja3("771,4865-4866-4867-49196-49195,0-23-13-5-16,29-23-24,0")
            .unwrap();

        assert_eq!(spec.version_min, 771);
        assert_eq!(spec.version_max, 771);
        assert_eq!(spec.cipher_suites, vec![4865, 4866, 4867, 49196, 49195]);
        assert_eq!(spec.compression_methods, vec![0]);

        let ids: Vec<u16> = spec.extensions.iter().map(Extension::id).collect();
        assert_eq!(ids, vec![0, 23, 13, 5, 16]);
    }

    #[test]
    fn unknown_extension_fails_the_whole_build() {
        assert_eq!(
            HandshakeSpec::from_ja3("771,4865,23-999,29,0").unwrap_err(),
            Ja3Error::UnsupportedExtension { id: 999 }
        );
    }

    #[test]
    fn empty_group_and_point_fields_build_empty_parametric_extensions() {
        let spec = HandshakeSpec::from_ja3("771,4865,10-11,,").unwrap();
        assert_eq!(
            spec.extensions,
            vec![
                Extension::SupportedGroups(vec![]),
                Extension::EcPointFormats(vec![]),
            ]
        );
    }

    #[test]
    fn building_twice_is_idempotent() {
        let ja3 = "771,4865-4866-4867-49196-49195,0-23-13-5-16,29-23-24,0";
        assert_eq!(
            HandshakeSpec::from_ja3(ja3).unwrap(),
            HandshakeSpec::from_ja3(ja3).unwrap()
        );
    }

    #[test]
    fn parametric_extensions_carry_their_own_signature_lists() {
        let a = HandshakeSpec::from_ja3("771,4865,10,29-23-24,0").unwrap();
        let b = HandshakeSpec::from_ja3("771,4865,10,256-257,0").unwrap();
        assert_eq!(a.extensions[0], Extension::SupportedGroups(vec![29, 23, 24]));
        assert_eq!(b.extensions[0], Extension::SupportedGroups(vec![256, 257]));
    }

    #[test]
    fn concurrent_builds_stay_isolated() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    let (ja3, groups) = if i % 2 == 0 {
                        ("771,4865,10-11,29-23-24,0", vec![29u16, 23, 24])
                    } else {
                        ("771,4865,10-11,256-257,1", vec![256u16, 257])
                    };
                    for _ in 0..200 {
                        let spec = HandshakeSpec::from_ja3(ja3).unwrap();
                        assert_eq!(spec.extensions[0], Extension::SupportedGroups(groups.clone()));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn session_id_rule_is_a_deterministic_hash() {
        let spec = HandshakeSpec::from_ja3("771,4865,23,,").unwrap();
        let a = (spec.session_id)(b"client random");
        let b = (spec.session_id)(b"client random");
        assert_eq!(a, b);
        assert_ne!(a, (spec.session_id)(b"other input"));
    }
}
