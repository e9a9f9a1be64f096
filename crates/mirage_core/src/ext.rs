//! Extension registry: maps numeric JA3 extension IDs onto typed extension
//! values. The fixed entries are constants shared by every signature; IDs
//! 10 and 11 are JA3-variable and built fresh from the signature's own
//! lists on every call, so concurrent resolutions never share mutable
//! state.

use crate::error::Ja3Error;
use crate::signature::Ja3Signature;

/// GREASE sentinel (RFC 8701, the `0x?a?a` pattern) inserted by the fixed
/// supported-versions and key-share entries to mimic browser reservation
/// behavior. A constant, never derived from the signature.
pub const GREASE_PLACEHOLDER: u16 = 0x0a0a;

pub const TLS_1_0: u16 = 0x0301;
pub const TLS_1_1: u16 = 0x0302;
pub const TLS_1_2: u16 = 0x0303;
pub const TLS_1_3: u16 = 0x0304;

/// X25519 named group.
pub const X25519: u16 = 29;

/// Signature scheme identifiers offered by the fixed signature-algorithms
/// extension, in browser preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SignatureScheme {
    EcdsaNistp256Sha256 = 0x0403,
    RsaPssSha256 = 0x0804,
    RsaPkcs1Sha256 = 0x0401,
    EcdsaNistp384Sha384 = 0x0503,
    RsaPssSha384 = 0x0805,
    RsaPkcs1Sha384 = 0x0501,
    RsaPssSha512 = 0x0806,
    RsaPkcs1Sha512 = 0x0601,
    RsaPkcs1Sha1 = 0x0201,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PskKeyExchangeMode {
    Dhe = 1,
}

/// One key-share offer: a named group and its (possibly placeholder)
/// public bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renegotiation {
    OnceAsClient,
}

/// ClientHello padding target selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingStyle {
    /// BoringSSL heuristic: hellos between 0x100 and 0x1ff bytes get padded
    /// up to 0x200. See [`boring_padding_len`].
    Boring,
}

/// A semantically typed ClientHello extension. Byte serialization belongs
/// to the handshake engine; this crate only fixes identity, payload, and
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    ServerName,
    StatusRequest,
    SupportedGroups(Vec<u16>),
    EcPointFormats(Vec<u8>),
    SignatureAlgorithms(Vec<SignatureScheme>),
    Alpn(Vec<String>),
    SignedCertificateTimestamp,
    Padding(PaddingStyle),
    ExtendedMasterSecret,
    CertCompression,
    RecordSizeLimit,
    SessionTicket,
    SupportedVersions(Vec<u16>),
    Cookie,
    PskKeyExchangeModes(Vec<PskKeyExchangeMode>),
    KeyShare(Vec<KeyShareEntry>),
    NextProtoNegotiation,
    RenegotiationInfo(Renegotiation),
}

impl Extension {
    /// The IANA extension ID this value is sent under.
    pub fn id(&self) -> u16 {
        match self {
            Extension::ServerName => 0,
            Extension::StatusRequest => 5,
            Extension::SupportedGroups(_) => 10,
            Extension::EcPointFormats(_) => 11,
            Extension::SignatureAlgorithms(_) => 13,
            Extension::Alpn(_) => 16,
            Extension::SignedCertificateTimestamp => 18,
            Extension::Padding(_) => 21,
            Extension::ExtendedMasterSecret => 23,
            Extension::CertCompression => 27,
            Extension::RecordSizeLimit => 28,
            Extension::SessionTicket => 35,
            Extension::SupportedVersions(_) => 43,
            Extension::Cookie => 44,
            Extension::PskKeyExchangeModes(_) => 45,
            Extension::KeyShare(_) => 51,
            Extension::NextProtoNegotiation => 13172,
            Extension::RenegotiationInfo(_) => 65281,
        }
    }
}

/// Resolves a JA3 extension ID to its extension value.
///
/// Pure function over an immutable table: the parametric entries (10, 11)
/// are cloned out of the signature rather than written into shared state,
/// so two signatures resolved concurrently can never observe each other's
/// group or point-format lists. Unknown IDs fail carrying the offending ID
/// so a bad fingerprint string stays diagnosable.
pub fn resolve(id: u16, sig: &Ja3Signature) -> Result<Extension, Ja3Error> {
    let ext = match id {
        0 => Extension::ServerName,
        5 => Extension::StatusRequest,
        10 => Extension::SupportedGroups(sig.supported_groups.clone()),
        11 => Extension::EcPointFormats(sig.point_formats.clone()),
        13 => Extension::SignatureAlgorithms(vec![
            SignatureScheme::EcdsaNistp256Sha256,
            SignatureScheme::RsaPssSha256,
            SignatureScheme::RsaPkcs1Sha256,
            SignatureScheme::EcdsaNistp384Sha384,
            SignatureScheme::RsaPssSha384,
            SignatureScheme::RsaPkcs1Sha384,
            SignatureScheme::RsaPssSha512,
            SignatureScheme::RsaPkcs1Sha512,
            SignatureScheme::RsaPkcs1Sha1,
        ]),
        16 => Extension::Alpn(vec!["h2".to_string(), "http/1.1".to_string()]),
        18 => Extension::SignedCertificateTimestamp,
        21 => Extension::Padding(PaddingStyle::Boring),
        23 => Extension::ExtendedMasterSecret,
        27 => Extension::CertCompression,
        28 => Extension::RecordSizeLimit,
        35 => Extension::SessionTicket,
        43 => Extension::SupportedVersions(vec![
            GREASE_PLACEHOLDER,
            TLS_1_3,
            TLS_1_2,
            TLS_1_1,
            TLS_1_0,
        ]),
        44 => Extension::Cookie,
        45 => Extension::PskKeyExchangeModes(vec![PskKeyExchangeMode::Dhe]),
        51 => Extension::KeyShare(vec![
            KeyShareEntry {
                group: GREASE_PLACEHOLDER,
                data: vec![0],
            },
            KeyShareEntry {
                group: X25519,
                data: Vec::new(),
            },
        ]),
        13172 => Extension::NextProtoNegotiation,
        65281 => Extension::RenegotiationInfo(Renegotiation::OnceAsClient),
        other => return Err(Ja3Error::UnsupportedExtension { id: other }),
    };
    Ok(ext)
}

/// BoringSSL's ClientHello padding heuristic: hellos whose unpadded length
/// falls in (0xff, 0x200) are padded up to 0x200 bytes. Returns the padding
/// payload length and whether padding applies at all.
pub fn boring_padding_len(unpadded_len: usize) -> (usize, bool) {
    if unpadded_len > 0xff && unpadded_len < 0x200 {
        let mut padding_len = 0x200 - unpadded_len;
        // Account for the 4-byte extension header itself.
        if padding_len >= 4 + 1 {
            padding_len -= 4;
        } else {
            padding_len = 1;
        }
        (padding_len, true)
    } else {
        (0, false)
    }
}

/// RFC 8701 GREASE detection: `0x?a?a` with matching high nibbles.
pub fn is_grease(value: u16) -> bool {
    let low = (value & 0xff) as u8;
    let high = (value >> 8) as u8;
    (low & 0x0f) == 0x0a && (high & 0x0f) == 0x0a && (low >> 4) == (high >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(groups: Vec<u16>, points: Vec<u8>) -> Ja3Signature {
        Ja3Signature {
            version: 771,
            cipher_suites: vec![4865],
            extension_ids: vec![10, 11],
            supported_groups: groups,
            point_formats: points,
        }
    }

    #[test]
    fn fixed_entries_resolve_under_their_own_id() {
        let sig = sig(vec![29], vec![0]);
        for id in [
            0u16, 5, 10, 11, 13, 16, 18, 21, 23, 27, 28, 35, 43, 44, 45, 51, 13172, 65281,
        ] {
            let ext = resolve(id, &sig).unwrap();
            assert_eq!(ext.id(), id);
        }
    }

    #[test]
    fn unknown_id_carries_the_offending_value() {
        let sig = sig(vec![], vec![]);
        assert_eq!(
            resolve(999, &sig).unwrap_err(),
            Ja3Error::UnsupportedExtension { id: 999 }
        );
    }

    #[test]
    fn parametric_entries_come_from_the_signature() {
        let sig = sig(vec![29, 23, 24], vec![0, 1]);
        assert_eq!(
            resolve(10, &sig).unwrap(),
            Extension::SupportedGroups(vec![29, 23, 24])
        );
        assert_eq!(
            resolve(11, &sig).unwrap(),
            Extension::EcPointFormats(vec![0, 1])
        );
    }

    #[test]
    fn concurrent_resolution_never_leaks_across_signatures() {
        let a = sig(vec![29, 23, 24], vec![0]);
        let b = sig(vec![256, 257], vec![1, 2]);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (mine, groups) = if i % 2 == 0 {
                    (a.clone(), vec![29u16, 23, 24])
                } else {
                    (b.clone(), vec![256u16, 257])
                };
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let ext = resolve(10, &mine).unwrap();
                        assert_eq!(ext, Extension::SupportedGroups(groups.clone()));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn supported_versions_leads_with_grease() {
        let sig = sig(vec![], vec![]);
        let ext = resolve(43, &sig).unwrap();
        assert_eq!(
            ext,
            Extension::SupportedVersions(vec![0x0a0a, 0x0304, 0x0303, 0x0302, 0x0301])
        );
    }

    #[test]
    fn boring_padding_heuristic() {
        // Too short and long enough hellos are left alone.
        assert_eq!(boring_padding_len(0xff), (0, false));
        assert_eq!(boring_padding_len(0x200), (0, false));
        // 0x1f0 needs 0x10 total, minus the 4-byte header.
        assert_eq!(boring_padding_len(0x1f0), (0x10 - 4, true));
        // Not enough room for the header: a single padding byte.
        assert_eq!(boring_padding_len(0x1ff), (1, true));
    }

    #[test]
    fn grease_detection() {
        assert!(is_grease(0x0a0a));
        assert!(is_grease(0xfafa));
        assert!(!is_grease(0x0001));
        assert!(!is_grease(0xc02f));
        assert!(!is_grease(0x0a1a));
    }
}
