use std::fmt;
use std::str::FromStr;

use crate::error::{Ja3Error, SignatureField};

/// A parsed JA3 signature.
///
/// Order in every sequence is the fingerprint: nothing is sorted,
/// deduplicated, or otherwise normalized, and the struct is never mutated
/// after parsing. The wire format is five comma-separated fields, each a
/// hyphen-separated decimal list:
/// `"771,4865-4866-4867,0-23-13-5,29-23-24,0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja3Signature {
    pub version: u16,
    pub cipher_suites: Vec<u16>,
    pub extension_ids: Vec<u16>,
    pub supported_groups: Vec<u16>,
    pub point_formats: Vec<u8>,
}

impl Ja3Signature {
    pub fn parse(ja3: &str) -> Result<Self, Ja3Error> {
        ja3.parse()
    }

    /// Hex MD5 of the canonical JA3 string, the digest fingerprint databases
    /// key on.
    pub fn md5_hash(&self) -> String {
        format!("{:x}", md5::compute(self.to_string().as_bytes()))
    }
}

fn parse_scalar<T>(field: SignatureField, token: &str) -> Result<T, Ja3Error>
where
    T: FromStr,
{
    token.parse().map_err(|_| Ja3Error::InvalidToken {
        field,
        token: token.to_string(),
    })
}

fn parse_list<T>(field: SignatureField, raw: &str) -> Result<Vec<T>, Ja3Error>
where
    T: FromStr,
{
    // Absent lists (groups, point formats) arrive as the empty string.
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split('-').map(|tok| parse_scalar(field, tok)).collect()
}

impl FromStr for Ja3Signature {
    type Err = Ja3Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').collect();
        if fields.len() != 5 {
            return Err(Ja3Error::MalformedSignature {
                fields: fields.len(),
            });
        }

        Ok(Self {
            version: parse_scalar(SignatureField::Version, fields[0])?,
            cipher_suites: parse_list(SignatureField::CipherSuites, fields[1])?,
            extension_ids: parse_list(SignatureField::Extensions, fields[2])?,
            supported_groups: parse_list(SignatureField::SupportedGroups, fields[3])?,
            point_formats: parse_list(SignatureField::PointFormats, fields[4])?,
        })
    }
}

fn join_list<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for Ja3Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.version,
            join_list(&self.cipher_suites),
            join_list(&self.extension_ids),
            join_list(&self.supported_groups),
            join_list(&self.point_formats),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_SIG: &str = "771,4865-4866-4867-49196-49195-49188-49187-49162-49161-52393-49200-49199-49192-49191-49172-49171-52392-157-156-61-60-53-47-49160-49170-10,65281-0-23-13-5-18-16-11-51-45-43-10-21,29-23-24-25,0";

    #[test]
    fn parse_preserves_order_verbatim() {
        let sig = Ja3Signature::parse("771,4865-4866-4867,0-23-13-5,29-23-24,0").unwrap();
        assert_eq!(sig.version, 771);
        assert_eq!(sig.cipher_suites, vec![4865, 4866, 4867]);
        assert_eq!(sig.extension_ids, vec![0, 23, 13, 5]);
        assert_eq!(sig.supported_groups, vec![29, 23, 24]);
        assert_eq!(sig.point_formats, vec![0]);
    }

    #[test]
    fn display_round_trips_well_formed_input() {
        let sig = Ja3Signature::parse(CHROME_SIG).unwrap();
        assert_eq!(sig.to_string(), CHROME_SIG);
    }

    #[test]
    fn round_trips_empty_trailing_fields() {
        let sig = Ja3Signature::parse("771,4865,23,,").unwrap();
        assert!(sig.supported_groups.is_empty());
        assert!(sig.point_formats.is_empty());
        assert_eq!(sig.to_string(), "771,4865,23,,");
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            Ja3Signature::parse("771,4865,23,29").unwrap_err(),
            Ja3Error::MalformedSignature { fields: 4 }
        );
        assert_eq!(
            Ja3Signature::parse("771,4865,23,29,0,1").unwrap_err(),
            Ja3Error::MalformedSignature { fields: 6 }
        );
    }

    #[test]
    fn rejects_non_numeric_token() {
        assert_eq!(
            Ja3Signature::parse("771,4865-xyz,23,29,0").unwrap_err(),
            Ja3Error::InvalidToken {
                field: SignatureField::CipherSuites,
                token: "xyz".to_string(),
            }
        );
    }

    #[test]
    fn rejects_out_of_range_tokens() {
        // 70000 overflows u16 in the extensions field.
        assert_eq!(
            Ja3Signature::parse("771,4865,70000,29,0").unwrap_err(),
            Ja3Error::InvalidToken {
                field: SignatureField::Extensions,
                token: "70000".to_string(),
            }
        );
        // Point formats are 8-bit wide.
        assert_eq!(
            Ja3Signature::parse("771,4865,23,29,256").unwrap_err(),
            Ja3Error::InvalidToken {
                field: SignatureField::PointFormats,
                token: "256".to_string(),
            }
        );
    }

    #[test]
    fn rejects_bad_version() {
        assert_eq!(
            Ja3Signature::parse("tls12,4865,23,29,0").unwrap_err(),
            Ja3Error::InvalidToken {
                field: SignatureField::Version,
                token: "tls12".to_string(),
            }
        );
    }

    #[test]
    fn md5_hash_matches_known_chrome_digest() {
        let sig = Ja3Signature::parse(CHROME_SIG).unwrap();
        assert_eq!(sig.md5_hash(), "6fa3244afc6bb6f9fad207b6b52af26b");
    }
}
