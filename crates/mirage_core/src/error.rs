use thiserror::Error;

/// Names the five comma-separated fields of a JA3 string, so an
/// `InvalidToken` error can say exactly where the bad token sat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureField {
    Version,
    CipherSuites,
    Extensions,
    SupportedGroups,
    PointFormats,
}

impl std::fmt::Display for SignatureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignatureField::Version => "version",
            SignatureField::CipherSuites => "cipher-suites",
            SignatureField::Extensions => "extensions",
            SignatureField::SupportedGroups => "supported-groups",
            SignatureField::PointFormats => "point-formats",
        };
        f.write_str(name)
    }
}

/// Failures of the signature-to-spec pipeline. All are detected before any
/// network activity and carry the offending data as typed fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Ja3Error {
    #[error("malformed JA3 signature: expected 5 comma-separated fields, got {fields}")]
    MalformedSignature { fields: usize },

    #[error("invalid token {token:?} in JA3 {field} field")]
    InvalidToken { field: SignatureField, token: String },

    #[error("extension {id} does not exist in the registry")]
    UnsupportedExtension { id: u16 },
}
