//! PEM encoding of trust-store entries
//!
//! Store entries arrive as DER blobs. OpenSSL's PEM reader consumes them as
//! base64 text wrapped at 63 columns with CRLF line endings, bracketed by
//! `-----BEGIN <TYPE>-----` / `-----END <TYPE>-----` lines.

use std::fmt;

/// Base64 characters per PEM body line
pub const LINE_LENGTH: usize = 63;

/// PEM line ending
pub const CRLF: &str = "\r\n";

/// Certificate encoding flags reported by the trust store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingType(pub u32);

impl EncodingType {
    /// ASN.1 DER X.509 encoding
    pub const X509_ASN: EncodingType = EncodingType(0x0000_0001);
    /// ASN.1 DER PKCS#7 encoding
    pub const PKCS7_ASN: EncodingType = EncodingType(0x0001_0000);

    /// Whether the PKCS#7 flag is set
    pub fn is_pkcs7(&self) -> bool {
        self.0 & Self::PKCS7_ASN.0 == Self::PKCS7_ASN.0
    }
}

impl std::ops::BitOr for EncodingType {
    type Output = EncodingType;

    fn bitor(self, rhs: EncodingType) -> EncodingType {
        EncodingType(self.0 | rhs.0)
    }
}

/// PEM record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PemKind {
    Certificate,
    RevocationList,
    Pkcs7,
}

impl PemKind {
    /// Pick the record type for a store entry. The PKCS#7 flag wins over
    /// the revocation flag.
    pub fn resolve(encoding: EncodingType, is_revocation_list: bool) -> Self {
        if encoding.is_pkcs7() {
            PemKind::Pkcs7
        } else if is_revocation_list {
            PemKind::RevocationList
        } else {
            PemKind::Certificate
        }
    }

    /// Label used in the BEGIN/END lines
    pub fn label(&self) -> &'static str {
        match self {
            PemKind::Certificate => "CERTIFICATE",
            PemKind::RevocationList => "X509 CRL",
            PemKind::Pkcs7 => "PKCS7",
        }
    }
}

impl fmt::Display for PemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Encode a DER blob as a PEM block
///
/// An empty blob yields a block with no body lines.
pub fn encode(der: &[u8], kind: PemKind) -> String {
    let body = openssl::base64::encode_block(der);
    let line_count = body.len().div_ceil(LINE_LENGTH);

    let mut pem = String::with_capacity(body.len() + line_count * CRLF.len() + 64);
    pem.push_str("-----BEGIN ");
    pem.push_str(kind.label());
    pem.push_str("-----");
    pem.push_str(CRLF);

    // base64 output is ASCII, so byte chunks are valid UTF-8
    for line in body.as_bytes().chunks(LINE_LENGTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push_str(CRLF);
    }

    pem.push_str("-----END ");
    pem.push_str(kind.label());
    pem.push_str("-----");
    pem.push_str(CRLF);
    pem
}
