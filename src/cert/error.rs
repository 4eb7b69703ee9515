//! Error types for certificate parsing.

use x509_parser::error::{PEMError, X509Error};

/// An error that may arise parsing X.509 certificates.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    /// Error returned by the X.509 parsing library.
    #[error("failed parsing X.509 certificate")]
    ParseX509Certificate(#[from] X509Error),

    /// The input does not contain a decodable PEM block.
    #[error("no PEM block found in input")]
    MissingPemBlock,

    /// The PEM block could not be decoded.
    #[error("failed decoding PEM block: {0}")]
    Pem(String),

    /// The first PEM block is not a certificate.
    #[error("unexpected PEM label `{0}`, expected `CERTIFICATE`")]
    UnexpectedPemLabel(String),
}

impl From<PEMError> for CertificateError {
    fn from(err: PEMError) -> Self {
        match err {
            PEMError::MissingHeader => CertificateError::MissingPemBlock,
            other => CertificateError::Pem(other.to_string()),
        }
    }
}
