//! `Certificate` type and helpers.
//!
//! A [`Certificate`] wraps DER-encoded bytes and validates them at construction time.

use crate::cert::error::CertificateError;
use crate::cert::parsing::{
    first_pem_certificate_der, parse_der_encoded_bytes_as_x509_certificate,
};
use openssl::error::ErrorStack;
use openssl::x509::X509;
use x509_parser::certificate::X509Certificate;

pub mod error;
mod fingerprint;
pub(crate) mod parsing;
mod record;

pub use fingerprint::Fingerprint;
pub use record::CertificateRecord;

/// A single DER-encoded X.509 certificate.
///
/// Invariant: instances are always validated as parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Decodes the first PEM block of `pem` and validates it as an X.509 certificate.
    ///
    /// # Errors
    ///
    /// - [`CertificateError::MissingPemBlock`] if no PEM block is present.
    /// - [`CertificateError::UnexpectedPemLabel`] if the block is not a `CERTIFICATE`.
    /// - [`CertificateError::ParseX509Certificate`] if the contents are not a valid certificate.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        let der = first_pem_certificate_der(pem.as_bytes())?;
        Self::try_from(der)
    }

    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the SHA-256 fingerprint of the DER encoding.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_der(&self.0)
    }

    /// Parses the certificate for inspection.
    pub(crate) fn parsed(&self) -> Result<X509Certificate<'_>, CertificateError> {
        parse_der_encoded_bytes_as_x509_certificate(&self.0)
    }

    /// Converts the certificate into an OpenSSL handle for chain building.
    pub(crate) fn to_openssl(&self) -> Result<X509, ErrorStack> {
        X509::from_der(&self.0)
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(der_bytes)?;
        Ok(Self(Vec::from(der_bytes)))
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}
