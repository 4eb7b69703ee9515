use crate::cert::error::CertificateError;
use crate::cert::{Certificate, Fingerprint};

/// Metadata kept alongside a trusted certificate by a persistence layer.
///
/// Storage itself is a collaborator concern; this type only derives the
/// values from the PEM text an operator submitted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CertificateRecord {
    subject: String,
    issuer: String,
    fingerprint: Fingerprint,
    content: String,
}

impl CertificateRecord {
    /// Builds a record from PEM text holding a certificate.
    ///
    /// Only the first PEM block is considered. `content` keeps the submitted text verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`CertificateError`] if the first PEM block is not a parseable certificate.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        let certificate = Certificate::from_pem(pem)?;
        let x509 = certificate.parsed()?;

        Ok(Self {
            subject: x509.subject().to_string(),
            issuer: x509.issuer().to_string(),
            fingerprint: certificate.fingerprint(),
            content: pem.to_owned(),
        })
    }

    /// Returns the subject distinguished name (RFC 4514 form).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer distinguished name (RFC 4514 form).
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the certificate fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Returns the PEM text the record was built from.
    pub fn content(&self) -> &str {
        &self.content
    }
}
