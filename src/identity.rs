//! Identity descriptors derived from verified certificates.

use crate::cert::parsing::{first_email_address, issuer_common_name, subject_common_name};
use crate::cert::{Certificate, Fingerprint};

/// The identity of a signer whose signature and certificate chain were verified.
///
/// Only produced after verification succeeds, so holding one is proof that
/// `certificate` chains to a trusted root.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VerifiedIdentity {
    certificate: Certificate,
    issuer: String,
    common_name: Option<String>,
    email: Option<String>,
    fingerprint: Fingerprint,
}

impl VerifiedIdentity {
    /// Returns the signer certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Returns the issuer common name, or an empty string if the issuer has none.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the subject common name, if present.
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// Returns the first subject email address, if present.
    ///
    /// Absence is not an error here; callers decide how to treat it.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the SHA-256 fingerprint of the signer certificate.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// Derives a [`VerifiedIdentity`] from a certificate already proven chain-valid.
///
/// Total: certificates are validated at construction, and any field that cannot
/// be read is reported as absent rather than as an error.
pub fn extract(certificate: &Certificate) -> VerifiedIdentity {
    let (issuer, common_name, email) = match certificate.parsed() {
        Ok(x509) => (
            issuer_common_name(&x509).unwrap_or_default(),
            subject_common_name(&x509),
            first_email_address(&x509),
        ),
        Err(_) => (String::new(), None, None),
    };

    VerifiedIdentity {
        certificate: certificate.clone(),
        issuer,
        common_name,
        email,
        fingerprint: certificate.fingerprint(),
    }
}
