//! Error types for signed-message parsing and verification.

use x509_parser::asn1_rs;

/// An error that may arise decoding the structure of a signed message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EnvelopeError {
    /// The armor is missing its closing marker.
    #[error("signed message is missing its end marker")]
    MissingEndMarker,

    /// The armored body is not valid base64.
    #[error("signed message body is not valid base64")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a PKCS#7 structure OpenSSL accepts.
    #[error("failed decoding PKCS#7 structure: {0}")]
    Pkcs7(#[source] openssl::error::ErrorStack),

    /// Error returned by the ASN.1/DER processing library.
    #[error("failed decoding PKCS#7 ASN.1 structure")]
    Der(#[source] asn1_rs::Error),

    /// The structure decodes but does not have the shape of PKCS#7 signed data.
    #[error("malformed PKCS#7 signed data: {0}")]
    Malformed(&'static str),

    /// A signer record refers to a certificate the message does not carry.
    #[error("signer certificate not found in signed message: {0}")]
    MissingSignerCertificate(#[source] openssl::error::ErrorStack),

    /// A certificate embedded in the message is not a parseable X.509 certificate.
    #[error("embedded certificate is invalid")]
    Certificate(#[from] crate::cert::error::CertificateError),
}

/// Broad classification of a [`VerifyError`], for audit logging and status display.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum VerifyErrorKind {
    /// The input is not a signed message, or carries no signer.
    Format,
    /// The signed message is structurally malformed.
    Parse,
    /// The signature or the signer's certificate chain did not verify.
    ChainVerification,
    /// The signed content differs from the expected payload.
    ContentMismatch,
}

/// An error that may arise verifying a signed message.
///
/// None of these are transient: retrying with the same inputs yields the same error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// The text lacks the signed-message marker.
    #[error("not a recognized signed-message format")]
    UnrecognizedFormat,

    /// The signed message carries no signer records.
    #[error("no signers found in the signature")]
    NoSigners,

    /// The signed message could not be parsed.
    #[error("malformed signed message")]
    Parse(#[from] EnvelopeError),

    /// The cryptographic signature or the certificate chain is not valid.
    #[error("signature verification failed: {reason}")]
    ChainVerification {
        /// Reason reported by the verification library.
        reason: String,
    },

    /// The embedded signed content does not match the expected payload.
    #[error("signed content does not match the expected payload")]
    ContentMismatch,
}

impl VerifyError {
    /// Returns the taxonomy this error belongs to.
    pub fn kind(&self) -> VerifyErrorKind {
        match self {
            VerifyError::UnrecognizedFormat | VerifyError::NoSigners => VerifyErrorKind::Format,
            VerifyError::Parse(_) => VerifyErrorKind::Parse,
            VerifyError::ChainVerification { .. } => VerifyErrorKind::ChainVerification,
            VerifyError::ContentMismatch => VerifyErrorKind::ContentMismatch,
        }
    }

    /// Returns `true` for failures that may indicate tampering or an untrusted signer.
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self.kind(),
            VerifyErrorKind::ChainVerification | VerifyErrorKind::ContentMismatch
        )
    }

    pub(crate) fn chain(reason: impl ToString) -> Self {
        VerifyError::ChainVerification {
            reason: reason.to_string(),
        }
    }
}
