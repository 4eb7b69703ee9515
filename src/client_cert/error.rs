use crate::cert::error::CertificateError;

/// An error that may arise extracting a candidate identity from a client certificate.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum ClientCertError {
    /// The peer certificate is not a valid X.509 certificate.
    #[error("invalid client certificate")]
    Certificate(#[from] CertificateError),
}
