//! Internal parsing helpers.

use crate::cert::error::CertificateError;
use crate::cert::Certificate;
use crate::constants::PEM_CERTIFICATE_LABEL;
use x509_parser::certificate::X509Certificate;
use x509_parser::error::X509Error;
use x509_parser::nom::Err;
use x509_parser::pem::{parse_x509_pem, Pem};

/// Outcome of scanning a PEM bundle for certificates.
#[derive(Debug, Default)]
pub(crate) struct PemScan {
    pub(crate) certificates: Vec<Certificate>,
    /// Blocks that were not certificates (other labels).
    pub(crate) ignored: usize,
    /// Certificate blocks, or undecodable blocks, that were dropped.
    pub(crate) malformed: usize,
}

/// Collects every parseable `CERTIFICATE` block from a PEM bundle.
///
/// Never fails: blocks with another label are ignored, and blocks that do not
/// decode or do not parse as X.509 are counted as malformed and dropped.
pub(crate) fn scan_pem_certificates(pem_data: &[u8]) -> PemScan {
    let mut scan = PemScan::default();

    for block in Pem::iter_from_buffer(pem_data) {
        let pem = match block {
            Ok(pem) => pem,
            Err(_) => {
                scan.malformed += 1;
                continue;
            }
        };

        if pem.label != PEM_CERTIFICATE_LABEL {
            scan.ignored += 1;
            continue;
        }

        match Certificate::try_from(pem.contents) {
            Ok(cert) => scan.certificates.push(cert),
            Err(_) => scan.malformed += 1,
        }
    }

    scan
}

/// Decodes the first PEM block of `pem_data` and returns its DER contents.
///
/// The block must carry the `CERTIFICATE` label.
pub(crate) fn first_pem_certificate_der(pem_data: &[u8]) -> Result<Vec<u8>, CertificateError> {
    let (_, pem) = parse_x509_pem(pem_data).map_err(|e| match e {
        Err::Incomplete(_) => CertificateError::MissingPemBlock,
        Err::Error(err) | Err::Failure(err) => CertificateError::from(err),
    })?;

    if pem.label != PEM_CERTIFICATE_LABEL {
        return Err(CertificateError::UnexpectedPemLabel(pem.label));
    }

    Ok(pem.contents)
}

/// Parses the given DER-encoded bytes as an X.509 certificate.
///
/// Returns a [`CertificateError`] if the input is not a parseable DER-encoded X.509 certificate.
pub(crate) fn parse_der_encoded_bytes_as_x509_certificate(
    der_bytes: &[u8],
) -> Result<X509Certificate<'_>, CertificateError> {
    match x509_parser::parse_x509_certificate(der_bytes) {
        Ok((_, cert)) => Ok(cert),
        Err(Err::Incomplete(_)) => Err(CertificateError::ParseX509Certificate(
            X509Error::InvalidCertificate,
        )),
        Err(Err::Error(e) | Err::Failure(e)) => Err(CertificateError::ParseX509Certificate(e)),
    }
}

/// Returns the first subject common name, if any.
pub(crate) fn subject_common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

/// Returns the first issuer common name, if any.
pub(crate) fn issuer_common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.issuer()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

/// Returns the first RFC 822 name of the subject alternative name extension.
///
/// A missing or unparseable extension yields `None`.
pub(crate) fn first_email_address(cert: &X509Certificate<'_>) -> Option<String> {
    use x509_parser::extensions::GeneralName;

    let san = cert.subject_alternative_name().ok().flatten()?;
    san.value.general_names.iter().find_map(|name| match name {
        GeneralName::RFC822Name(email) => Some((*email).to_owned()),
        _ => None,
    })
}
