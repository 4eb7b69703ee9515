//! ASCII-armored PKCS#7 signed messages.

use crate::cert::Certificate;
use crate::constants::{SIGNED_MESSAGE_BEGIN, SIGNED_MESSAGE_END};
use crate::signature::error::{EnvelopeError, VerifyError};
use crate::signature::layout::SignedDataLayout;
use crate::trust_store::TrustPool;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::{Stack, StackRef};
use openssl::x509::{X509Ref, X509};
use std::fmt::{self, Debug};

/// One signer of a [`SignedEnvelope`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignerRecord {
    certificate: Certificate,
    digest_algorithm: String,
    signature_algorithm: String,
    signature: Vec<u8>,
}

impl SignerRecord {
    /// Returns the signer certificate carried by the message.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Returns the digest algorithm OID in dotted form (e.g. `2.16.840.1.101.3.4.2.1`).
    pub fn digest_algorithm(&self) -> &str {
        &self.digest_algorithm
    }

    /// Returns the signature algorithm OID in dotted form (e.g. `1.2.840.113549.1.1.1`).
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    /// Returns the raw signature bytes of this signer.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// A parsed PKCS#7 signed message.
///
/// Invariant: carries at least one signer record.
pub struct SignedEnvelope {
    der: Vec<u8>,
    content: Option<Vec<u8>>,
    certificates: Vec<Certificate>,
    signers: Vec<SignerRecord>,
    pkcs7: Pkcs7,
}

impl SignedEnvelope {
    /// Parses ASCII-armored signed-message text.
    ///
    /// Text without the `-----BEGIN SIGNED MESSAGE-----` marker is rejected before
    /// any decoding is attempted.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::UnrecognizedFormat`] if the marker is absent.
    /// - [`VerifyError::Parse`] if the armor or the PKCS#7 structure is malformed.
    /// - [`VerifyError::NoSigners`] if the message carries no signer records.
    pub fn parse(text: &str) -> Result<Self, VerifyError> {
        if !text.contains(SIGNED_MESSAGE_BEGIN) {
            return Err(VerifyError::UnrecognizedFormat);
        }

        let raw = decode_armor(text)?;
        let pkcs7 = Pkcs7::from_der(&raw).map_err(EnvelopeError::Pkcs7)?;

        // Re-encoding yields definite-length DER even when the input was BER.
        let der = pkcs7.to_der().map_err(EnvelopeError::Pkcs7)?;
        let layout = SignedDataLayout::decode(&der)?;

        if layout.signer_infos.is_empty() {
            return Err(VerifyError::NoSigners);
        }

        let certificates = match pkcs7.signed().and_then(|signed| signed.certificates()) {
            Some(stack) => to_certificates(stack)?,
            None => Vec::new(),
        };

        let no_extra_certs: Stack<X509> = Stack::new().map_err(EnvelopeError::Pkcs7)?;
        let signer_certs = pkcs7
            .signers(&no_extra_certs, Pkcs7Flags::empty())
            .map_err(EnvelopeError::MissingSignerCertificate)?;

        if signer_certs.len() != layout.signer_infos.len() {
            let mismatch = "signer certificates do not match signer infos";
            return Err(EnvelopeError::Malformed(mismatch).into());
        }

        let signers = layout
            .signer_infos
            .into_iter()
            .zip(signer_certs.iter())
            .map(|(info, cert)| -> Result<SignerRecord, EnvelopeError> {
                Ok(SignerRecord {
                    certificate: to_certificate(cert)?,
                    digest_algorithm: info.digest_algorithm,
                    signature_algorithm: info.signature_algorithm,
                    signature: info.signature,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            der,
            content: layout.content,
            certificates,
            signers,
            pkcs7,
        })
    }

    /// Returns the embedded signed content, or `None` for a detached signature.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Returns every certificate the message carries, signers and intermediates alike.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Returns the signer records, in message order.
    pub fn signers(&self) -> &[SignerRecord] {
        &self.signers
    }

    /// Returns the authoritative signer.
    ///
    /// Multi-signer messages are not disambiguated further: the first signer wins.
    pub fn first_signer(&self) -> Option<&SignerRecord> {
        self.signers.first()
    }

    /// Returns the DER encoding of the PKCS#7 structure.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Verifies the cryptographic signatures and the signers' chains against `pool`.
    ///
    /// A detached message is verified over `detached_content`; an embedded one over
    /// its own content, which the caller must still compare with the expected payload.
    pub(crate) fn verify_signatures(
        &self,
        detached_content: &[u8],
        pool: &TrustPool,
    ) -> Result<(), VerifyError> {
        let no_extra_certs: Stack<X509> = Stack::new().map_err(VerifyError::chain)?;
        let indata = match self.content {
            Some(_) => None,
            None => Some(detached_content),
        };

        self.pkcs7
            .verify(
                &no_extra_certs,
                pool.store(),
                indata,
                None,
                Pkcs7Flags::empty(),
            )
            .map_err(VerifyError::chain)
    }
}

impl Debug for SignedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedEnvelope")
            .field("der_len", &self.der.len())
            .field("content_len", &self.content.as_ref().map(Vec::len))
            .field("certificates", &self.certificates.len())
            .field("signers", &self.signers)
            .finish()
    }
}

/// Extracts and base64-decodes the body between the armor markers.
///
/// Armor header lines (`Key: value`) and blank lines are skipped.
fn decode_armor(text: &str) -> Result<Vec<u8>, EnvelopeError> {
    let body = text
        .split_once(SIGNED_MESSAGE_BEGIN)
        .map_or(text, |(_, rest)| rest);
    let (body, _) = body
        .split_once(SIGNED_MESSAGE_END)
        .ok_or(EnvelopeError::MissingEndMarker)?;

    let encoded: String = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(':'))
        .collect();

    Ok(STANDARD.decode(encoded)?)
}

fn to_certificate(cert: &X509Ref) -> Result<Certificate, EnvelopeError> {
    let der = cert.to_der().map_err(EnvelopeError::Pkcs7)?;
    Ok(Certificate::try_from(der)?)
}

fn to_certificates(stack: &StackRef<X509>) -> Result<Vec<Certificate>, EnvelopeError> {
    stack.iter().map(to_certificate).collect()
}
