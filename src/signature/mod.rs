//! Verification of detached or embedded PKCS#7 signed messages.
//!
//! A message is accepted only if its signature verifies, its signer certificate
//! chains to a root of the given [`TrustPool`], and any embedded content equals the
//! payload the caller expected to be signed.

mod envelope;
pub mod error;
mod layout;

pub use envelope::{SignedEnvelope, SignerRecord};
pub use error::{EnvelopeError, VerifyError, VerifyErrorKind};

use crate::cert::Certificate;
use crate::identity::{self, VerifiedIdentity};
use crate::prelude::{debug, warn};
use crate::trust_store::TrustPool;
use openssl::stack::Stack;
use openssl::x509::{X509StoreContext, X509};

/// Verifies `envelope_text` as a signature over `content`, against the roots in `pool`.
///
/// Steps, in order, stopping at the first failure:
/// 1. the text must carry the signed-message marker;
/// 2. the message must parse as PKCS#7 signed data with at least one signer;
/// 3. every signature must verify cryptographically, over the embedded content or,
///    for a detached signature, over `content`;
/// 4. embedded content must equal `content` byte for byte;
/// 5. the first signer's certificate must chain to a root in `pool`, using the
///    message's own certificates as intermediates.
///
/// On success the first signer's identity is returned.
///
/// # Errors
///
/// | Failure                               | Error                                   |
/// |---------------------------------------|-----------------------------------------|
/// | marker absent                         | [`VerifyError::UnrecognizedFormat`]     |
/// | armor or PKCS#7 malformed             | [`VerifyError::Parse`]                  |
/// | no signer records                     | [`VerifyError::NoSigners`]              |
/// | bad signature or untrusted chain      | [`VerifyError::ChainVerification`]      |
/// | embedded content differs              | [`VerifyError::ContentMismatch`]        |
pub fn verify(
    content: &[u8],
    envelope_text: &str,
    pool: &TrustPool,
) -> Result<VerifiedIdentity, VerifyError> {
    match verify_envelope(content, envelope_text, pool) {
        Ok(identity) => {
            debug!(
                "Verified signed message: fingerprint={}, issuer={}",
                identity.fingerprint(),
                identity.issuer()
            );
            Ok(identity)
        }
        Err(e) => {
            warn!(
                "Rejected signed message: kind={:?}, error={}",
                e.kind(),
                e
            );
            Err(e)
        }
    }
}

fn verify_envelope(
    content: &[u8],
    envelope_text: &str,
    pool: &TrustPool,
) -> Result<VerifiedIdentity, VerifyError> {
    let envelope = SignedEnvelope::parse(envelope_text)?;
    envelope.verify_signatures(content, pool)?;

    let signer = envelope.first_signer().ok_or(VerifyError::NoSigners)?;

    if let Some(embedded) = envelope.content() {
        if embedded != content {
            return Err(VerifyError::ContentMismatch);
        }
    }

    verify_certificate_path(signer.certificate(), envelope.certificates(), pool)?;

    Ok(identity::extract(signer.certificate()))
}

/// Checks that `signer` chains to a root in `pool`, with `intermediates` as untrusted
/// path candidates.
fn verify_certificate_path(
    signer: &Certificate,
    intermediates: &[Certificate],
    pool: &TrustPool,
) -> Result<(), VerifyError> {
    let leaf = signer.to_openssl().map_err(VerifyError::chain)?;

    let mut untrusted: Stack<X509> = Stack::new().map_err(VerifyError::chain)?;
    for cert in intermediates {
        let x509 = cert.to_openssl().map_err(VerifyError::chain)?;
        untrusted.push(x509).map_err(VerifyError::chain)?;
    }

    let mut context = X509StoreContext::new().map_err(VerifyError::chain)?;
    let failure = context
        .init(pool.store(), &leaf, &untrusted, |ctx| {
            if ctx.verify_cert()? {
                Ok(None)
            } else {
                Ok(Some(ctx.error()))
            }
        })
        .map_err(VerifyError::chain)?;

    match failure {
        None => Ok(()),
        Some(result) => Err(VerifyError::chain(result.error_string())),
    }
}
