#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! X.509 trust for a code-hosting service: a reloadable pool of trusted root
//! certificates, verification of PKCS#7 (S/MIME) signed messages against it, and
//! identity extraction from TLS client certificates.
//!
//! # Examples
//!
//! ```no_run
//! use x509_trust::{TrustStore, VerifyError, X509Settings};
//!
//! # fn some_function(commit: &[u8], signature: &str) -> Result<(), Box<dyn std::error::Error>> {
//! // load every `*.pem` file under the configured directory
//! let store = TrustStore::from_settings(&X509Settings::default())?;
//!
//! // verify a detached signature over a commit payload
//! match store.verify_signature(commit, signature) {
//!     Ok(identity) => {
//!         println!("signed by {:?} <{:?}>", identity.common_name(), identity.email());
//!         println!("issuer: {}, fingerprint: {}", identity.issuer(), identity.fingerprint());
//!     }
//!     Err(VerifyError::UnrecognizedFormat) => { /* not an S/MIME signature */ }
//!     Err(e) if e.is_security_relevant() => eprintln!("rejected signature: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//!
//! // an operator added a root certificate: rebuild the pool and swap it in
//! store.reload()?;
//! # Ok(())
//! # }
//! ```

pub mod cert;
pub mod client_cert;
pub mod config;
pub mod constants;
pub mod identity;
pub mod session;
pub mod signature;
pub mod trust_store;

mod observability;
mod prelude;

// -----------------------
// Re-exports
// -----------------------

pub use crate::{
    cert::{error::CertificateError, Certificate, CertificateRecord, Fingerprint},
    client_cert::{
        resolve_account, AccountLookup, CandidateIdentity, ClientCertAuthenticator,
        ClientCertError, ClientCertOutcome, LookupKey,
    },
    config::{ClientCertSourceConfig, ConfigError, X509Settings},
    identity::{extract, VerifiedIdentity},
    session::{AccountId, RequestSurface, SessionPayload},
    signature::{
        verify as verify_signature, EnvelopeError, SignedEnvelope, SignerRecord, VerifyError,
        VerifyErrorKind,
    },
    trust_store::{TrustPool, TrustStore, TrustStoreError},
};
