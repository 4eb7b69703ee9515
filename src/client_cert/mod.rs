//! Authentication by TLS client certificate.
//!
//! The transport layer has already validated the peer certificate against its own CA
//! set, so no chain validation happens here. The authenticator only turns the
//! presented certificate into ordered lookup keys; resolving them to an account is
//! left to an [`AccountLookup`] implementation.
//!
//! # Example
//!
//! ```no_run
//! use x509_trust::client_cert::{
//!     resolve_account, AccountLookup, ClientCertAuthenticator, ClientCertOutcome,
//! };
//!
//! struct Directory;
//!
//! impl AccountLookup for Directory {
//!     type Account = u64;
//!     type Error = std::io::Error;
//!
//!     fn find_by_email(&self, email: &str) -> Result<Option<u64>, Self::Error> {
//!         Ok((email == "alice@example.org").then_some(1))
//!     }
//!
//!     fn find_by_name(&self, _name: &str) -> Result<Option<u64>, Self::Error> {
//!         Ok(None)
//!     }
//! }
//!
//! # fn example(peer_chain: &[Vec<u8>]) -> Result<(), Box<dyn std::error::Error>> {
//! let authenticator = ClientCertAuthenticator::new();
//! match authenticator.authenticate(peer_chain)? {
//!     ClientCertOutcome::NoCredential => { /* try the next authentication method */ }
//!     ClientCertOutcome::Candidate(candidate) => {
//!         let account = resolve_account(&candidate, &Directory)?;
//!         println!("signed in as {account:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ClientCertError;

use crate::cert::parsing::{first_email_address, subject_common_name};
use crate::cert::Certificate;
use crate::prelude::debug;

/// A key to look an account up by, extracted from a client certificate.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum LookupKey {
    /// The first email address of the certificate subject.
    Email(String),
    /// The subject common name, matched against account names.
    Name(String),
}

impl LookupKey {
    /// Returns the lookup string.
    pub fn as_str(&self) -> &str {
        match self {
            LookupKey::Email(value) | LookupKey::Name(value) => value,
        }
    }
}

/// Unverified lookup keys extracted from a client certificate, in priority order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CandidateIdentity {
    keys: Vec<LookupKey>,
    certificate: Certificate,
}

impl CandidateIdentity {
    fn from_certificate(certificate: Certificate) -> Result<Self, ClientCertError> {
        let x509 = certificate.parsed()?;

        let mut keys = Vec::with_capacity(2);
        if let Some(email) = first_email_address(&x509).filter(|e| !e.is_empty()) {
            keys.push(LookupKey::Email(email));
        }
        if let Some(name) = subject_common_name(&x509).filter(|n| !n.is_empty()) {
            keys.push(LookupKey::Name(name));
        }
        drop(x509);

        Ok(Self { keys, certificate })
    }

    /// Returns the lookup keys: email first, common name second. Absent keys are omitted.
    pub fn keys(&self) -> &[LookupKey] {
        &self.keys
    }

    /// Returns the email lookup key, if the certificate has one.
    pub fn email(&self) -> Option<&str> {
        self.keys.iter().find_map(|key| match key {
            LookupKey::Email(email) => Some(email.as_str()),
            LookupKey::Name(_) => None,
        })
    }

    /// Returns the common-name lookup key, if the certificate has one.
    pub fn common_name(&self) -> Option<&str> {
        self.keys.iter().find_map(|key| match key {
            LookupKey::Name(name) => Some(name.as_str()),
            LookupKey::Email(_) => None,
        })
    }

    /// Returns the presented certificate, kept for auditing.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

/// Result of a client-certificate authentication attempt.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ClientCertOutcome {
    /// No certificate was presented; the caller should try other methods.
    NoCredential,
    /// A certificate was presented and yielded these candidate keys.
    Candidate(CandidateIdentity),
}

/// Extracts candidate identities from TLS client certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCertAuthenticator;

impl ClientCertAuthenticator {
    /// Name of this authentication method.
    pub const NAME: &'static str = "client_cert";

    /// Creates an authenticator.
    pub fn new() -> Self {
        Self
    }

    /// Returns the name of this authentication method.
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Authenticates from the DER-encoded peer certificate chain, leaf first.
    ///
    /// Only the leaf is inspected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientCertError::Certificate`] if the leaf is not a valid certificate.
    pub fn authenticate<C: AsRef<[u8]>>(
        &self,
        peer_certificates: &[C],
    ) -> Result<ClientCertOutcome, ClientCertError> {
        let Some(leaf) = peer_certificates.first() else {
            return Ok(ClientCertOutcome::NoCredential);
        };

        let certificate = Certificate::try_from(leaf.as_ref())?;
        self.candidate(certificate)
    }

    /// Authenticates from a PEM certificate forwarded by a TLS-terminating proxy.
    ///
    /// `None`, or a blank value, means no certificate was presented.
    ///
    /// # Errors
    ///
    /// Returns [`ClientCertError::Certificate`] if the value is not a PEM certificate.
    pub fn authenticate_pem(
        &self,
        forwarded_pem: Option<&str>,
    ) -> Result<ClientCertOutcome, ClientCertError> {
        match forwarded_pem.map(str::trim) {
            None | Some("") => Ok(ClientCertOutcome::NoCredential),
            Some(pem) => self.candidate(Certificate::from_pem(pem)?),
        }
    }

    fn candidate(&self, certificate: Certificate) -> Result<ClientCertOutcome, ClientCertError> {
        let candidate = CandidateIdentity::from_certificate(certificate)?;
        debug!(
            "Extracted client certificate candidate: fingerprint={}, email={:?}, common_name={:?}",
            candidate.certificate().fingerprint(),
            candidate.email(),
            candidate.common_name()
        );
        Ok(ClientCertOutcome::Candidate(candidate))
    }
}

/// Account store consulted with candidate lookup keys.
pub trait AccountLookup {
    /// The account type returned by the store.
    type Account;

    /// Lookup failure other than "not found".
    type Error;

    /// Finds the account owning `email`. Returns `Ok(None)` if there is none.
    fn find_by_email(&self, email: &str) -> Result<Option<Self::Account>, Self::Error>;

    /// Finds the account named `name`. Returns `Ok(None)` if there is none.
    fn find_by_name(&self, name: &str) -> Result<Option<Self::Account>, Self::Error>;
}

/// Resolves a candidate to an account by trying its keys in priority order.
///
/// A key that matches nothing moves on to the next one; `Ok(None)` means no key matched.
///
/// # Errors
///
/// The first lookup error aborts resolution and is returned unchanged.
pub fn resolve_account<L: AccountLookup>(
    candidate: &CandidateIdentity,
    lookup: &L,
) -> Result<Option<L::Account>, L::Error> {
    for key in candidate.keys() {
        let found = match key {
            LookupKey::Email(email) => lookup.find_by_email(email)?,
            LookupKey::Name(name) => lookup.find_by_name(name)?,
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}
