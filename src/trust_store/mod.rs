//! Trusted root certificates.
//!
//! A [`TrustPool`] is an immutable snapshot of root certificates loaded from a
//! directory of PEM files. A [`TrustStore`] holds the active pool and replaces it
//! atomically, so verifications already holding a snapshot keep using it unchanged
//! while new verifications pick up the replacement.
//!
//! # Example
//!
//! ```no_run
//! use x509_trust::{TrustPool, TrustStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = TrustStore::open("custom/trust-certs")?;
//!
//! // An operator added a PEM file: rebuild and swap in one step.
//! store.reload()?;
//!
//! // Or build a pool elsewhere and swap it in explicitly.
//! let pool = TrustPool::load("/etc/x509/roots")?;
//! let previous = store.swap(pool);
//! # drop(previous);
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::TrustStoreError;

use crate::cert::parsing::scan_pem_certificates;
use crate::cert::{Certificate, Fingerprint};
use crate::config::X509Settings;
use crate::constants::TRUST_STORE_FILE_EXTENSION;
use crate::identity::VerifiedIdentity;
use crate::prelude::{debug, info, warn};
use crate::signature::{self, VerifyError};
use arc_swap::ArcSwap;
use openssl::x509::store::{X509Store, X509StoreBuilder, X509StoreRef};
use openssl::x509::X509PurposeId;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt::{self, Debug};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// An immutable set of trusted root certificates.
///
/// Once built, a pool never changes; a reload builds a new pool.
pub struct TrustPool {
    certificates: Vec<Certificate>,
    store: X509Store,
}

impl TrustPool {
    /// Creates a pool that trusts nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Store`] if OpenSSL cannot allocate the store.
    pub fn empty() -> Result<Self, TrustStoreError> {
        Self::from_certificates(Vec::new())
    }

    /// Builds a pool from already-parsed root certificates.
    ///
    /// Duplicate certificates (same fingerprint) are kept once; the first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Store`] if a certificate cannot be added to the OpenSSL store.
    pub fn from_certificates(certificates: Vec<Certificate>) -> Result<Self, TrustStoreError> {
        let mut seen = HashSet::with_capacity(certificates.len());
        let certificates: Vec<Certificate> = certificates
            .into_iter()
            .filter(|cert| seen.insert(cert.fingerprint()))
            .collect();

        let mut builder = X509StoreBuilder::new()?;
        // Signers must be fit for S/MIME signing, extended key usage included.
        builder.set_purpose(X509PurposeId::SMIME_SIGN)?;
        for cert in &certificates {
            builder.add_cert(cert.to_openssl()?)?;
        }

        Ok(Self {
            certificates,
            store: builder.build(),
        })
    }

    /// Recursively scans `directory` for `*.pem` files and builds a pool from every
    /// certificate they contain.
    ///
    /// Files with another extension are ignored. PEM blocks that are not certificates,
    /// or do not parse, are dropped with a warning rather than failing the load.
    ///
    /// # Errors
    ///
    /// - [`TrustStoreError::Walk`] if the directory (or a subdirectory) cannot be traversed,
    ///   including when it does not exist.
    /// - [`TrustStoreError::Io`] if a `*.pem` file cannot be read.
    /// - [`TrustStoreError::Store`] if the OpenSSL store cannot be built.
    pub fn load(directory: impl AsRef<Path>) -> Result<Self, TrustStoreError> {
        let directory = directory.as_ref();
        let mut certificates = Vec::new();
        let mut files = 0usize;

        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry.map_err(|source| TrustStoreError::Walk {
                path: directory.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_dir() || !has_trust_store_extension(entry.path()) {
                continue;
            }

            let data = fs::read(entry.path()).map_err(|source| TrustStoreError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            files += 1;

            let scan = scan_pem_certificates(&data);
            if scan.malformed > 0 {
                warn!(
                    "Skipping malformed PEM blocks in trust store file: path={}, skipped={}",
                    entry.path().display(),
                    scan.malformed
                );
            }
            if scan.ignored > 0 {
                debug!(
                    "Ignoring non-certificate PEM blocks: path={}, ignored={}",
                    entry.path().display(),
                    scan.ignored
                );
            }
            certificates.extend(scan.certificates);
        }

        let pool = Self::from_certificates(certificates)?;
        info!(
            "Loaded trust store: directory={}, files={}, certificates={}",
            directory.display(),
            files,
            pool.len()
        );
        Ok(pool)
    }

    /// Returns the trusted root certificates.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Returns the number of trusted root certificates.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Returns `true` if the pool trusts nothing.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Returns `true` if a certificate with the given fingerprint is a trusted root.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.certificates
            .iter()
            .any(|cert| &cert.fingerprint() == fingerprint)
    }

    /// Verifies a signed message against this pool.
    ///
    /// See [`signature::verify`].
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] if the message is not accepted.
    pub fn verify(
        &self,
        content: &[u8],
        envelope_text: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        signature::verify(content, envelope_text, self)
    }

    pub(crate) fn store(&self) -> &X509StoreRef {
        &self.store
    }
}

impl Debug for TrustPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustPool")
            .field("certificates", &self.certificates.len())
            .field("store", &"<X509Store>")
            .finish()
    }
}

fn has_trust_store_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(TRUST_STORE_FILE_EXTENSION))
}

/// Holder of the process-wide active [`TrustPool`].
///
/// Cloning a `TrustStore` yields another handle to the same active pool.
#[derive(Clone, Debug)]
pub struct TrustStore {
    inner: Arc<Inner>,
}

struct Inner {
    // Directory the pool is (re)loaded from.
    directory: PathBuf,

    // Atomically replaced, last-known-good pool.
    pool: ArcSwap<TrustPool>,

    // Incremented on every swap.
    generation: AtomicU64,
}

impl Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("directory", &self.directory)
            .field("pool", &"<ArcSwap<TrustPool>>")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

impl TrustStore {
    /// Loads the pool from `directory` and makes it active.
    ///
    /// # Errors
    ///
    /// Returns a [`TrustStoreError`] if the initial load fails; see [`TrustPool::load`].
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, TrustStoreError> {
        let directory = directory.into();
        let pool = TrustPool::load(&directory)?;
        Ok(Self::with_pool(directory, pool))
    }

    /// Opens the store at the directory named by the settings.
    ///
    /// # Errors
    ///
    /// Returns a [`TrustStoreError`] if the initial load fails.
    pub fn from_settings(settings: &X509Settings) -> Result<Self, TrustStoreError> {
        Self::open(settings.trust_store_path())
    }

    /// Creates a store with an already-built pool.
    ///
    /// `directory` is only used by [`TrustStore::reload`].
    pub fn with_pool(directory: impl Into<PathBuf>, pool: TrustPool) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory: directory.into(),
                pool: ArcSwap::from_pointee(pool),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the directory the store reloads from.
    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    /// Returns the active pool.
    ///
    /// The returned snapshot stays valid and unchanged even if the pool is swapped
    /// while the caller still holds it.
    pub fn snapshot(&self) -> Arc<TrustPool> {
        self.inner.pool.load_full()
    }

    /// Returns the number of swaps performed since the store was created.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Atomically replaces the active pool and returns the previous one.
    ///
    /// Never blocks on in-flight verifications; they finish against the pool they loaded.
    pub fn swap(&self, pool: TrustPool) -> Arc<TrustPool> {
        let certificates = pool.len();
        let previous = self.inner.pool.swap(Arc::new(pool));
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

        info!(
            "Swapped active trust pool: generation={}, certificates={}, previous={}",
            generation,
            certificates,
            previous.len()
        );
        previous
    }

    /// Loads the pool again from [`TrustStore::directory`] and swaps it in.
    ///
    /// Returns the number of certificates in the new pool.
    ///
    /// # Errors
    ///
    /// Returns a [`TrustStoreError`] if the load fails. The active pool is left in
    /// force, so a failed reload never leaves the process without a trust pool.
    pub fn reload(&self) -> Result<usize, TrustStoreError> {
        let pool = TrustPool::load(&self.inner.directory).map_err(|e| {
            warn!(
                "Trust store reload failed, keeping active pool: directory={}, error={}",
                self.inner.directory.display(),
                e
            );
            e
        })?;

        let count = pool.len();
        self.swap(pool);
        Ok(count)
    }

    /// Verifies a signed message against the active pool.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] if the message is not accepted.
    pub fn verify_signature(
        &self,
        content: &[u8],
        envelope_text: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        self.snapshot().verify(content, envelope_text)
    }
}
