use std::path::PathBuf;

/// An error that may arise loading a trust store.
///
/// Every variant aborts the load; the previously active pool is unaffected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TrustStoreError {
    /// The directory, or one of its subdirectories, could not be traversed.
    #[error("failed traversing trust store directory {}", path.display())]
    Walk {
        /// Root directory being loaded.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// A certificate file could not be read.
    #[error("failed reading trust store file {}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// OpenSSL failed building the certificate store.
    #[error("failed building certificate store")]
    Store(#[from] openssl::error::ErrorStack),
}

impl TrustStoreError {
    /// Returns `true` for errors caused by file system access.
    pub fn is_io(&self) -> bool {
        matches!(self, TrustStoreError::Walk { .. } | TrustStoreError::Io { .. })
    }
}
