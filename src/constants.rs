//! Module defining constants used within the x509-trust library.

/// Literal marker that opens an ASCII-armored signed message.
///
/// Signature text that does not contain this marker is rejected before any
/// parsing work is attempted.
pub const SIGNED_MESSAGE_BEGIN: &str = "-----BEGIN SIGNED MESSAGE-----";

/// Literal marker that closes an ASCII-armored signed message.
pub const SIGNED_MESSAGE_END: &str = "-----END SIGNED MESSAGE-----";

/// File extension (without the dot) of the files scanned when loading a trust store.
pub const TRUST_STORE_FILE_EXTENSION: &str = "pem";

/// Default location of the trusted root certificates directory.
pub const DEFAULT_TRUST_STORE_PATH: &str = "custom/trust-certs";

/// PEM label of a certificate block.
pub const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";
