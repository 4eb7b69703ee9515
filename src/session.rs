//! Typed session state for certificate-based sign-in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a signed-in account.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Wraps a raw account identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session data relevant to authentication.
///
/// Serialized as `{"uid": <id>}`, or `{}` for an anonymous session.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    account_id: Option<AccountId>,
}

impl SessionPayload {
    /// Creates a session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a session signed in as `account`.
    pub fn signed_in(account: AccountId) -> Self {
        Self {
            account_id: Some(account),
        }
    }

    /// Returns the signed-in account, if any.
    pub fn account_id(&self) -> Option<AccountId> {
        self.account_id
    }

    /// Returns `true` unless the session is already signed in as `account`.
    pub fn needs_sign_in(&self, account: AccountId) -> bool {
        self.account_id != Some(account)
    }

    /// Records `account` as the signed-in account.
    pub fn sign_in(&mut self, account: AccountId) {
        self.account_id = Some(account);
    }

    /// Clears the signed-in account.
    pub fn sign_out(&mut self) {
        self.account_id = None;
    }
}

/// The kind of request a certificate login happened on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RequestSurface {
    /// An interactive web page.
    Web,
    /// An API call.
    Api,
    /// An attachment download.
    AttachmentDownload,
    /// Raw repository content, archives or large-file transfers.
    RepositoryContent,
}

impl RequestSurface {
    /// Returns `true` if a certificate login on this surface should establish a session.
    ///
    /// Non-interactive surfaces authenticate every request on its own.
    pub fn establishes_session(self) -> bool {
        matches!(self, RequestSurface::Web)
    }
}

/// Decides whether a successful certificate login for `account` must sign the session in.
///
/// `session` is `None` when the request carries no session store at all.
pub fn should_establish_session(
    surface: RequestSurface,
    session: Option<&SessionPayload>,
    account: AccountId,
) -> bool {
    surface.establishes_session() && session.is_some_and(|s| s.needs_sign_in(account))
}
