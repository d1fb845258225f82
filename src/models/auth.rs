use serde::{Deserialize, Serialize};

/// Access credentials for one user, persisted through a `TokenStore`.
/// Replaced wholesale on re-authentication, deleted on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthTokenSet {
    pub token: String,
    pub token_secret: String,
    pub username: String,
}
