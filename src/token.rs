//! Cached identity-token lookup against the credential cache.

use crate::error::{AppError, AppResult};
use crate::storage::CredentialCache;

/// Key prefix the identity provider uses for its cached credentials.
pub const PROVIDER_KEY_PREFIX: &str = "CognitoIdentityServiceProvider";
/// Suffix marking the identity-token entry among the cached credentials.
pub const ID_TOKEN_SUFFIX: &str = ".idToken";

/// First cached identity token whose key matches the provider shape.
/// The cache holds at most one relevant identity per profile; with several
/// matches the pick is arbitrary (unordered storage).
pub fn id_token(cache: &CredentialCache) -> AppResult<String> {
    for (key, value) in cache.entries() {
        if key.starts_with(PROVIDER_KEY_PREFIX) && key.ends_with(ID_TOKEN_SUFFIX) {
            return Ok(value);
        }
    }
    Err(AppError::not_found("id_token_missing", "no cached identity token"))
}
