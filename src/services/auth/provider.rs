//! Pluggable credential verification.
use async_trait::async_trait;
use tracing::debug;

use crate::services::auth::error::SecurityError;
use crate::services::auth::user_info::UserInfo;

/// A way to turn an `Authorization` header value into an identity.
///
/// Providers are consulted in registration order. Returning `Ok(None)` means
/// "not my credential type, ask the next one"; returning an error stops the
/// chain.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authenticate(&self, authorization: &str)
        -> Result<Option<UserInfo>, SecurityError>;
}

/// Extract the token from a `Bearer` authorization header value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller's identity from the `Authorization` header.
///
/// No header (or a blank one) is an anonymous request, not an error. A
/// present header must be claimed by some provider; otherwise the
/// credentials are rejected.
pub async fn resolve_identity(
    providers: &[Box<dyn AuthenticationProvider>],
    authorization: Option<&str>,
) -> Result<UserInfo, SecurityError> {
    let Some(authorization) = authorization.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(UserInfo::anonymous().clone());
    };

    for provider in providers {
        if let Some(user_info) = provider.authenticate(authorization).await? {
            debug!(provider = provider.name(), user = user_info.login(), "authenticated");
            return Ok(user_info);
        }
    }
    debug!("no provider recognized the presented credentials");
    Err(SecurityError::InvalidCredentials)
}
