//! Bearer-JWT authentication provider.
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::services::auth::claims::{TokenClaims, claim_to_string};
use crate::services::auth::error::SecurityError;
use crate::services::auth::provider::{AuthenticationProvider, bearer_token};
use crate::services::auth::user_info::UserInfo;
use crate::services::auth::verifier::TokenVerifier;

/// Authenticates `Bearer` tokens that look like compact JWTs.
///
/// Anything else (other schemes, opaque bearer tokens) is passed on to the
/// next provider.
pub struct JwtAuthenticator {
    verifier: Arc<TokenVerifier>,
    claim_tenant: String,
    claim_roles: String,
}

impl JwtAuthenticator {
    pub fn new(verifier: Arc<TokenVerifier>, claim_tenant: String, claim_roles: String) -> Self {
        Self {
            verifier,
            claim_tenant,
            claim_roles,
        }
    }

    fn to_user_info(&self, claims: TokenClaims) -> Result<UserInfo, SecurityError> {
        let mut builder = UserInfo::identity(&claims.sub)
            .map_err(|e| SecurityError::InvalidToken(e.to_string()))?;

        if let Some(tenant) = claims.extra.get(&self.claim_tenant) {
            builder = builder.tenant(claim_to_string(tenant));
        }
        match claims.extra.get(&self.claim_roles) {
            Some(serde_json::Value::Array(items)) => {
                builder = builder.roles(items.iter().map(claim_to_string));
            }
            Some(serde_json::Value::String(role)) => {
                builder = builder.role(role.clone());
            }
            _ => {}
        }
        for (key, value) in &claims.extra {
            if key == &self.claim_tenant || key == &self.claim_roles {
                continue;
            }
            builder = builder.claim(key.clone(), claim_to_string(value));
        }
        Ok(builder.build())
    }
}

/// A compact JWT: three non-empty dot-separated segments, the first of which
/// base64url-decodes to a JSON header with an `alg` field.
fn looks_like_jwt(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return false;
    }
    let Ok(header) = URL_SAFE_NO_PAD.decode(segments[0]) else {
        return false;
    };
    serde_json::from_slice::<serde_json::Value>(&header)
        .map(|header| header.get("alg").is_some())
        .unwrap_or(false)
}

#[async_trait]
impl AuthenticationProvider for JwtAuthenticator {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn authenticate(
        &self,
        authorization: &str,
    ) -> Result<Option<UserInfo>, SecurityError> {
        let Some(token) = bearer_token(authorization) else {
            return Ok(None);
        };
        if !looks_like_jwt(token) {
            return Ok(None);
        }
        let claims = self.verifier.verify(token)?;
        self.to_user_info(claims).map(Some)
    }
}
