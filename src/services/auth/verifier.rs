//! Bearer token verification with expiry-aware caching.
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::services::auth::claims::TokenClaims;
use crate::services::auth::error::SecurityError;
use crate::services::cache::TypedCache;

/// Cache for verified token claims, keyed by a SHA-256 of the token so the
/// raw (sensitive, long) token never sits in the store.
pub fn claims_cache(enabled: bool) -> Arc<TypedCache<TokenClaims>> {
    Arc::new(
        TypedCache::enabled_if(enabled)
            .with_key_transform(|token| format!("{:x}", Sha256::digest(token.as_bytes()))),
    )
}

/// Verifies compact JWTs against the configured public key, memoizing
/// successfully verified claims.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    cache: Arc<TypedCache<TokenClaims>>,
}

impl TokenVerifier {
    pub fn new(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        cache: Arc<TypedCache<TokenClaims>>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        Self {
            decoding_key,
            validation,
            cache,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// Cached claims are returned unchanged, but their validity window is
    /// rechecked on every hit: an expired cached entry is evicted and the
    /// call fails, so a stale entry can never mask a refreshed token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, SecurityError> {
        if let Some(claims) = self
            .cache
            .get(token)
            .map_err(|e| SecurityError::InvalidToken(e.to_string()))?
        {
            if claims.expires_at() < Utc::now() {
                let _ = self.cache.evict(token);
                return Err(SecurityError::TokenExpired);
            }
            debug!(sub = %claims.sub, "token verified (cached)");
            return Ok(claims);
        }

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
                _ => SecurityError::InvalidToken(e.to_string()),
            })?;

        // only successfully verified claims are ever cached
        self.cache
            .put(token, data.claims.clone())
            .map_err(|e| SecurityError::InvalidToken(e.to_string()))?;
        debug!(sub = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}
