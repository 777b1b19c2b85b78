//! Self-signed token issuance (dev/test tooling, same trust boundary as
//! verification).
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value, json};
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::user_info::UserInfo;

/// Signs bearer tokens for a given identity and validity window.
///
/// The signature algorithm is implied by the configured private key type
/// (RSA -> RS256, EC -> ES256), resolved at configuration time.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    issuer: String,
    claim_tenant: String,
    claim_roles: String,
}

impl TokenSigner {
    pub fn new(
        encoding_key: EncodingKey,
        algorithm: Algorithm,
        issuer: String,
        claim_tenant: String,
        claim_roles: String,
    ) -> Self {
        Self {
            encoding_key,
            algorithm,
            issuer,
            claim_tenant,
            claim_roles,
        }
    }

    /// Issue a compact JWT for the identity, valid in
    /// `[valid_from, valid_from + validity)`.
    pub fn create_token(
        &self,
        user_info: &UserInfo,
        valid_from: DateTime<Utc>,
        validity: Duration,
    ) -> Result<String, AppError> {
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(self.issuer));
        claims.insert("jti".to_string(), json!(Uuid::new_v4().to_string()));
        claims.insert("iat".to_string(), json!(valid_from.timestamp()));
        claims.insert("nbf".to_string(), json!(valid_from.timestamp()));
        claims.insert("exp".to_string(), json!((valid_from + validity).timestamp()));
        claims.insert("sub".to_string(), json!(user_info.login()));
        if let Some(tenant) = user_info.tenant() {
            claims.insert(self.claim_tenant.clone(), json!(tenant));
        }
        if !user_info.roles().is_empty() {
            // BTreeSet iterates sorted, the serialized collection is stable
            let roles: Vec<&str> = user_info.roles().iter().map(String::as_str).collect();
            claims.insert(self.claim_roles.clone(), json!(roles));
        }
        for (key, value) in user_info.additional_claims() {
            claims.insert(key.clone(), Value::String(value.clone()));
        }

        let header = Header::new(self.algorithm);
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign token");
            AppError::Internal
        })
    }
}
