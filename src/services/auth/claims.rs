//! Claims carried in a verified bearer token.
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Registered claims every issued/verified token carries, plus everything
/// else under `extra` (tenant and roles live there because their claim names
/// are configurable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        // Out-of-range exp values collapse to the epoch, i.e. "long expired".
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Renders a claim value the way it ends up in `additionalClaims`:
/// strings stay as-is, sequences are comma-joined, everything else uses its
/// JSON rendering.
pub fn claim_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(claim_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
