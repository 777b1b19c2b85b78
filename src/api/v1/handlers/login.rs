//! GET /dev/login/{tenant}/{login}
//!
//! Issues a self-signed token for ad-hoc testing. Only mounted when a
//! private key is configured; never expose this in production.
use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::AppError;
use crate::services::auth::user_info::UserInfo;
use crate::state::AppState;

const PARAM_ROLES: &str = "roles";
const PARAM_VALID_FROM: &str = "valid-from";
const PARAM_DURATION: &str = "duration";

/// Build and sign a token for the given tenant/login.
///
/// Query parameters:
/// - `roles`: comma-separated role list
/// - `valid-from`: RFC 3339 timestamp, defaults to now
/// - `duration`: validity in duration grammar (e.g. `2h30m`), defaults to 1h
/// - anything else becomes an additional claim
pub async fn dev_login(
    State(state): State<AppState>,
    Path((tenant, login)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, AppError> {
    let signer = state.signer.as_ref().ok_or(AppError::Internal)?;

    let valid_from: DateTime<Utc> = match params.get(PARAM_VALID_FROM) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| AppError::bad_request(format!("invalid valid-from '{raw}'")))?,
        None => Utc::now(),
    };

    let validity = match params.get(PARAM_DURATION) {
        Some(raw) => crate::services::auth::duration::parse_duration(raw)?
            .ok_or_else(|| AppError::bad_request(format!("invalid duration '{raw}'")))?,
        None => Duration::hours(1),
    };

    let mut builder = UserInfo::identity(login)?.tenant(tenant);
    if let Some(roles) = params.get(PARAM_ROLES) {
        builder = builder.roles(
            roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        );
    }
    for (key, value) in &params {
        if matches!(key.as_str(), PARAM_ROLES | PARAM_VALID_FROM | PARAM_DURATION) {
            continue;
        }
        builder = builder.claim(key.clone(), value.clone());
    }
    let user_info = builder.build();

    info!(user = user_info.login(), "issuing dev token");
    signer.create_token(&user_info, valid_from, validity)
}
