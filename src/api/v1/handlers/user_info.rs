//! GET /user
//!
//! Returns the caller's identity, anonymous included.
use axum::Json;

use crate::services::auth::context::SecurityContext;
use crate::services::auth::user_info::UserInfo;

pub async fn current_user() -> Json<UserInfo> {
    Json(SecurityContext::try_current().unwrap_or_else(|| UserInfo::anonymous().clone()))
}
