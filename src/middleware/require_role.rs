//! Role guard for route subtrees.
//!
//! Responsibility:
//! - reject anonymous callers and callers without the required role before
//!   the handler runs
use axum::{Router, body::Body, http::Request, middleware, response::Response};

use crate::error::AppError;
use crate::services::auth::access::authorize;
use crate::services::auth::context::SecurityContext;
use crate::services::auth::user_info::UserInfo;
use crate::state::AppState;

/// Guard every route already added to `router` with `role`.
///
/// An empty role only demands an authenticated caller. Applied via
/// `route_layer` so unmatched paths still produce 404, not 401.
pub fn apply(router: Router<AppState>, state: AppState, role: &'static str) -> Router<AppState> {
    let role_mapping = state.role_mapping.clone();
    router.route_layer(middleware::from_fn(
        move |req: Request<Body>, next: middleware::Next| {
            let role_mapping = role_mapping.clone();
            async move {
                let user_info =
                    SecurityContext::try_current().unwrap_or_else(|| UserInfo::anonymous().clone());
                authorize(role, &user_info, &role_mapping).map_err(AppError::from)?;
                Ok::<Response, AppError>(next.run(req).await)
            }
        },
    ))
}
