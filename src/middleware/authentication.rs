//! Authentication middleware.
//!
//! Responsibility:
//! - open an identity scope per request and resolve the caller from the
//!   `Authorization` header through the provider chain
//! - tag the request span with user/tenant, reject bad credentials
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{Instrument, debug, field, info_span};

use crate::error::AppError;
use crate::services::auth::context::SecurityContext;
use crate::services::auth::provider::resolve_identity;
use crate::state::AppState;

/// Apply authentication to every route of the given router.
///
/// Must be the outermost request layer so that the identity scope wraps the
/// whole handler stack, guards included.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: from_fn cannot take a State extractor, from_fn_with_state can
    router.layer(middleware::from_fn_with_state(state, authentication_middleware))
}

async fn authentication_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let span = info_span!("auth", user = field::Empty, tenant = field::Empty);

    SecurityContext::scope(async move {
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match resolve_identity(&state.providers, authorization).await {
            Ok(user_info) => {
                SecurityContext::set(user_info);
                Ok(next.run(req).await)
            }
            Err(err) => {
                debug!(error = %err, "authentication failed");
                Err(AppError::from(err))
            }
        }
    })
    .instrument(span)
    .await
}
