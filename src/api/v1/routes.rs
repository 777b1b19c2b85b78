//! URL structure of the v1 API.
//!
//! Responsibility:
//! - /user for identity introspection
//! - /dev/login/{tenant}/{login} for self-signed tokens (dev only, CORS open)
use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::api::v1::handlers::{login::dev_login, user_info::current_user};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let mut router = Router::new().route("/user", get(current_user));

    if state.signer.is_some() {
        // browser test clients call this cross-origin, no credentials involved
        let cors = CorsLayer::new().allow_origin(Any);
        router = router.route(
            "/dev/login/{tenant}/{login}",
            get(dev_login).layer(cors),
        );
    }

    router
}
