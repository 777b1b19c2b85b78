//! Application assembly.
//!
//! Responsibility:
//! - tracing/panic-hook bootstrap
//! - Config -> services -> AppState -> Router wiring
//! - axum::serve() startup
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::authentication;
use crate::services::auth::access::RoleMapping;
use crate::services::auth::jwt_authenticator::JwtAuthenticator;
use crate::services::auth::provider::AuthenticationProvider;
use crate::services::auth::signer::TokenSigner;
use crate::services::auth::verifier::{TokenVerifier, claims_cache};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing so they don't get lost when stderr is hidden.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting {} in {:?} mode on {}",
        config.app_name,
        config.app_env,
        config.addr
    );

    let addr = config.addr;
    let state = build_state(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: Config) -> AppState {
    if config.token_cache_enabled {
        tracing::info!("token verification cache enabled");
    } else {
        tracing::info!("token verification cache disabled");
    }

    let verifier = TokenVerifier::new(
        config.public_key.key,
        config.public_key.algorithm,
        claims_cache(config.token_cache_enabled),
    );
    let providers: Vec<Box<dyn AuthenticationProvider>> = vec![Box::new(JwtAuthenticator::new(
        std::sync::Arc::new(verifier),
        config.claim_tenant.clone(),
        config.claim_roles.clone(),
    ))];

    let signer = config.private_key.map(|private_key| {
        tracing::warn!("token signing enabled, the dev login endpoint is mounted");
        TokenSigner::new(
            private_key.key,
            private_key.algorithm,
            config.token_issuer,
            config.claim_tenant,
            config.claim_roles,
        )
    });

    AppState::new(providers, signer, RoleMapping::new(config.role_mapping))
}

pub fn build_router(state: AppState) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let v1 = api::v1::routes(&state);
    let v1 = authentication::apply(v1, state.clone());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
