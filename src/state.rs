//! Shared application state.
//!
//! Responsibility:
//! - hold the provider chain, optional signer and role mapping behind Arcs
//! - Clone is cheap, one copy per request via axum's State extractor
use std::sync::Arc;

use crate::services::auth::access::RoleMapping;
use crate::services::auth::provider::AuthenticationProvider;
use crate::services::auth::signer::TokenSigner;

#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<Vec<Box<dyn AuthenticationProvider>>>,
    pub signer: Option<Arc<TokenSigner>>,
    pub role_mapping: Arc<RoleMapping>,
}

impl AppState {
    pub fn new(
        providers: Vec<Box<dyn AuthenticationProvider>>,
        signer: Option<TokenSigner>,
        role_mapping: RoleMapping,
    ) -> Self {
        Self {
            providers: Arc::new(providers),
            signer: signer.map(Arc::new),
            role_mapping: Arc::new(role_mapping),
        }
    }
}
