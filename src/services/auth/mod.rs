pub mod access;
pub mod claims;
pub mod context;
pub mod duration;
pub mod error;
pub mod jwt_authenticator;
pub mod provider;
pub mod signer;
pub mod user_info;
pub mod verifier;

pub use access::{RoleMapping, authorize};
pub use context::SecurityContext;
pub use error::SecurityError;
pub use jwt_authenticator::JwtAuthenticator;
pub use provider::AuthenticationProvider;
pub use signer::TokenSigner;
pub use user_info::UserInfo;
pub use verifier::TokenVerifier;
