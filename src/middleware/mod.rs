pub mod authentication;
pub mod require_role;
