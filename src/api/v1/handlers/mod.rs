pub mod login;
pub mod user_info;
