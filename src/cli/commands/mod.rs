pub mod api_helpers;
pub mod auth;
pub mod hsm;
pub mod keys;
