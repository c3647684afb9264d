pub mod client;
pub mod hsm_service;
pub mod interceptor;
pub mod key_directory;
pub mod session_service;
