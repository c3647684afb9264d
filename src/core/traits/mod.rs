pub mod hsm_provisioning;
pub mod key_directory;
pub mod session;
