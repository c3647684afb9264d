pub mod filter;
pub mod hsm;
pub mod key_record;
pub mod session;
