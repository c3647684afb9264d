use crate::core::errors::Result;
use crate::core::models::hsm::{HsmHealth, OperationStatus};

/// Port for checking and configuring the HSM connection of the backend.
pub trait HsmProvisioning {
    /// Current connectivity. Does not require a session.
    fn health(&self) -> Result<HsmHealth>;

    /// Point the backend at the HSM at `ip_address`, trusting `certificate`
    /// (PEM bytes of the customer CA).
    fn configure(&self, ip_address: &str, certificate: Vec<u8>) -> Result<OperationStatus>;

    /// Ask the backend to open and close a session against the HSM.
    fn test_connection(&self) -> Result<OperationStatus>;
}
