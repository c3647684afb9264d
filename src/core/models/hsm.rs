use serde::Deserialize;

/// `GET /hsm/health` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HsmHealth {
    pub connected: bool,
    pub configured: bool,
    pub certificate_exists: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl HsmHealth {
    /// Keys can only be managed once the HSM is both configured and reachable.
    pub fn is_ready(&self) -> bool {
        self.configured && self.connected
    }
}

/// Success flag plus backend message, as returned by configure / test-connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationStatus {
    pub success: bool,
    pub message: String,
}

/// Reject anything that is not a dotted-quad IPv4 address.
pub fn is_valid_ipv4(address: &str) -> bool {
    address.parse::<std::net::Ipv4Addr>().is_ok()
}
