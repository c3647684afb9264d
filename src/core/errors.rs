/// All domain errors for hsmctl.
///
/// Each variant provides enough context to act on the failure
/// without re-running with `--verbose`.
#[derive(Debug, thiserror::Error)]
pub enum HsmError {
    #[error(
        "Request failed: {reason}\n\n  \
         The key-management API could not be reached or answered unexpectedly.\n  \
         Check the API URL (--api-url or [api] base_url in config.toml)\n  \
         and run 'hsmctl hsm health' to see the backend status."
    )]
    NetworkFailure { reason: String },

    /// Backend rejected the input. `detail` is the backend's own message,
    /// surfaced unchanged.
    #[error("{detail}")]
    ValidationError { detail: String },

    #[error(
        "Session expired or invalid\n\n  \
         The stored session was rejected by the backend and has been cleared.\n  \
         Run 'hsmctl login' to start a new session."
    )]
    AuthenticationExpired,

    #[error(
        "Not logged in\n\n  \
         Run 'hsmctl login --username <user>' first."
    )]
    NotLoggedIn,

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error(
        "Invalid filter '{token}': {reason}\n\n  \
         Expected PROPERTY=VALUE or PROPERTY!=VALUE, e.g. key_type!=RSA.\n  \
         Properties: label, key_class, key_type, key_id (= and !=)\n  \
         token, private, sensitive, extractable, local, modifiable, destroyable (= only)"
    )]
    InvalidFilter { token: String, reason: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "HSM is not ready (configured: {configured}, connected: {connected})\n\n  \
         Solutions:\n    \
         → Configure it: hsmctl hsm configure --ip <address> --cert customerCA.crt\n    \
         → Check the connection: hsmctl hsm test"
    )]
    HsmNotReady { configured: bool, connected: bool },

    #[error(
        "Deleted {deleted} of {requested} key(s); {failed} failed:\n{detail}\n\n  \
         Run 'hsmctl keys list' to see which keys remain."
    )]
    DeleteIncomplete {
        requested: usize,
        deleted: usize,
        failed: usize,
        detail: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HsmError {
    /// Message shown to the user when an operation fails inside the key list
    /// view. Backend validation messages pass through unchanged.
    pub fn user_message(&self) -> String {
        match self {
            HsmError::ValidationError { detail } => detail.clone(),
            HsmError::NotFound { what } => format!("{what} not found"),
            HsmError::NetworkFailure { reason } => format!("Request failed: {reason}"),
            other => other.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HsmError>;
