use crate::core::errors::Result;
use crate::core::models::session::{CurrentUser, LoginResponse};

/// Port for authenticating against the backend.
pub trait SessionService {
    /// Authenticate with HSM crypto-user credentials. On success the
    /// implementation persists the session cookie.
    fn login(&self, username: &str, password: &str) -> Result<LoginResponse>;

    /// End the session on the backend and forget it locally.
    fn logout(&self) -> Result<LoginResponse>;

    fn current_user(&self) -> Result<CurrentUser>;
}

/// Port for persisting the session cookie between invocations.
pub trait SessionStore {
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, cookie: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}
