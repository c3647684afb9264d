use reqwest::StatusCode;

use crate::core::errors::{HsmError, Result};
use crate::core::traits::session::SessionStore;

/// Hook run on every response status before the body is decoded.
///
/// Returning an error aborts the request with that error.
pub trait ResponseInterceptor {
    fn on_response(&self, path: &str, status: StatusCode) -> Result<()>;
}

/// Turns a 401 on any authenticated endpoint into `AuthenticationExpired`
/// and forgets the stored session, so the next command asks for a login.
pub struct SessionExpiryInterceptor<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionExpiryInterceptor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

/// A 401 on the login endpoint means bad credentials, not an expired session.
const LOGIN_PATH: &str = "/auth/login";

impl<S: SessionStore> ResponseInterceptor for SessionExpiryInterceptor<S> {
    fn on_response(&self, path: &str, status: StatusCode) -> Result<()> {
        if status != StatusCode::UNAUTHORIZED || path == LOGIN_PATH {
            return Ok(());
        }
        tracing::warn!(path, "session rejected by backend, clearing stored session");
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not remove stored session");
        }
        Err(HsmError::AuthenticationExpired)
    }
}
