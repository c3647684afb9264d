use crate::adapters::http::client::ApiClient;
use crate::core::errors::{HsmError, Result};
use crate::core::models::session::{CurrentUser, LoginRequest, LoginResponse};
use crate::core::traits::session::{SessionService, SessionStore};

/// `SessionService` backed by the `/auth` endpoints, persisting the cookie
/// in a `SessionStore`.
pub struct HttpSessionService<'a, S: SessionStore> {
    client: &'a ApiClient,
    store: S,
}

impl<'a, S: SessionStore> HttpSessionService<'a, S> {
    pub fn new(client: &'a ApiClient, store: S) -> Self {
        Self { client, store }
    }
}

impl<S: SessionStore> SessionService for HttpSessionService<'_, S> {
    fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest { username, password };
        let resp = self
            .client
            .post_with_session::<_, LoginResponse>("/auth/login", &request, "Login failed")
            .map_err(|e| match e {
                HsmError::AuthenticationExpired => HsmError::ValidationError {
                    detail: "Invalid credentials".into(),
                },
                other => other,
            })?;
        if !resp.body.success {
            return Err(HsmError::ValidationError {
                detail: resp.body.message,
            });
        }

        let cookie = resp.session.ok_or_else(|| HsmError::NetworkFailure {
            reason: "Login response did not set a session cookie".into(),
        })?;
        self.store.save(&cookie)?;
        tracing::info!(username, "session stored");
        Ok(resp.body)
    }

    fn logout(&self) -> Result<LoginResponse> {
        if !self.client.has_session() {
            return Err(HsmError::NotLoggedIn);
        }
        let result = self.client.post_empty("/auth/logout", "Logout failed");
        // Forget the local session even when the backend call failed.
        self.store.clear()?;
        result
    }

    fn current_user(&self) -> Result<CurrentUser> {
        if !self.client.has_session() {
            return Err(HsmError::NotLoggedIn);
        }
        self.client.get("/auth/me", "Failed to load current user")
    }
}
