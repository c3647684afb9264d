use serde::{Deserialize, Serialize};

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `/auth/login` and `/auth/logout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub session_expires: Option<String>,
}

/// `GET /auth/me` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub session_id: String,
    pub expires: String,
}

impl CurrentUser {
    /// Expiry parsed as a naive timestamp. The backend sends ISO 8601
    /// without an offset, in UTC.
    pub fn expires_at(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDateTime::parse_from_str(&self.expires, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}
