use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::adapters::http::interceptor::ResponseInterceptor;
use crate::core::errors::{HsmError, Result};

/// Name of the cookie carrying the backend session.
pub const SESSION_COOKIE: &str = "session";

/// Blocking JSON client for the key-management API.
///
/// Requests run on a private current-thread tokio runtime. Every response
/// status passes through the injected interceptors before any error mapping
/// or decoding happens.
pub struct ApiClient {
    api_root: String,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    session: Option<String>,
    interceptors: Vec<Box<dyn ResponseInterceptor>>,
}

/// Decoded body plus the session cookie the response set, if any.
pub struct ApiResponse<T> {
    pub body: T,
    pub session: Option<String>,
}

impl ApiClient {
    /// Build a client for `api_root` (e.g. `http://localhost:8000/api/v1`).
    pub fn new(api_root: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("hsmctl/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HsmError::NetworkFailure {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HsmError::NetworkFailure {
                reason: format!("Failed to create async runtime: {e}"),
            })?;
        Ok(Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            http,
            runtime,
            session: None,
            interceptors: Vec::new(),
        })
    }

    /// Attach the session cookie value sent with every request.
    pub fn with_session(mut self, session: Option<String>) -> Self {
        self.session = session;
        self
    }

    pub fn with_interceptor(mut self, interceptor: Box<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        self.send(Method::GET, path, fallback, |req| req).map(|r| r.body)
    }

    pub fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T> {
        self.post_with_session(path, body, fallback).map(|r| r.body)
    }

    /// POST a JSON body and also return any session cookie the response set.
    pub fn post_with_session<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<ApiResponse<T>> {
        self.send(Method::POST, path, fallback, |req| req.json(body))
    }

    /// POST without a body.
    pub fn post_empty<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        self.send(Method::POST, path, fallback, |req| req).map(|r| r.body)
    }

    pub fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        fallback: &str,
    ) -> Result<T> {
        self.send(Method::POST, path, fallback, |req| req.multipart(form))
            .map(|r| r.body)
    }

    /// Issue one request. `fallback` is the message used when an error
    /// response carries no `detail`.
    fn send<T, F>(
        &self,
        method: Method,
        path: &str,
        fallback: &str,
        build: F,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = format!("{}{path}", self.api_root);
        let mut req = self.http.request(method.clone(), &url);
        if let Some(session) = &self.session {
            req = req.header(COOKIE, format!("{SESSION_COOKIE}={session}"));
        }
        let req = build(req);

        self.runtime.block_on(async {
            let resp = req.send().await.map_err(|e| {
                tracing::debug!(%method, path, error = %e, "request failed");
                HsmError::NetworkFailure {
                    reason: format!("{method} {url}: {e}"),
                }
            })?;
            let status = resp.status();
            tracing::debug!(%method, path, status = status.as_u16(), "response");

            for interceptor in &self.interceptors {
                interceptor.on_response(path, status)?;
            }

            let session = session_cookie(resp.headers());

            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(status_error(status, error_detail(&text), fallback));
            }

            let body = resp.json::<T>().await.map_err(|e| HsmError::NetworkFailure {
                reason: format!("Malformed response from {path}: {e}"),
            })?;
            Ok(ApiResponse { body, session })
        })
    }
}

/// Extract `detail` from a FastAPI-style error body. Non-string details
/// (validation error lists) are rendered as compact JSON.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Map an unsuccessful status to the error taxonomy.
pub fn status_error(status: StatusCode, detail: Option<String>, fallback: &str) -> HsmError {
    match status {
        StatusCode::UNAUTHORIZED => HsmError::AuthenticationExpired,
        StatusCode::NOT_FOUND => HsmError::NotFound {
            what: detail
                .map(|d| d.trim_end_matches(" not found").to_string())
                .unwrap_or_else(|| "Resource".to_string()),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => HsmError::ValidationError {
            detail: detail.unwrap_or_else(|| fallback.to_string()),
        },
        other => HsmError::NetworkFailure {
            reason: match detail {
                Some(d) => format!("{fallback} ({other}): {d}"),
                None => format!("{fallback} ({other})"),
            },
        },
    }
}

/// Value of the `session` cookie set by a response, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            let value = value.trim_matches('"');
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(
            error_detail(r#"{"detail":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn detail_list_is_rendered_as_json() {
        let detail = error_detail(r#"{"detail":[{"loc":["body","label"],"msg":"field required"}]}"#)
            .unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn non_json_body_has_no_detail() {
        assert_eq!(error_detail("<html>502</html>"), None);
    }

    #[test]
    fn bad_request_keeps_backend_message() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            Some("Failed to create key: invalid key size".into()),
            "Failed to create key",
        );
        assert_eq!(err.to_string(), "Failed to create key: invalid key size");
    }

    #[test]
    fn bad_request_without_detail_uses_fallback() {
        let err = status_error(StatusCode::BAD_REQUEST, None, "Failed to delete keys");
        assert_eq!(err.to_string(), "Failed to delete keys");
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let err = status_error(StatusCode::NOT_FOUND, Some("Key not found".into()), "x");
        assert!(matches!(err, HsmError::NotFound { ref what } if what == "Key"));
    }

    #[test]
    fn unauthorized_maps_to_expired() {
        let err = status_error(StatusCode::UNAUTHORIZED, None, "x");
        assert!(matches!(err, HsmError::AuthenticationExpired));
    }

    #[test]
    fn server_error_is_network_failure() {
        let err = status_error(StatusCode::BAD_GATEWAY, None, "Failed to list keys");
        assert!(matches!(err, HsmError::NetworkFailure { .. }));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn session_cookie_is_read_from_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static(
                "session=YWRtaW46MTIz; expires=Mon, 19 Oct 2026 18:00:00 GMT; HttpOnly; Path=/; SameSite=lax",
            ),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("YWRtaW46MTIz"));
    }

    #[test]
    fn cleared_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("session=\"\"; Max-Age=0; Path=/"));
        assert_eq!(session_cookie(&headers), None);
    }
}
