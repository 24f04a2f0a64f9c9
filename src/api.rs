//! HTTP surface of the LinkerX backend.
//!
//! [`ApiClient`] is a thin typed wrapper over `reqwest`; it knows the routes
//! and wire shapes and nothing about sessions. Protected endpoints take the
//! bearer token explicitly: attaching the *current* session's token and
//! reacting to its rejection is the [`Gateway`](crate::gateway::Gateway)'s
//! job. The [`Backend`] trait is the seam the login and link workflows are
//! written against, so they can run on a fake backend under test.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::account::{UserFiles, UserLinks, UserStats};
use crate::catalog::{FileEntry, FilePage, FileQuery, ServiceStats};
use crate::error::Error;
use crate::links::{IssuedLink, LinkRequest};
use crate::quota::QuotaSnapshot;
use crate::types::{AuthToken, FileId, Identity, OtpCode, TelegramId};

/// LinkerX backend configuration.
///
/// The base URL is the only required field and must be `http`/`https`.
///
/// ```rust,ignore
/// use linkerx_client::ApiConfig;
///
/// let config = ApiConfig::new("https://cdn.example.com".parse()?);
/// // or from the environment:
/// let config = ApiConfig::from_env()?;
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
}

impl ApiConfig {
    /// Configuration pointed at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Configuration from the environment.
    ///
    /// # Required env vars
    /// - `LINKERX_API_URL`: backend base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the variable is missing or not a valid
    /// URL.
    pub fn from_env() -> Result<Self, Error> {
        let raw = std::env::var("LINKERX_API_URL")
            .map_err(|_| Error::Config("LINKERX_API_URL is required".into()))?;
        let base_url: Url = raw
            .parse()
            .map_err(|e| Error::Config(format!("LINKERX_API_URL: {e}")))?;
        Ok(Self::new(base_url))
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .expect("base URL is http(s) and always has a path");
            segments.pop_if_empty();
            segments.extend(path.split('/'));
        }
        url
    }
}

/// Typed client for the LinkerX backend API.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

/// Acknowledgement of a `request-otp` call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct OtpRequested {
    /// Server message, e.g. "OTP sent successfully".
    pub message: Option<String>,
    /// Echo of the generated code. Test deployments only; production
    /// backends deliver the code over Telegram and leave this absent.
    /// Never log it.
    pub echoed_code: Option<String>,
}

/// Credential and identity yielded by a successful `verify-otp` call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct LoginGrant {
    pub token: AuthToken,
    pub identity: Identity,
}

/// Backend operations the login and link workflows depend on.
///
/// [`ApiClient`] is the production implementation; tests substitute a fake.
pub trait Backend {
    fn request_otp(
        &self,
        subject: &TelegramId,
    ) -> impl Future<Output = Result<OtpRequested, Error>> + Send;

    fn verify_otp(
        &self,
        subject: &TelegramId,
        code: &OtpCode,
    ) -> impl Future<Output = Result<LoginGrant, Error>> + Send;

    fn fetch_quota(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<QuotaSnapshot, Error>> + Send;

    fn generate_link(
        &self,
        token: &AuthToken,
        request: &LinkRequest,
    ) -> impl Future<Output = Result<IssuedLink, Error>> + Send;

    fn user_stats(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<UserStats, Error>> + Send;

    fn user_files(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<UserFiles, Error>> + Send;

    fn user_links(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<UserLinks, Error>> + Send;
}

// ── Wire shapes ────────────────────────────────────────────────────

#[derive(Serialize)]
struct RequestOtpBody<'a> {
    telegram_id: &'a str,
}

#[derive(Deserialize)]
struct RequestOtpResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    otp: Option<String>,
}

#[derive(Serialize)]
struct VerifyOtpBody<'a> {
    telegram_id: &'a str,
    otp_code: &'a str,
}

#[derive(Deserialize)]
struct VerifyOtpResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
    // Older backends return only the bare id.
    #[serde(default)]
    user_id: Option<TelegramId>,
}

impl ApiClient {
    /// Create a new client for the configured backend.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // ── Public catalog ─────────────────────────────────────────────

    /// List files in the public catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestFailed`] on transport failure or a
    /// non-success response.
    pub async fn list_files(&self, query: &FileQuery) -> Result<FilePage, Error> {
        const OP: &str = "list-files";
        let response = self
            .http
            .get(self.config.endpoint("api/files"))
            .query(&query.as_pairs())
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_success(response, OP).await?;
        response.json().await.map_err(|e| Error::transport(OP, &e))
    }

    /// Fetch a single file's catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestFailed`] on transport failure or a
    /// non-success response.
    pub async fn file_detail(&self, id: &FileId) -> Result<FileEntry, Error> {
        const OP: &str = "file-detail";
        let response = self
            .http
            .get(self.config.endpoint(&format!("api/files/{}", id.as_str())))
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_success(response, OP).await?;
        response.json().await.map_err(|e| Error::transport(OP, &e))
    }

    /// Fetch service-wide stats for the landing page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestFailed`] on transport failure or a
    /// non-success response.
    pub async fn service_stats(&self) -> Result<ServiceStats, Error> {
        const OP: &str = "service-stats";
        let response = self
            .http
            .get(self.config.endpoint("api/stats"))
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_success(response, OP).await?;
        response.json().await.map_err(|e| Error::transport(OP, &e))
    }

    // ── Authenticated plumbing ─────────────────────────────────────

    async fn get_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AuthToken,
        operation: &'static str,
    ) -> Result<T, Error> {
        let response = self
            .http
            .get(self.config.endpoint(path))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| Error::transport(operation, &e))?;
        let response = ensure_authorized(response, operation).await?;
        response
            .json()
            .await
            .map_err(|e| Error::transport(operation, &e))
    }
}

impl Backend for ApiClient {
    /// Ask the backend to issue a one-time passcode for `subject`.
    async fn request_otp(&self, subject: &TelegramId) -> Result<OtpRequested, Error> {
        const OP: &str = "request-otp";
        let response = self
            .http
            .post(self.config.endpoint("api/auth/request-otp"))
            .json(&RequestOtpBody {
                telegram_id: subject.as_str(),
            })
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_success(response, OP).await?;
        let body: RequestOtpResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        if !body.success {
            return Err(Error::RequestFailed {
                operation: OP,
                status: None,
                message: body.message,
            });
        }
        Ok(OtpRequested {
            message: body.message,
            echoed_code: body.otp,
        })
    }

    /// Exchange subject + code for a session credential.
    ///
    /// The backend answers 401 for a wrong or expired code; on this
    /// unauthenticated route that is an ordinary failure carrying the
    /// server's message, not a session event.
    async fn verify_otp(
        &self,
        subject: &TelegramId,
        code: &OtpCode,
    ) -> Result<LoginGrant, Error> {
        const OP: &str = "verify-otp";
        let response = self
            .http
            .post(self.config.endpoint("api/auth/verify-otp"))
            .json(&VerifyOtpBody {
                telegram_id: subject.as_str(),
                otp_code: code.as_str(),
            })
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_success(response, OP).await?;
        let body: VerifyOtpResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(OP, &e))?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::RequestFailed {
                operation: OP,
                status: None,
                message: Some("response is missing the session token".into()),
            })?;
        let identity = body
            .user
            .or_else(|| body.user_id.map(Identity::new))
            .ok_or_else(|| Error::RequestFailed {
                operation: OP,
                status: None,
                message: Some("response is missing the user identity".into()),
            })?;

        Ok(LoginGrant {
            token: AuthToken(token),
            identity,
        })
    }

    async fn fetch_quota(&self, token: &AuthToken) -> Result<QuotaSnapshot, Error> {
        self.get_authorized("api/user/quota", token, "quota").await
    }

    async fn generate_link(
        &self,
        token: &AuthToken,
        request: &LinkRequest,
    ) -> Result<IssuedLink, Error> {
        const OP: &str = "generate-link";
        let response = self
            .http
            .post(self.config.endpoint("api/user/generate-link"))
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport(OP, &e))?;
        let response = ensure_authorized(response, OP).await?;
        response.json().await.map_err(|e| Error::transport(OP, &e))
    }

    async fn user_stats(&self, token: &AuthToken) -> Result<UserStats, Error> {
        self.get_authorized("api/user/stats", token, "user-stats").await
    }

    async fn user_files(&self, token: &AuthToken) -> Result<UserFiles, Error> {
        self.get_authorized("api/user/files", token, "user-files").await
    }

    async fn user_links(&self, token: &AuthToken) -> Result<UserLinks, Error> {
        self.get_authorized("api/user/links", token, "user-links").await
    }
}

// ── Response handling ──────────────────────────────────────────────

/// Checks the response status; on failure, carries the server's error
/// message (the `message` or `error` field of the payload) if present.
async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::RequestFailed {
        operation,
        status: Some(status.as_u16()),
        message: error_message(&body),
    })
}

/// Like [`ensure_success`], but a 401 on these routes means the session
/// credential was rejected.
async fn ensure_authorized(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::SessionExpired);
    }
    ensure_success(response, operation).await
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(|v| v.as_str())
        {
            return Some(msg.to_owned());
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        let config = ApiConfig::new("https://cdn.example.com".parse().unwrap());
        assert_eq!(
            config.endpoint("api/auth/request-otp").as_str(),
            "https://cdn.example.com/api/auth/request-otp"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let config = ApiConfig::new("https://example.com/linkerx/".parse().unwrap());
        assert_eq!(
            config.endpoint("api/stats").as_str(),
            "https://example.com/linkerx/api/stats"
        );
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Rate limit exceeded","error":"other"}"#).as_deref(),
            Some("Rate limit exceeded")
        );
        assert_eq!(
            error_message(r#"{"error":"Invalid OTP"}"#).as_deref(),
            Some("Invalid OTP")
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("gateway timeout").as_deref(), Some("gateway timeout"));
        assert!(error_message("").is_none());
        assert!(error_message("   ").is_none());
    }

    #[test]
    fn verify_response_accepts_bare_user_id() {
        let body: VerifyOtpResponse =
            serde_json::from_str(r#"{"success":true,"token":"tok_abc","user_id":"123456789"}"#)
                .unwrap();
        assert_eq!(body.token.as_deref(), Some("tok_abc"));
        assert!(body.user.is_none());
        assert_eq!(body.user_id.unwrap().as_str(), "123456789");
    }

    #[test]
    fn request_otp_response_carries_echo() {
        let body: RequestOtpResponse = serde_json::from_str(
            r#"{"success":true,"message":"OTP sent successfully","otp":"482913"}"#,
        )
        .unwrap();
        assert!(body.success);
        assert_eq!(body.otp.as_deref(), Some("482913"));
    }
}
