//! API client for the brokerage REST API.
//!
//! Every call goes through [`ApiClient::send`], which attaches the bearer
//! token and runs the refresh protocol:
//!
//! 1. A 401 on a request that has not been retried marks it retried.
//! 2. If a refresh token is held it is exchanged at `/auth/refresh`; on
//!    success both tokens are replaced and the request is resubmitted once.
//! 3. If the exchange fails, or there is no refresh token, the session is
//!    cleared and the session-lost hook fires.
//!
//! Refreshes are serialized. A request that waited behind another refresh
//! and finds a different access token in the session reuses it instead of
//! refreshing again. If it finds the session already ended, it fails with
//! `SessionExpired` and the hook is not fired a second time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{Session, TokenPair};
use crate::config::{Config, DEFAULT_TIMEOUT_SECS};
use crate::models::{LoginRequest, LoginResponse, MessageResponse, TwoFactorSetup, User};

use super::{ApiError, ApiRequest, Result};

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";
const TWO_FA_LOGIN_PATH: &str = "/auth/2fa/login";
const TWO_FA_ENABLE_PATH: &str = "/auth/2fa/enable";
const TWO_FA_VERIFY_PATH: &str = "/auth/2fa/verify";
const ME_PATH: &str = "/me";

/// Why the client gave up on the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLost {
    /// The refresh exchange was rejected or could not be completed
    RefreshFailed,
    /// A request was rejected and there was no refresh token to try
    NoRefreshToken,
}

impl fmt::Display for SessionLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionLost::RefreshFailed => f.write_str("session expired and could not be renewed"),
            SessionLost::NoRefreshToken => f.write_str("not signed in"),
        }
    }
}

/// Called after credentials have been cleared because the session is gone.
/// Front ends use it to send the user back to their login entry point.
pub type SessionLostHook = Arc<dyn Fn(SessionLost) + Send + Sync>;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct CodeRequest<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct PasswordRequest<'a> {
    password: &'a str,
}

/// API client for the brokerage service.
/// Clone is cheap - the connection pool, session and refresh lock are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
    refresh_lock: Arc<Mutex<()>>,
    on_session_lost: Option<SessionLostHook>,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS), session)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL is required".into()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session,
            refresh_lock: Arc::new(Mutex::new(())),
            on_session_lost: None,
        })
    }

    pub fn from_config(config: &Config, session: Arc<Session>) -> Result<Self> {
        Self::with_timeout(config.api_url(), config.timeout(), session)
    }

    /// Install the callback fired when the session cannot be recovered
    pub fn on_session_lost(mut self, hook: SessionLostHook) -> Self {
        self.on_session_lost = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// True iff a non-empty access token is currently held
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // ===== Transport =====

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Put one request on the wire. No status handling, no refresh.
    async fn dispatch(&self, req: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let mut builder = self.client.request(req.method.clone(), self.url(&req.path));
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        debug!(method = %req.method, path = %req.path, retried = req.retried, "Sending request");
        let response = builder.send().await?;
        debug!(path = %req.path, status = %response.status(), "Response received");
        Ok(response)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    /// Send a request through the authentication protocol and return the
    /// raw successful response.
    pub async fn send(&self, mut req: ApiRequest) -> Result<Response> {
        loop {
            let token = self.session.access_token();
            let response = self.dispatch(&req, token.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if status != StatusCode::UNAUTHORIZED || req.retried {
                return Err(ApiError::from_response(response).await);
            }

            req.retried = true;
            let original = ApiError::from_response(response).await;
            self.recover_session(token.as_deref(), original).await?;
            debug!(path = %req.path, "Resubmitting request with renewed token");
        }
    }

    /// Send a request and decode the JSON response body
    pub async fn request<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T> {
        let path = req.path.clone();
        let response = self.send(req).await?;
        Self::parse_json(response, &path).await
    }

    /// Send a request and return the response body as text (CSV exports)
    pub async fn request_text(&self, req: ApiRequest) -> Result<String> {
        let response = self.send(req).await?;
        Ok(response.text().await?)
    }

    // ===== Session Recovery =====

    /// Try to make the session usable again after `stale` was rejected.
    /// Returns `Ok` when the caller should resubmit.
    async fn recover_session(&self, stale: Option<&str>, original: ApiError) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        match (stale, self.session.access_token()) {
            // Another request already ended the session while we waited
            (Some(_), None) => {
                debug!("Session already ended by another request");
                return Err(ApiError::SessionExpired);
            }
            (stale, Some(current)) if stale != Some(current.as_str()) => {
                debug!("Access token already renewed by another request");
                return Ok(());
            }
            _ => {}
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            self.end_session(SessionLost::NoRefreshToken);
            return Err(original);
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(tokens) => {
                self.session.replace(tokens);
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.end_session(SessionLost::RefreshFailed);
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Trade the refresh token for a new pair. Sent without a bearer token and
    /// outside `send`, so a rejected refresh can never trigger another one.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let req = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh_token })?;
        let response = self.dispatch(&req, None).await?;
        let response = Self::check_response(response).await?;
        let tokens: TokenPair = Self::parse_json(response, REFRESH_PATH).await?;

        if tokens.access_token.is_empty() || tokens.refresh_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Refresh response is missing a token".into(),
            ));
        }
        Ok(tokens)
    }

    fn end_session(&self, reason: SessionLost) {
        warn!(%reason, "Session lost, clearing credentials");
        self.session.clear();
        if let Some(ref hook) = self.on_session_lost {
            hook(reason);
        }
    }

    // ===== Authentication =====

    /// Authenticate with email and password and make the returned pair the
    /// active session. When `requires_2fa` is set, follow up with
    /// [`ApiClient::verify_2fa_login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let req = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let response = self.dispatch(&req, None).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(ApiError::server_message(&body)));
        }
        let response = Self::check_response(response).await?;
        let login: LoginResponse = Self::parse_json(response, LOGIN_PATH).await?;

        self.session.replace(login.token_pair.clone());
        info!(user_id = login.user.id, requires_2fa = login.requires_2fa, "Logged in");
        Ok(login)
    }

    /// End the session. The server call is best-effort; local credentials
    /// are cleared whatever it returns.
    pub async fn logout(&self) {
        let token = self.session.access_token();
        match self.dispatch(&ApiRequest::post(LOGOUT_PATH), token.as_deref()).await {
            Ok(response) if response.status().is_success() => {
                debug!("Server-side logout acknowledged");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Server-side logout rejected");
            }
            Err(e) => {
                warn!(error = %e, "Server-side logout failed");
            }
        }
        self.session.clear();
        info!("Logged out");
    }

    /// Complete a two-factor login. The final pair replaces the provisional one.
    pub async fn verify_2fa_login(&self, code: &str) -> Result<LoginResponse> {
        let req = ApiRequest::post(TWO_FA_LOGIN_PATH).json(&CodeRequest { code })?;
        let login: LoginResponse = self.request(req).await?;
        self.session.replace(login.token_pair.clone());
        info!(user_id = login.user.id, "Two-factor login verified");
        Ok(login)
    }

    /// Start two-factor setup; returns the TOTP secret and provisioning URL
    pub async fn enable_2fa(&self, password: &str) -> Result<TwoFactorSetup> {
        let req = ApiRequest::post(TWO_FA_ENABLE_PATH).json(&PasswordRequest { password })?;
        self.request(req).await
    }

    /// Confirm two-factor setup with a code from the authenticator
    pub async fn verify_2fa_setup(&self, code: &str) -> Result<MessageResponse> {
        let req = ApiRequest::post(TWO_FA_VERIFY_PATH).json(&CodeRequest { code })?;
        self.request(req).await
    }

    /// Fetch the signed-in user
    pub async fn me(&self) -> Result<User> {
        self.request(ApiRequest::get(ME_PATH)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;

    fn client(base_url: &str) -> ApiClient {
        let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
        ApiClient::new(base_url, session).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let c = client("http://localhost:8080/api/v1/");
        assert_eq!(c.base_url(), "http://localhost:8080/api/v1");
        assert_eq!(c.url("/customers"), "http://localhost:8080/api/v1/customers");
        assert_eq!(c.url("customers/3"), "http://localhost:8080/api/v1/customers/3");
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
        assert!(matches!(ApiClient::new("", session), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_clones_share_session() {
        let c = client("http://localhost");
        let other = c.clone();
        c.session().replace(TokenPair::new("A1", "R1"));
        assert!(other.is_authenticated());
    }

    #[test]
    fn test_session_lost_display() {
        assert_eq!(SessionLost::NoRefreshToken.to_string(), "not signed in");
    }
}
