//! Shared HTTP client for the platform API. Every request goes through
//! [`ApiClient::send`], which attaches the bearer token when the session holds
//! one and clears the session on `401` before handing the failure back.

use super::{error::ApiError, handle::ApiHandle};
use crate::session::SessionStore;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tracing::{debug, field, info_span, warn, Instrument};
use url::Url;

/// Default API endpoint when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8111";
/// Default request timeout applied by the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration shared by every request.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Keep and forward cookies set by the API.
    pub with_credentials: bool,
    pub user_agent: String,
}

impl ClientConfig {
    /// # Errors
    /// Returns `ApiError::Config` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let trimmed = base_url.trim();
        let base_url = Url::parse(trimmed)
            .map_err(|err| ApiError::Config(format!("Invalid API URL '{trimmed}': {err}")))?;

        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ApiError::Config(format!(
                    "Unsupported API URL scheme: {scheme}"
                )))
            }
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            with_credentials: true,
            user_agent: crate::APP_USER_AGENT.to_string(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
    session: SessionStore,
}

impl ApiClient {
    /// # Errors
    /// Returns `ApiError::Config` if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .cookie_store(config.with_credentials)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Returns a fresh call wrapper with its own loading flag and error slot.
    #[must_use]
    pub fn handle(&self) -> ApiHandle {
        ApiHandle::new(self.clone())
    }

    /// Joins `path` onto the configured base URL. Absolute URLs are accepted
    /// only on the base URL's origin, so the session token never leaves the API.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the result is not a valid URL or points at
    /// another origin.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path)
                .map_err(|err| ApiError::Config(format!("Invalid URL '{path}': {err}")))?;
            if url.origin() != self.config.base_url.origin() {
                return Err(ApiError::Config(format!(
                    "Refusing request outside the API origin: {}",
                    url.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }

        let base = self.config.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|err| ApiError::Config(format!("Invalid URL '{joined}': {err}")))
    }

    /// Starts a request and attaches the session's bearer token if present.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the URL cannot be built.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let builder = self.http.request(method, url);

        Ok(match self.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Sends a prepared request. Non-success statuses become `ApiError::Http`;
    /// a `401` also clears the session first.
    ///
    /// # Errors
    /// Returns transport errors, or `ApiError::Http` for non-success responses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build request: {err}")))?;

        let span = info_span!(
            "api.request",
            http.method = %request.method(),
            url = %request.url().path(),
            http.status_code = field::Empty,
        );

        let response = self
            .http
            .execute(request)
            .instrument(span.clone())
            .await
            .map_err(|err| ApiError::from_transport(&err))?;

        let status = response.status();
        span.record("http.status_code", status.as_u16());

        if status == StatusCode::UNAUTHORIZED {
            warn!(parent: &span, "authorization rejected, clearing session");
            self.session.clear_token();
        }

        if status.is_success() {
            debug!(parent: &span, "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status.as_u16(), &body))
    }

    /// Sends a request and decodes its JSON body. Empty bodies decode as
    /// `null`, so `()` and `Option<T>` work for 204 responses.
    ///
    /// # Errors
    /// Returns any error from [`Self::send`] or `ApiError::Parse`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(&err))?;

        let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        serde_json::from_slice(payload)
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }
}
