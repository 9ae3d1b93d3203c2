//! HTTP client for the Delta backend REST API.
//!
//! # Security Note - Logging
//!
//! The bearer token is held in a [`SecretBox`] and attached through
//! [`RedactedHeader`], whose `Display` and `Debug` print `[REDACTED]`. Even so,
//! do not enable `reqwest=debug` logging outside development.

pub mod auth;
pub mod groups;
pub mod permissions;
pub mod source;
pub mod types;
pub mod users;

use std::fmt;
use std::time::Duration;

use reqwest::header;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, DeskError, Result};
use crate::session::Session;

pub use source::EndpointSource;
pub use types::{
    Group, GroupInput, LoginResponse, Permission, PermissionInput, User, UserInfo, UserInput,
    UserPermission,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrapper for sensitive header values that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn bearer(token: &str) -> Self {
        Self {
            value: format!("Bearer {token}"),
        }
    }

    fn as_header_value(&self) -> Result<header::HeaderValue> {
        let mut value = header::HeaderValue::from_str(&self.value)
            .map_err(|_| DeskError::Other("access token contains invalid characters".to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<SecretBox<String>>,
}

impl ApiClient {
    /// Create a client for `base_url`.
    ///
    /// Configures the HTTP client with a 30s connect timeout and the given
    /// total timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Client configured from the config file, authenticated with `session`
    pub fn from_config(config: &Config, session: Option<&Session>) -> Result<Self> {
        let client = Self::new(&config.api_url(), config.request_timeout())?;
        Ok(match session {
            Some(session) => client.with_token(session.access_token()),
            None => client,
        })
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(SecretBox::new(Box::new(token.to_string())));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `user/12/permissions`
    pub fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        debug!(%method, %url, "api request");
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            let auth_header = RedactedHeader::bearer(token.expose_secret());
            builder = builder.header(header::AUTHORIZATION, auth_header.as_header_value()?);
        }
        Ok(builder)
    }

    /// Send a request and decode a JSON body
    async fn send_json<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R> {
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request, discarding the body of a successful response
    async fn send_unit(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await.map(|_| ())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_body(status, &body);
            debug!(status = status.as_u16(), error = %error, "api error");
            return Err(error.into());
        }
        Ok(body)
    }
}
