//! Logged HTTP transport for one Elasticsearch or Kibana endpoint.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use elasticstack_diagnostics::HttpResponse;

use crate::config::AuthMethod;
use crate::error::{Error, Result};
use crate::redaction::Redactor;

const LOG_TARGET: &str = "elasticstack::transport";

/// A fully buffered API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Response status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// True for `404 Not Found`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turns a failure status into [`Error::Api`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any status of 400 or above.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_error() {
            return Err(Error::Api {
                method: self.method.to_string(),
                url: self.url.to_string(),
                status: self.status,
                body: self.body,
            });
        }
        Ok(self)
    }
}

impl HttpResponse for ApiResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn body_text(&self) -> &str {
        &self.body
    }
}

/// One configured endpoint: base URL, credentials and a pooled client.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    auth: AuthMethod,
    headers: Vec<(&'static str, &'static str)>,
    http: reqwest::Client,
    redactor: Arc<Redactor>,
}

impl Endpoint {
    /// Builds an endpoint from a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for an unparsable URL and
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(
        base: &str,
        auth: AuthMethod,
        insecure: bool,
        redactor: Arc<Redactor>,
    ) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::InvalidEndpoint {
            endpoint: base.to_string(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint {
                endpoint: base.to_string(),
                message: "URL cannot be used as a base".to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .user_agent(concat!("elasticstack-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base,
            auth,
            headers: Vec::new(),
            http,
            redactor,
        })
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded path segments to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the base cannot take a path.
    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint {
                endpoint: self.base.to_string(),
                message: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments.iter().map(AsRef::as_ref));
        Ok(url)
    }

    /// Sends a request with an optional JSON body and buffers the response.
    ///
    /// Failure statuses are returned as responses, not errors, so callers
    /// can treat `404` specially.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body cannot be serialized and
    /// [`Error::Http`] on transport failures.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let payload = body.map(serde_json::to_string).transpose()?;

        let mut request = self.http.request(method.clone(), url.clone());
        request = match &self.auth {
            AuthMethod::None => request,
            AuthMethod::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
            AuthMethod::ApiKey(key) => {
                request.header(AUTHORIZATION, format!("ApiKey {}", key.expose_secret()))
            }
            AuthMethod::Bearer(token) => request.bearer_auth(token.expose_secret()),
        };
        for (name, value) in &self.headers {
            request = request.header(*name, *value);
        }

        tracing::debug!(target: LOG_TARGET, %method, %url, "Sending request");
        if let Some(payload) = &payload {
            tracing::trace!(target: LOG_TARGET, body = %self.redactor.redact(payload), "Request body");
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload.clone());
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(target: LOG_TARGET, %method, %url, status, elapsed_ms, "Received response");
        tracing::trace!(target: LOG_TARGET, body = %self.redactor.redact(&text), "Response body");

        Ok(ApiResponse {
            method,
            url,
            status,
            body: text,
        })
    }

    /// `GET` without a body.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::send`].
    pub async fn get(&self, url: Url) -> Result<ApiResponse> {
        self.send::<()>(Method::GET, url, None).await
    }

    /// `DELETE` without a body.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::send`].
    pub async fn delete(&self, url: Url) -> Result<ApiResponse> {
        self.send::<()>(Method::DELETE, url, None).await
    }
}
