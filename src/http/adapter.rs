//! HTTP adapter over a reqwest transport
//!
//! Issues GET/POST/DELETE requests and maps every failure onto the crate
//! error type:
//! - non-success statuses carry the status code and reason phrase
//! - transport failures carry the transport's error text
//! - an abort the caller asked for is [`Error::Cancelled`]
//! - an abort the caller did not ask for is a timed-out [`RequestError`]

use super::body::ResponseBody;
use crate::config::AdapterConfig;
use crate::error::{Error, RequestError, Result};
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use url::Url;

/// Text body of a POST request
struct Content {
    content_type: HeaderValue,
    text: String,
}

/// HTTP adapter with a shared authorization header and cooperative cancellation
///
/// All operations take `&self`, so one adapter can serve many tasks at once.
/// Header changes apply to requests started after the change.
pub struct HttpAdapter {
    /// Transport handle, `None` once disposed
    transport: RwLock<Option<Client>>,
    /// Headers added to every request
    default_headers: RwLock<HeaderMap>,
    /// Span every adapter event is recorded under
    span: Span,
}

impl HttpAdapter {
    /// Create an adapter whose transport is built from `config`
    pub fn new(config: AdapterConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP transport: {e}")))?;

        let adapter = Self::with_client(client);
        *adapter.headers_mut() = parse_headers(&config.default_headers)?;
        Ok(adapter)
    }

    /// Create an adapter around an existing transport
    pub fn with_client(client: Client) -> Self {
        Self {
            transport: RwLock::new(Some(client)),
            default_headers: RwLock::new(HeaderMap::new()),
            span: info_span!("http_adapter"),
        }
    }

    /// Record all adapter events under `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Issue a GET request and return the response body
    pub async fn get(&self, url: &str, token: &CancellationToken) -> Result<ResponseBody> {
        let response = self
            .send(Method::GET, url, None, token)
            .instrument(self.span.clone())
            .await?;
        Ok(ResponseBody::new(Method::GET, url, response, token.clone()))
    }

    /// Issue a POST request with a UTF-8 text body and return the response body
    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &str,
        token: &CancellationToken,
    ) -> Result<ResponseBody> {
        if token.is_cancelled() {
            return Err(Error::cancelled(url));
        }

        let content = Content {
            content_type: utf8_content_type(content_type)?,
            text: body.to_owned(),
        };

        let response = self
            .send(Method::POST, url, Some(content), token)
            .instrument(self.span.clone())
            .await?;
        Ok(ResponseBody::new(Method::POST, url, response, token.clone()))
    }

    /// Issue a DELETE request; the response is released before returning
    pub async fn delete(&self, url: &str, token: &CancellationToken) -> Result<()> {
        let _response = self
            .send(Method::DELETE, url, None, token)
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }

    /// Install an `Authorization` header sent with every subsequent request
    pub fn set_authorization_header(&self, scheme: &str, parameter: &str) -> Result<()> {
        let _guard = self.span.enter();

        let raw = if parameter.is_empty() {
            scheme.to_string()
        } else {
            format!("{scheme} {parameter}")
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|e| Error::invalid_header(AUTHORIZATION.as_str(), e))?;
        value.set_sensitive(true);

        self.headers_mut().insert(AUTHORIZATION, value);
        info!(scheme, "Authorization header set");
        Ok(())
    }

    /// Remove the `Authorization` header; returns whether one was installed
    pub fn remove_authorization_header(&self) -> bool {
        let _guard = self.span.enter();

        let removed = self.headers_mut().remove(AUTHORIZATION).is_some();
        if removed {
            info!("Authorization header removed");
        }
        removed
    }

    /// Currently installed `Authorization` value
    pub fn authorization_header(&self) -> Option<String> {
        self.headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Release the transport. Calling this again is a no-op.
    pub fn dispose(&self) {
        let _guard = self.span.enter();

        let released = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            info!("HTTP adapter disposed");
        } else {
            debug!("HTTP adapter already disposed");
        }
    }

    /// Check if the transport has been released
    pub fn is_disposed(&self) -> bool {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Send a request and check its status
    async fn send(
        &self,
        method: Method,
        url: &str,
        content: Option<Content>,
        token: &CancellationToken,
    ) -> Result<Response> {
        if token.is_cancelled() {
            debug!(%method, url, "Request cancelled before sending");
            return Err(Error::cancelled(url));
        }

        let client = self.client()?;
        let target = Url::parse(url)?;

        // Snapshot so header changes never reach a request already built
        let headers = self.headers().clone();
        let mut req = client.request(method.clone(), target).headers(headers);
        if let Some(content) = content {
            req = req
                .header(CONTENT_TYPE, content.content_type)
                .body(content.text);
        }

        debug!(%method, url, "Sending request");
        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(%method, url, "Request cancelled in flight");
                return Err(Error::cancelled(url));
            }
            result = req.send() => result,
        };

        let response = result.map_err(|e| map_transport_error(&method, url, e, token))?;
        ensure_success(&method, url, response)
    }

    /// Clone of the transport handle
    fn client(&self) -> Result<Client> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::Disposed)
    }

    fn headers(&self) -> RwLockReadGuard<'_, HeaderMap> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn headers_mut(&self) -> RwLockWriteGuard<'_, HeaderMap> {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("default_headers", &*self.headers())
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Parse configured header pairs into a header map
fn parse_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| Error::invalid_header(key, e))?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::invalid_header(key, e))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Fail with the status code and reason phrase unless the status is 2xx
fn ensure_success(method: &Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!(%method, url, status = status.as_u16(), "Request succeeded");
        return Ok(response);
    }

    // hyper only records the phrase when it differs from the canonical one
    let reason = match response.extensions().get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => status.canonical_reason().unwrap_or("Unknown").to_string(),
    };
    warn!(%method, url, status = status.as_u16(), reason = %reason, "Request failed");
    Err(RequestError::status(status.as_u16(), reason).into())
}

/// Content type of a UTF-8 text body
///
/// A charset the caller already named is left as is.
fn utf8_content_type(content_type: &str) -> Result<HeaderValue> {
    let has_charset = content_type
        .split(';')
        .skip(1)
        .any(|param| param.trim().to_ascii_lowercase().starts_with("charset="));

    let value = if has_charset {
        content_type.to_string()
    } else {
        format!("{content_type}; charset=utf-8")
    };
    HeaderValue::from_str(&value).map_err(|e| Error::invalid_header(CONTENT_TYPE.as_str(), e))
}

/// Map a reqwest failure onto the crate error
///
/// Timeouts go through [`abort_error`]. Network failures become a
/// [`RequestError`]. Anything else is logged and returned unchanged.
pub(super) fn map_transport_error(
    method: &Method,
    url: &str,
    error: reqwest::Error,
    token: &CancellationToken,
) -> Error {
    if error.is_timeout() {
        return abort_error(url, token, Some(error));
    }

    if error.is_connect()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
        || error.is_redirect()
    {
        warn!(%method, url, error = %error, "Transport failure");
        return RequestError::transport(error).into();
    }

    error!(%method, url, error = %error, "Unexpected HTTP failure");
    Error::Http(error)
}

/// Decide whether an aborted request was cancelled by the caller or timed out
///
/// Only the caller's own token counts as a cancellation.
pub(super) fn abort_error(
    url: &str,
    token: &CancellationToken,
    source: Option<reqwest::Error>,
) -> Error {
    if token.is_cancelled() {
        debug!(url, "Request aborted by caller");
        return Error::cancelled(url);
    }

    warn!(url, "Request timed out");
    let timeout = RequestError::timeout(url);
    match source {
        Some(source) => timeout.with_source(source).into(),
        None => timeout.into(),
    }
}
