//! Dial target: WebSocket URL plus handshake headers.
//!
//! An [`Endpoint`] is validated once at construction and never changes
//! afterwards. Every dial attempt builds its handshake request from it.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Endpoint
// ============================================================================

/// Immutable WebSocket dial target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Parsed `ws://` or `wss://` URL.
    url: Url,
    /// Extra headers sent with the opening handshake.
    headers: HeaderMap,
}

impl Endpoint {
    /// Parses and validates a WebSocket URL.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if the URL does not parse, has no host, or its
    /// scheme is not `ws` or `wss`.
    pub fn parse(raw_url: &str) -> Result<Self> {
        let url = Url::parse(raw_url).map_err(|e| Error::invalid_url(raw_url, e.to_string()))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::invalid_url(
                    raw_url,
                    format!("unsupported scheme '{other}', expected 'ws' or 'wss'"),
                ));
            }
        }

        if url.host_str().is_none() {
            return Err(Error::invalid_url(raw_url, "missing host"));
        }

        Ok(Self {
            url,
            headers: HeaderMap::new(),
        })
    }

    /// Parses a URL and attaches handshake headers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] or [`Error::InvalidHeader`].
    pub fn with_headers<I, K, V>(raw_url: &str, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut endpoint = Self::parse(raw_url)?;
        for (name, value) in headers {
            endpoint.append_header(name.as_ref(), value.as_ref())?;
        }
        Ok(endpoint)
    }

    /// Validates and appends one handshake header.
    ///
    /// Repeated names are kept as multiple values.
    pub(crate) fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_header(name, e.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e.to_string()))?;

        self.headers.append(header_name, header_value);
        Ok(())
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the extra handshake headers.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns `true` for `wss://` targets.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Builds the opening handshake request.
    ///
    /// Caller headers are added on top of the generated WebSocket headers.
    pub(crate) fn handshake_request(&self) -> Result<Request> {
        let mut request = self.url.as_str().into_client_request()?;
        for (name, value) in &self.headers {
            request.headers_mut().append(name.clone(), value.clone());
        }
        Ok(request)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
