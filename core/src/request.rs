//! Request descriptors for the host-does-IO pattern.
//!
//! # Design
//! `HttpRequest` describes an outbound request as plain data. The core never
//! touches the network: callers build a request, derive modified copies with
//! the functions in `crate::modify`, and execute the final value with their
//! own client.
//!
//! A request is immutable once built. Fields are private and only readable
//! through accessors; a modified copy goes through `to_builder()`.

use std::fmt;
use std::str::FromStr;

use http::Uri;
use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};
use crate::multimap::Multimap;

/// MIME type of a form-urlencoded body.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(RequestError::UnknownMethod(other.to_string())),
        }
    }
}

/// Content metadata carried alongside a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMetadata {
    content_type: Option<String>,
}

impl ContentMetadata {
    /// The full content type, parameters included.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Lower-cased MIME type without parameters, e.g. `text/plain`.
    pub fn mime_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
    }

    /// The `charset` parameter, if the content type carries one.
    pub fn charset(&self) -> Option<&str> {
        self.content_type
            .as_deref()?
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"'))
    }
}

/// A request body: raw content plus its content metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    content: Vec<u8>,
    metadata: ContentMetadata,
}

impl Payload {
    /// A payload with no content type.
    pub fn from_string(content: impl Into<String>) -> Self {
        Self::from_bytes(content.into().into_bytes())
    }

    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            metadata: ContentMetadata::default(),
        }
    }

    /// Return a copy with the content type set to `content_type`.
    pub fn with_content_type(&self, content_type: impl Into<String>) -> Self {
        Self {
            content: self.content.clone(),
            metadata: ContentMetadata {
                content_type: Some(content_type.into()),
            },
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }

    /// The content as UTF-8 text.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.content)
            .map_err(|e| RequestError::decoding("<payload>", e.to_string()))
    }
}

/// An outbound HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    endpoint: Uri,
    headers: Multimap,
    payload: Option<Payload>,
}

impl HttpRequest {
    pub fn builder(method: HttpMethod, endpoint: Uri) -> HttpRequestBuilder {
        HttpRequestBuilder {
            method,
            endpoint,
            headers: Multimap::new(),
            payload: None,
        }
    }

    /// Start a builder pre-filled with every field of this request.
    pub fn to_builder(&self) -> HttpRequestBuilder {
        HttpRequestBuilder {
            method: self.method,
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            payload: self.payload.clone(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub fn headers(&self) -> &Multimap {
        &self.headers
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

/// Builder for `HttpRequest`. The only way to construct one.
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    method: HttpMethod,
    endpoint: Uri,
    headers: Multimap,
    payload: Option<Payload>,
}

impl HttpRequestBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn endpoint(mut self, endpoint: Uri) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Add one header value, keeping values already set for `name`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.put(name, value);
        self
    }

    /// Replace the whole header set.
    pub fn headers(mut self, headers: Multimap) -> Self {
        self.headers = headers;
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            endpoint: self.endpoint,
            headers: self.headers,
            payload: self.payload,
        }
    }
}
