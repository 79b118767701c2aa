//! Local HTTP server that reports back what it received.
//!
//! Integration tests execute requests derived by `request-core` against this
//! server to check that endpoints, headers and form bodies survive a real
//! HTTP round-trip exactly as built.

use axum::{
    extract::Form,
    http::{HeaderMap, Method, Uri},
    routing::{any, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

/// Everything the server saw of one request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub request_id: Uuid,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header names are lower-cased by the HTTP stack.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Echo {
    /// Values received for header `name` (lower-case), in arrival order.
    pub fn header(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/form", post(form))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let echo = Echo {
        request_id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    };
    info!(id = %echo.request_id, method = %echo.method, path = %echo.path, "echoing request");
    Json(echo)
}

/// Decode a form body with the server's own decoder and return its pairs.
async fn form(Form(pairs): Form<Vec<(String, String)>>) -> Json<Vec<(String, String)>> {
    info!(pairs = pairs.len(), "decoded form body");
    Json(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_with_headers(headers: &[(&str, &str)]) -> Echo {
        Echo {
            request_id: Uuid::nil(),
            method: "GET".to_string(),
            path: "/echo".to_string(),
            query: None,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn header_lookup_keeps_order() {
        let echo = echo_with_headers(&[("foo", "bar"), ("x", "1"), ("foo", "baz")]);
        assert_eq!(echo.header("foo"), vec!["bar", "baz"]);
        assert!(echo.header("missing").is_empty());
    }

    #[test]
    fn echo_serializes_to_json() {
        let echo = echo_with_headers(&[("foo", "bar")]);
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["request_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["method"], "GET");
        assert_eq!(json["query"], serde_json::Value::Null);
        assert_eq!(json["headers"][0][0], "foo");
        assert_eq!(json["headers"][0][1], "bar");
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let echo = echo_with_headers(&[("a", "1")]);
        let json = serde_json::to_string(&echo).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, echo);
    }
}
