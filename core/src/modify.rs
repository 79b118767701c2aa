//! Derive modified copies of an `HttpRequest`.
//!
//! # Design
//! Every function here borrows a request and returns a fresh one with a
//! single attribute changed; the input is never touched. Callers chain them
//! to prepare a request for a redirect, a retry or signing:
//!
//! ```
//! use request_core::{modify, HttpMethod, HttpRequest, Multimap};
//!
//! let request = HttpRequest::builder(HttpMethod::Post, "http://foo".parse().unwrap())
//!     .header("foo", "bar")
//!     .build();
//! let signed = modify::replace_header(&request, "Authorization", "Bearer t");
//! let extra: Multimap = [("foo", "baz")].into_iter().collect();
//! let merged = modify::put_form_params(&signed, &extra).unwrap();
//! assert_eq!(merged.payload().unwrap().as_str().unwrap(), "foo=baz");
//! ```
//!
//! Header names match case-sensitively. The `*_matching` variants take a
//! `KeyMatch` for callers that need HTTP's case-insensitive names.

use http::uri::{PathAndQuery, Uri};
use tracing::{debug, trace};

use crate::error::{RequestError, Result};
use crate::multimap::{KeyMatch, Multimap};
use crate::query::{make_query_line, parse_query_to_map};
use crate::request::{HttpRequest, Payload, FORM_URLENCODED};

/// Copy of `request` sent to `endpoint` instead.
pub fn endpoint(request: &HttpRequest, endpoint: Uri) -> HttpRequest {
    request.to_builder().endpoint(endpoint).build()
}

/// Copy of `request` where `name` has exactly one value, `value`.
pub fn replace_header(request: &HttpRequest, name: &str, value: &str) -> HttpRequest {
    replace_header_matching(request, name, value, KeyMatch::Exact)
}

pub fn replace_header_matching(
    request: &HttpRequest,
    name: &str,
    value: &str,
    how: KeyMatch,
) -> HttpRequest {
    trace!(header = name, "replacing header");
    let mut headers = request.headers().clone();
    headers.replace_values_matching(name, [value], how);
    request.to_builder().headers(headers).build()
}

/// Copy of `request` where `name` has exactly `values`, in order.
pub fn replace_header_values<I, V>(request: &HttpRequest, name: &str, values: I) -> HttpRequest
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    trace!(header = name, "replacing header values");
    let mut headers = request.headers().clone();
    headers.replace_values(name, values);
    request.to_builder().headers(headers).build()
}

/// Copy of `request` without any entry for `name`. Absent names are a no-op.
pub fn remove_header(request: &HttpRequest, name: &str) -> HttpRequest {
    remove_header_matching(request, name, KeyMatch::Exact)
}

pub fn remove_header_matching(request: &HttpRequest, name: &str, how: KeyMatch) -> HttpRequest {
    trace!(header = name, "removing header");
    let mut headers = request.headers().clone();
    headers.remove_all_matching(name, how);
    request.to_builder().headers(headers).build()
}

/// Copy of `request` where every key of `replacements` carries exactly the
/// values it has there. Keys not in `replacements` are left alone.
pub fn replace_headers(request: &HttpRequest, replacements: &Multimap) -> HttpRequest {
    let mut headers = request.headers().clone();
    for name in replacements.keys() {
        trace!(header = name, "replacing header values");
        headers.replace_values(name, replacements.get(name));
    }
    request.to_builder().headers(headers).build()
}

/// Copy of `request` with every entry of `additions` appended to the
/// existing header values.
pub fn put_headers(request: &HttpRequest, additions: &Multimap) -> HttpRequest {
    trace!(count = additions.len(), "adding header values");
    let mut headers = request.headers().clone();
    headers.put_all(additions);
    request.to_builder().headers(headers).build()
}

/// Copy of `request` whose form body has `additions` appended.
///
/// A missing payload counts as an empty form; a payload without a content
/// type is read as a form. The result always carries the form content type.
pub fn put_form_params(request: &HttpRequest, additions: &Multimap) -> Result<HttpRequest> {
    let mut form = match request.payload() {
        None => Multimap::new(),
        Some(payload) => {
            if let Some(mime) = payload.metadata().mime_type() {
                if mime != FORM_URLENCODED {
                    return Err(RequestError::UnsupportedPayload {
                        content_type: payload.metadata().content_type().unwrap_or_default().to_string(),
                    });
                }
            }
            parse_query_to_map(payload.as_str()?)?
        }
    };
    debug!(existing = form.len(), added = additions.len(), "merging form parameters");
    form.put_all(additions);
    let body = make_query_line(&form, None, &[]);
    let payload = Payload::from_string(body).with_content_type(FORM_URLENCODED);
    Ok(request.to_builder().payload(payload).build())
}

/// Copy of `request` with `params` appended to the endpoint's query string.
pub fn add_query_params(request: &HttpRequest, params: &Multimap) -> Result<HttpRequest> {
    let mut query = endpoint_query(request.endpoint())?;
    debug!(existing = query.len(), added = params.len(), "adding query parameters");
    query.put_all(params);
    let uri = with_query(request.endpoint(), &query)?;
    Ok(endpoint(request, uri))
}

/// Copy of `request` whose endpoint query carries `name=value` only once.
pub fn replace_query_param(request: &HttpRequest, name: &str, value: &str) -> Result<HttpRequest> {
    let replacement: Multimap = [(name, value)].into_iter().collect();
    replace_query_params(request, &replacement)
}

/// Copy of `request` where every key of `params` carries exactly the values
/// it has there in the endpoint's query string.
pub fn replace_query_params(request: &HttpRequest, params: &Multimap) -> Result<HttpRequest> {
    let mut query = endpoint_query(request.endpoint())?;
    for name in params.keys() {
        query.replace_values(name, params.get(name));
    }
    debug!(params = params.len(), "replacing query parameters");
    let uri = with_query(request.endpoint(), &query)?;
    Ok(endpoint(request, uri))
}

fn endpoint_query(uri: &Uri) -> Result<Multimap> {
    parse_query_to_map(uri.query().unwrap_or(""))
}

/// Rebuild `uri` with `query` as its query string, dropping `?` when empty.
fn with_query(uri: &Uri, query: &Multimap) -> Result<Uri> {
    let line = make_query_line(query, None, &[]);
    let path_and_query = if line.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), line)
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn get(endpoint: &str) -> crate::request::HttpRequestBuilder {
        HttpRequest::builder(HttpMethod::Get, uri(endpoint))
    }

    fn map(pairs: &[(&str, &str)]) -> Multimap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn endpoint_replaces_only_the_uri() {
        let request = get("http://foo").build();
        assert_eq!(endpoint(&request, uri("http://bar")), get("http://bar").build());
    }

    #[test]
    fn endpoint_keeps_headers_and_payload() {
        let request = get("http://foo")
            .header("foo", "bar")
            .payload(Payload::from_string("x"))
            .build();
        let moved = endpoint(&request, uri("https://bar/path?q=1"));
        assert_eq!(moved.endpoint(), &uri("https://bar/path?q=1"));
        assert_eq!(moved.headers(), request.headers());
        assert_eq!(moved.payload(), request.payload());
        assert_eq!(moved.method(), request.method());
    }

    #[test]
    fn replace_header_sets_single_value() {
        let request = get("http://foo").headers(map(&[("foo", "bar")])).build();
        assert_eq!(
            replace_header(&request, "foo", "baz"),
            get("http://foo").headers(map(&[("foo", "baz")])).build()
        );
    }

    #[test]
    fn replace_header_adds_absent_name() {
        let request = get("http://foo").headers(map(&[("foo", "bar")])).build();
        let replaced = replace_header(&request, "new", "v");
        assert_eq!(replaced.headers(), &map(&[("foo", "bar"), ("new", "v")]));
    }

    #[test]
    fn replace_header_collapses_multiple_values() {
        let request = get("http://foo")
            .headers(map(&[("foo", "a"), ("x", "1"), ("foo", "b")]))
            .build();
        let replaced = replace_header(&request, "foo", "c");
        assert_eq!(replaced.headers(), &map(&[("foo", "c"), ("x", "1")]));
    }

    #[test]
    fn replace_then_remove_equals_remove() {
        let request = get("http://foo").headers(map(&[("foo", "bar"), ("x", "1")])).build();
        assert_eq!(
            remove_header(&replace_header(&request, "foo", "baz"), "foo"),
            remove_header(&request, "foo")
        );
    }

    #[test]
    fn remove_header_drops_every_value() {
        let request = get("http://foo").headers(map(&[("foo", "bar")])).build();
        assert_eq!(remove_header(&request, "foo"), get("http://foo").build());
    }

    #[test]
    fn remove_header_is_idempotent() {
        let request = get("http://foo").headers(map(&[("foo", "bar"), ("x", "1")])).build();
        let once = remove_header(&request, "foo");
        assert_eq!(remove_header(&once, "foo"), once);
        assert_eq!(remove_header(&request, "absent"), request);
    }

    #[test]
    fn header_names_are_case_sensitive_by_default() {
        let request = get("http://foo").header("Content-Type", "text/plain").build();
        assert_eq!(remove_header(&request, "content-type"), request);
    }

    #[test]
    fn case_insensitive_matching_is_opt_in() {
        let request = get("http://foo")
            .header("Content-Type", "text/plain")
            .header("Accept", "*/*")
            .build();
        let removed = remove_header_matching(&request, "content-type", KeyMatch::IgnoreAsciiCase);
        assert_eq!(removed.headers(), &map(&[("Accept", "*/*")]));

        let replaced =
            replace_header_matching(&request, "CONTENT-TYPE", "application/json", KeyMatch::IgnoreAsciiCase);
        assert_eq!(
            replaced.headers(),
            &map(&[("CONTENT-TYPE", "application/json"), ("Accept", "*/*")])
        );
    }

    #[test]
    fn replace_header_values_sets_all_given() {
        let request = get("http://foo").headers(map(&[("foo", "bar")])).build();
        let replaced = replace_header_values(&request, "foo", ["a", "b"]);
        assert_eq!(replaced.headers().get("foo"), vec!["a", "b"]);
    }

    #[test]
    fn replace_headers_overwrites_per_key() {
        let request = get("http://foo")
            .headers(map(&[("foo", "bar"), ("rabbit", "tree")]))
            .build();
        assert_eq!(
            replace_headers(
                &request,
                &map(&[("foo", "bar"), ("rabbit", "robot"), ("robert", "baz")])
            ),
            get("http://foo")
                .headers(map(&[("foo", "bar"), ("rabbit", "robot"), ("robert", "baz")]))
                .build()
        );
    }

    #[test]
    fn replace_headers_leaves_other_keys() {
        let request = get("http://foo").headers(map(&[("keep", "1"), ("foo", "bar")])).build();
        let replaced = replace_headers(&request, &map(&[("foo", "x"), ("foo", "y")]));
        assert_eq!(
            replaced.headers(),
            &map(&[("keep", "1"), ("foo", "x"), ("foo", "y")])
        );
    }

    #[test]
    fn put_headers_adds_another_value() {
        let request = get("http://foo").headers(map(&[("foo", "bar")])).build();
        assert_eq!(
            put_headers(&request, &map(&[("foo", "baz")])),
            get("http://foo").headers(map(&[("foo", "bar"), ("foo", "baz")])).build()
        );
    }

    #[test]
    fn put_form_params_adds_another_value() {
        let request = get("http://foo").payload(Payload::from_string("foo=bar")).build();
        let expected = get("http://foo")
            .payload(Payload::from_string("foo=bar&foo=baz").with_content_type(FORM_URLENCODED))
            .build();
        assert_eq!(put_form_params(&request, &map(&[("foo", "baz")])).unwrap(), expected);
    }

    #[test]
    fn put_form_params_without_payload() {
        let request = get("http://foo").build();
        let merged = put_form_params(&request, &map(&[("a b", "c=d")])).unwrap();
        let payload = merged.payload().unwrap();
        assert_eq!(payload.as_str().unwrap(), "a+b=c%3Dd");
        assert_eq!(payload.metadata().content_type(), Some(FORM_URLENCODED));
    }

    #[test]
    fn put_form_params_accepts_form_with_charset() {
        let request = get("http://foo")
            .payload(Payload::from_string("a=1").with_content_type("application/x-www-form-urlencoded; charset=UTF-8"))
            .build();
        let merged = put_form_params(&request, &map(&[("b", "2")])).unwrap();
        assert_eq!(merged.payload().unwrap().as_str().unwrap(), "a=1&b=2");
    }

    #[test]
    fn put_form_params_rejects_other_content_types() {
        let request = get("http://foo")
            .payload(Payload::from_string("{}").with_content_type("application/json"))
            .build();
        let err = put_form_params(&request, &map(&[("foo", "baz")])).unwrap_err();
        assert!(matches!(
            err,
            RequestError::UnsupportedPayload { ref content_type } if content_type == "application/json"
        ));
    }

    #[test]
    fn put_form_params_rejects_malformed_body() {
        let request = get("http://foo").payload(Payload::from_string("a=%zz")).build();
        let err = put_form_params(&request, &map(&[("foo", "baz")])).unwrap_err();
        assert!(matches!(err, RequestError::Decoding { .. }));
    }

    #[test]
    fn put_form_params_leaves_input_untouched() {
        let request = get("http://foo").payload(Payload::from_string("foo=bar")).build();
        let before = request.clone();
        let _ = put_form_params(&request, &map(&[("foo", "baz")])).unwrap();
        assert_eq!(request, before);
    }

    #[test]
    fn add_query_params_appends() {
        let request = get("http://foo/path?v=1.3").build();
        let added = add_query_params(&request, &map(&[("sig", "a b"), ("v", "2")])).unwrap();
        assert_eq!(added.endpoint(), &uri("http://foo/path?v=1.3&sig=a+b&v=2"));
    }

    #[test]
    fn add_query_params_to_bare_endpoint() {
        let request = get("http://foo").build();
        let added = add_query_params(&request, &map(&[("network[0].id", "23")])).unwrap();
        assert_eq!(added.endpoint().query(), Some("network%5B0%5D.id=23"));
    }

    #[test]
    fn replace_query_param_overwrites() {
        let request = get("http://foo/?a=1&b=2&a=3").build();
        let replaced = replace_query_param(&request, "a", "9").unwrap();
        assert_eq!(replaced.endpoint(), &uri("http://foo/?a=9&b=2"));
    }

    #[test]
    fn replace_query_params_adds_missing() {
        let request = get("http://foo/x?a=1").build();
        let replaced = replace_query_params(&request, &map(&[("b", "2"), ("a", "0")])).unwrap();
        assert_eq!(replaced.endpoint(), &uri("http://foo/x?a=0&b=2"));
    }
}
