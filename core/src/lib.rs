//! Request modification core for cloud API clients.
//!
//! # Overview
//! Describes outbound HTTP requests as immutable values and derives modified
//! copies of them (new endpoint, replaced or merged headers, merged form or
//! query parameters) without touching the network (host-does-IO pattern).
//! The caller executes the final request with whatever client it likes.
//!
//! # Design
//! - `HttpRequest` is immutable; the `modify` functions borrow one and return
//!   a new one.
//! - Headers, form bodies and query strings share one insertion-ordered
//!   `Multimap`, because repeated keys carry meaning.
//! - `query` owns the `application/x-www-form-urlencoded` codec; the form
//!   and query functions in `modify` are built on it.
//! - Library code only emits `tracing` events; installing a subscriber is the
//!   host's job.

pub mod error;
pub mod modify;
pub mod multimap;
pub mod query;
pub mod request;

pub use error::{RequestError, Result};
pub use http::Uri;
pub use multimap::{KeyMatch, Multimap};
pub use query::{make_query_line, parse_query_to_map, url_decode, url_encode};
pub use request::{ContentMetadata, HttpMethod, HttpRequest, HttpRequestBuilder, Payload, FORM_URLENCODED};
