//! `application/x-www-form-urlencoded` decoding and encoding.
//!
//! # Design
//! The encoder follows the standard web form convention: ASCII alphanumerics
//! and `.-*_` pass through, a space becomes `+`, every other byte of the
//! UTF-8 encoding becomes `%XX`. `url_decode` is its exact inverse and is
//! strict: a `%` that is not followed by two hex digits, or escapes that do
//! not form valid UTF-8, are errors rather than passed through.
//!
//! `parse_query_to_map` parses exactly the string it is given; a leading `?`
//! is not stripped.

use std::borrow::Cow;
use std::cmp::Ordering;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::error::{RequestError, Result};
use crate::multimap::Multimap;

/// Bytes escaped by the form encoder. Space is handled separately as `+`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// Comparator over `(key, value)` entries used by `make_query_line`.
pub type EntrySorter<'a> = &'a dyn Fn(&(&str, &str), &(&str, &str)) -> Ordering;

/// Form-encode `value`, leaving any character in `skips` unescaped.
pub fn url_encode(value: &str, skips: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for c in value.chars() {
        if skips.contains(&c) {
            out.push(c);
        } else if c == ' ' {
            out.push('+');
        } else {
            out.extend(utf8_percent_encode(c.encode_utf8(&mut buf), FORM));
        }
    }
    out
}

/// Decode a form-encoded `value`: `+` becomes a space, `%XX` escapes are
/// percent-decoded and the result must be valid UTF-8.
pub fn url_decode(value: &str) -> Result<String> {
    if !value.contains(['%', '+']) {
        return Ok(value.to_string());
    }
    check_escapes(value)?;
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| RequestError::decoding(value, e.to_string()))
}

/// Reject a `%` that does not start a two-digit hex escape.
fn check_escapes(value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
            _ => {
                return Err(RequestError::decoding(
                    value,
                    format!("malformed percent-escape at byte {i}"),
                ))
            }
        }
    }
    Ok(())
}

/// Parse `key1=value1&key2=value2` into an ordered multimap.
///
/// Pairs split on the first `=`; a bare key decodes to an empty value.
/// Empty segments are skipped, so `""`, `"&"` and `"a=1&&b=2"` are fine.
/// Repeated keys keep every value in the order encountered.
pub fn parse_query_to_map(raw: &str) -> Result<Multimap> {
    let mut map = Multimap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decoded = url_decode(key).and_then(|k| Ok((k, url_decode(value)?)));
        match decoded {
            Ok((k, v)) => map.put(k, v),
            Err(e) => {
                debug!(pair, error = %e, "rejecting query pair");
                return Err(e);
            }
        }
    }
    Ok(map)
}

/// Encode `params` as `k=v&k=v`, optionally ordering the entries first.
///
/// Keys and values are encoded with `url_encode(_, skips)`. The sort is
/// stable, so entries the sorter considers equal keep insertion order.
pub fn make_query_line(params: &Multimap, sorter: Option<EntrySorter<'_>>, skips: &[char]) -> String {
    let mut entries: Vec<(&str, &str)> = params.iter().collect();
    if let Some(sorter) = sorter {
        entries.sort_by(|a, b| sorter(a, b));
    }
    entries
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k, skips), url_encode(v, skips)))
        .collect::<Vec<_>>()
        .join("&")
}
