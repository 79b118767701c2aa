//! C-ABI wrapper around `request-core`.
//!
//! # Overview
//! Exposes request construction, the header/form/query transformations and
//! the query decoder through `extern "C"` functions, so any language with a C
//! FFI can derive modified requests without linking to Rust directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Requests are opaque `FfiRequest` handles. A transformation never
//!   mutates its input handle; it returns a new one.
//! - Infallible transformations return a handle (null on a null argument);
//!   fallible ones return an `FfiRequestResult` envelope.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `mr_free_*` / `mr_request_free` function.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::str::Utf8Error;

use request_core::{modify, HttpMethod, HttpRequest, Multimap, RequestError, Uri};

use types::*;

/// Borrow a non-null C string as UTF-8.
fn to_str<'a>(s: *const c_char) -> Result<&'a str, Utf8Error> {
    unsafe { CStr::from_ptr(s) }.to_str()
}

/// Borrow argument `name` as UTF-8, reporting invalid bytes as `Decoding`.
fn arg<'a>(s: *const c_char, name: &str) -> request_core::Result<&'a str> {
    to_str(s).map_err(|e| RequestError::Decoding {
        input: format!("argument {name}"),
        reason: e.to_string(),
    })
}

fn single(key: &str, value: &str) -> Multimap {
    [(key, value)].into_iter().collect()
}

// ---------------------------------------------------------------------------
// Request lifecycle
// ---------------------------------------------------------------------------

/// Create a request with no headers and no payload.
///
/// `method` is an upper-case token such as `"GET"`; `endpoint` an absolute
/// URI. Returns an envelope; free it with `mr_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_new(
    method: *const c_char,
    endpoint: *const c_char,
) -> *mut FfiRequestResult {
    catch_unwind(|| {
        if method.is_null() {
            return FfiRequestResult::null_arg("method");
        }
        if endpoint.is_null() {
            return FfiRequestResult::null_arg("endpoint");
        }
        let built = || -> request_core::Result<HttpRequest> {
            let method: HttpMethod = arg(method, "method")?.parse()?;
            let endpoint: Uri = arg(endpoint, "endpoint")?.parse()?;
            Ok(HttpRequest::builder(method, endpoint).build())
        };
        FfiRequestResult::from_result(built())
    })
    .unwrap_or_else(|_| FfiRequestResult::panic("panic in mr_request_new"))
}

/// Free a request handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_free(req: *mut FfiRequest) {
    if !req.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(req) });
        });
    }
}

// ---------------------------------------------------------------------------
// Transformations
// ---------------------------------------------------------------------------

/// Derive a copy of `req` sent to `endpoint`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_endpoint(
    req: *const FfiRequest,
    endpoint: *const c_char,
) -> *mut FfiRequestResult {
    catch_unwind(|| {
        if req.is_null() {
            return FfiRequestResult::null_arg("req");
        }
        if endpoint.is_null() {
            return FfiRequestResult::null_arg("endpoint");
        }
        let req = unsafe { &*req };
        let moved = || -> request_core::Result<HttpRequest> {
            let uri: Uri = arg(endpoint, "endpoint")?.parse()?;
            Ok(modify::endpoint(&req.inner, uri))
        };
        FfiRequestResult::from_result(moved())
    })
    .unwrap_or_else(|_| FfiRequestResult::panic("panic in mr_request_endpoint"))
}

/// Derive a copy of `req` where header `name` has exactly one value.
///
/// Returns null if any argument is null or not UTF-8. Free with
/// `mr_request_free`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_replace_header(
    req: *const FfiRequest,
    name: *const c_char,
    value: *const c_char,
) -> *mut FfiRequest {
    catch_unwind(|| {
        if req.is_null() || name.is_null() || value.is_null() {
            return std::ptr::null_mut();
        }
        let (Ok(name), Ok(value)) = (to_str(name), to_str(value)) else {
            return std::ptr::null_mut();
        };
        let req = unsafe { &*req };
        FfiRequest::boxed(modify::replace_header(&req.inner, name, value))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Derive a copy of `req` without header `name`.
///
/// Returns null if any argument is null or not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_remove_header(
    req: *const FfiRequest,
    name: *const c_char,
) -> *mut FfiRequest {
    catch_unwind(|| {
        if req.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(name) = to_str(name) else {
            return std::ptr::null_mut();
        };
        let req = unsafe { &*req };
        FfiRequest::boxed(modify::remove_header(&req.inner, name))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Derive a copy of `req` with one more value for header `name`.
///
/// Returns null if any argument is null or not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_put_header(
    req: *const FfiRequest,
    name: *const c_char,
    value: *const c_char,
) -> *mut FfiRequest {
    catch_unwind(|| {
        if req.is_null() || name.is_null() || value.is_null() {
            return std::ptr::null_mut();
        }
        let (Ok(name), Ok(value)) = (to_str(name), to_str(value)) else {
            return std::ptr::null_mut();
        };
        let req = unsafe { &*req };
        let additions = single(name, value);
        FfiRequest::boxed(modify::put_headers(&req.inner, &additions))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Derive a copy of `req` whose form body has `key=value` appended.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_put_form_param(
    req: *const FfiRequest,
    key: *const c_char,
    value: *const c_char,
) -> *mut FfiRequestResult {
    catch_unwind(|| {
        if req.is_null() {
            return FfiRequestResult::null_arg("req");
        }
        if key.is_null() || value.is_null() {
            return FfiRequestResult::null_arg("key/value");
        }
        let req = unsafe { &*req };
        let merged = || -> request_core::Result<HttpRequest> {
            let additions = single(arg(key, "key")?, arg(value, "value")?);
            modify::put_form_params(&req.inner, &additions)
        };
        FfiRequestResult::from_result(merged())
    })
    .unwrap_or_else(|_| FfiRequestResult::panic("panic in mr_request_put_form_param"))
}

/// Derive a copy of `req` whose endpoint query has `key=value` appended.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_add_query_param(
    req: *const FfiRequest,
    key: *const c_char,
    value: *const c_char,
) -> *mut FfiRequestResult {
    catch_unwind(|| {
        if req.is_null() {
            return FfiRequestResult::null_arg("req");
        }
        if key.is_null() || value.is_null() {
            return FfiRequestResult::null_arg("key/value");
        }
        let req = unsafe { &*req };
        let merged = || -> request_core::Result<HttpRequest> {
            let additions = single(arg(key, "key")?, arg(value, "value")?);
            modify::add_query_params(&req.inner, &additions)
        };
        FfiRequestResult::from_result(merged())
    })
    .unwrap_or_else(|_| FfiRequestResult::panic("panic in mr_request_add_query_param"))
}

/// Take ownership of the request held by a successful result, leaving null
/// behind so `mr_free_result` does not free it. Returns null on failure
/// results or a null `result`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_result_take_request(result: *mut FfiRequestResult) -> *mut FfiRequest {
    if result.is_null() {
        return std::ptr::null_mut();
    }
    let result = unsafe { &mut *result };
    std::mem::replace(&mut result.request, std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Views and query parsing
// ---------------------------------------------------------------------------

/// Flatten `req` into C strings. Returns null if `req` is null or if its
/// endpoint, a header, the body or the content type holds a NUL byte.
/// Free with `mr_free_view`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_request_view(req: *const FfiRequest) -> *mut FfiRequestView {
    catch_unwind(|| {
        if req.is_null() {
            return std::ptr::null_mut();
        }
        let req = unsafe { &*req };
        FfiRequestView::from_core(&req.inner)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Decode a form-encoded query string into ordered pairs.
/// Free with `mr_free_query_result`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_query_parse(raw: *const c_char) -> *mut FfiQueryResult {
    catch_unwind(|| {
        if raw.is_null() {
            return FfiQueryResult::failure(FfiErrorCode::NullArg, "null argument: raw");
        }
        FfiQueryResult::from_result(arg(raw, "raw").and_then(request_core::parse_query_to_map))
    })
    .unwrap_or_else(|_| FfiQueryResult::failure(FfiErrorCode::Panic, "panic in mr_query_parse"))
}

/// Form-encode `value`. Returns null if `value` is null or not UTF-8.
/// Free with `mr_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn mr_url_encode(value: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        if value.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(value) = to_str(value) else {
            return std::ptr::null_mut();
        };
        c_string(request_core::url_encode(value, &[]))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiRequestResult`, including any request it still holds.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mr_free_result(result: *mut FfiRequestResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.request.is_null() {
            drop(unsafe { Box::from_raw(result.request) });
        }
    });
}

/// Free an `FfiRequestView` returned by `mr_request_view`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mr_free_view(view: *mut FfiRequestView) {
    if view.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let view = unsafe { Box::from_raw(view) };
        view.release();
    });
}

/// Free an `FfiQueryResult` returned by `mr_query_parse`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mr_free_query_result(result: *mut FfiQueryResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_pairs(result.params, result.params_len);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mr_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
