//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests stay opaque (`FfiRequest`) so C callers chain transformations
//! without copying headers back and forth; `FfiRequestView` flattens one into
//! C strings when the caller needs to execute it. Fallible operations return a
//! result envelope carrying an `FfiErrorCode` and a message. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use request_core::{HttpMethod, HttpRequest, Multimap, RequestError};

/// Opaque handle to an immutable `HttpRequest`. Every transformation returns
/// a new handle; the input handle stays valid and unchanged.
pub struct FfiRequest {
    pub(crate) inner: HttpRequest,
}

impl FfiRequest {
    pub(crate) fn boxed(inner: HttpRequest) -> *mut Self {
        Box::into_raw(Box::new(FfiRequest { inner }))
    }
}

/// Build a C string, or `None` if `s` holds an interior NUL.
pub(crate) fn try_c_string(s: impl Into<Vec<u8>>) -> Option<*mut c_char> {
    CString::new(s).ok().map(CString::into_raw)
}

/// Build a C string for a diagnostic message, dropping any NUL bytes.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request view
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Head = 1,
    Post = 2,
    Put = 3,
    Patch = 4,
    Delete = 5,
    Options = 6,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Options => FfiHttpMethod::Options,
        }
    }
}

/// A single key-value pair of C strings, used for headers and query params.
#[repr(C)]
pub struct FfiPair {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Copy a multimap into a heap array of `FfiPair`. The array is null for an
/// empty map; free it with `free_pairs`.
///
/// Returns `None` if any key or value holds a NUL byte, after releasing the
/// strings already built.
pub(crate) fn pairs_from_map(map: &Multimap) -> Option<(*mut FfiPair, u32)> {
    if map.is_empty() {
        return Some((std::ptr::null_mut(), 0));
    }
    let mut pairs = Vec::with_capacity(map.len());
    for (k, v) in map.iter() {
        let pair = FfiPair {
            key: try_c_string(k).unwrap_or(std::ptr::null_mut()),
            value: try_c_string(v).unwrap_or(std::ptr::null_mut()),
        };
        let complete = !pair.key.is_null() && !pair.value.is_null();
        pairs.push(pair);
        if !complete {
            free_pair_strings(&pairs);
            return None;
        }
    }
    let len = pairs.len() as u32;
    let ptr = Box::into_raw(pairs.into_boxed_slice()) as *mut FfiPair;
    Some((ptr, len))
}

fn free_pair_strings(pairs: &[FfiPair]) {
    for pair in pairs {
        free_c_string(pair.key);
        free_c_string(pair.value);
    }
}

/// Free an array built by `pairs_from_map`, including its strings.
pub(crate) fn free_pairs(ptr: *mut FfiPair, len: u32) {
    if ptr.is_null() || len == 0 {
        return;
    }
    let pairs = unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) };
    free_pair_strings(&pairs);
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// An `HttpRequest` flattened into C-compatible plain data.
///
/// `body` and `content_type` are null when the request has no payload or no
/// content type. A request whose strings hold a NUL byte has no view.
#[repr(C)]
pub struct FfiRequestView {
    pub method: FfiHttpMethod,
    pub endpoint: *mut c_char,
    pub headers: *mut FfiPair,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub content_type: *mut c_char,
}

impl FfiRequestView {
    /// Flatten `req`, or return null if any of its strings holds a NUL byte.
    pub(crate) fn from_core(req: &HttpRequest) -> *mut Self {
        let mut view = FfiRequestView {
            method: req.method().into(),
            endpoint: std::ptr::null_mut(),
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
            content_type: std::ptr::null_mut(),
        };
        match view.fill(req) {
            Some(()) => Box::into_raw(Box::new(view)),
            None => {
                view.release();
                std::ptr::null_mut()
            }
        }
    }

    fn fill(&mut self, req: &HttpRequest) -> Option<()> {
        self.endpoint = try_c_string(req.endpoint().to_string())?;
        (self.headers, self.headers_len) = pairs_from_map(req.headers())?;
        if let Some(payload) = req.payload() {
            self.body = try_c_string(payload.content())?;
            if let Some(content_type) = payload.metadata().content_type() {
                self.content_type = try_c_string(content_type)?;
            }
        }
        Some(())
    }

    /// Free the strings and header array owned by this view.
    pub(crate) fn release(&self) {
        free_c_string(self.endpoint);
        free_c_string(self.body);
        free_c_string(self.content_type);
        free_pairs(self.headers, self.headers_len);
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in result envelopes.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UnsupportedPayload = 1,
    Decoding = 2,
    UnknownMethod = 3,
    InvalidUri = 4,
    Panic = 5,
    NullArg = 6,
}

fn describe(err: &RequestError) -> (FfiErrorCode, *mut c_char) {
    let code = match err {
        RequestError::UnsupportedPayload { .. } => FfiErrorCode::UnsupportedPayload,
        RequestError::Decoding { .. } => FfiErrorCode::Decoding,
        RequestError::UnknownMethod(_) => FfiErrorCode::UnknownMethod,
        RequestError::InvalidUri(_) | RequestError::InvalidUriParts(_) => FfiErrorCode::InvalidUri,
    };
    (code, c_string(err.to_string()))
}

/// Result envelope for fallible request operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `request`
/// holds the new handle. On failure `request` is null.
#[repr(C)]
pub struct FfiRequestResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub request: *mut FfiRequest,
}

impl FfiRequestResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, request: *mut FfiRequest) -> *mut Self {
        Box::into_raw(Box::new(FfiRequestResult {
            error_code,
            error_message,
            request,
        }))
    }

    pub(crate) fn ok(req: HttpRequest) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiRequest::boxed(req))
    }

    pub(crate) fn from_result(result: request_core::Result<HttpRequest>) -> *mut Self {
        match result {
            Ok(req) => Self::ok(req),
            Err(err) => {
                let (code, msg) = describe(&err);
                Self::boxed(code, msg, std::ptr::null_mut())
            }
        }
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = c_string(format!("null argument: {name}"));
        Self::boxed(FfiErrorCode::NullArg, msg, std::ptr::null_mut())
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg), std::ptr::null_mut())
    }
}

/// Result envelope for `mr_query_parse`.
///
/// On success `params` holds `params_len` decoded pairs in source order
/// (null when there are none).
#[repr(C)]
pub struct FfiQueryResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub params: *mut FfiPair,
    pub params_len: u32,
}

impl FfiQueryResult {
    pub(crate) fn from_result(result: request_core::Result<Multimap>) -> *mut Self {
        let map = match result {
            Ok(map) => map,
            Err(err) => {
                let (error_code, error_message) = describe(&err);
                return Self::boxed(error_code, error_message);
            }
        };
        match pairs_from_map(&map) {
            Some((params, params_len)) => Box::into_raw(Box::new(FfiQueryResult {
                error_code: FfiErrorCode::Ok,
                error_message: std::ptr::null_mut(),
                params,
                params_len,
            })),
            None => Self::failure(FfiErrorCode::Decoding, "decoded query holds a NUL byte"),
        }
    }

    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiQueryResult {
            error_code,
            error_message,
            params: std::ptr::null_mut(),
            params_len: 0,
        }))
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Self::boxed(error_code, c_string(msg))
    }
}
