//! C-ABI wrapper around `wsdl-http-core`.
//!
//! # Overview
//! Exposes resolution, request building and response parsing through
//! `extern "C"` functions so any language with a C FFI can drive WSDL HTTP
//! bindings without linking against serde or the core's Rust types.
//! Documents and parameters cross the boundary as JSON strings.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `whttp_resolve` returns an opaque `FfiResolution`; build/parse calls
//!   look operations up by name in it.
//! - A single `FfiResult` envelope with an error code and a JSON `data`
//!   string conveys parse results and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `whttp_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::{Duration, Instant};

use log::debug;
use wsdl_http_core::{
    BindingAssembler, Element, HttpOperationBinding, HttpResponse, Parameters, ResolveOptions,
};

use types::*;

/// Borrow a C string as UTF-8. Null and invalid UTF-8 give `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Counts saturate at `u32::MAX`.
fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn lookup<'a>(res: &'a FfiResolution, operation: &str) -> Option<&'a HttpOperationBinding> {
    res.inner.binding(operation)
}

// ---------------------------------------------------------------------------
// Resolution lifecycle
// ---------------------------------------------------------------------------

fn resolve_json(document_json: *const c_char, options: ResolveOptions) -> *mut FfiResolution {
    let Some(json) = (unsafe { c_str(document_json) }) else {
        return std::ptr::null_mut();
    };
    let document: Element = match serde_json::from_str(json) {
        Ok(document) => document,
        Err(e) => {
            debug!("rejecting document: {e}");
            return std::ptr::null_mut();
        }
    };
    let inner = BindingAssembler::new(&document)
        .with_options(options)
        .resolve();
    Box::into_raw(Box::new(FfiResolution { inner }))
}

/// Resolve a JSON-encoded element tree.
///
/// Returns null if `document_json` is null, not UTF-8, not a valid element
/// tree, or if an internal panic occurs. Operations that fail to resolve do
/// not make this fail; inspect them with `whttp_resolution_error_*`.
/// The caller must free the returned pointer with `whttp_resolution_free`.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolve(document_json: *const c_char) -> *mut FfiResolution {
    catch_unwind(|| resolve_json(document_json, ResolveOptions::default()))
        .unwrap_or(std::ptr::null_mut())
}

/// Like `whttp_resolve`, with operations resolved in parallel when
/// `parallel` is set. `timeout_ms` of 0 means no deadline; otherwise
/// operations still unresolved after it fail with a cancelled error.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolve_with_options(
    document_json: *const c_char,
    parallel: bool,
    timeout_ms: u64,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let options = ResolveOptions {
            parallel,
            deadline: (timeout_ms > 0)
                .then(|| Instant::now() + Duration::from_millis(timeout_ms)),
            cancel: None,
        };
        resolve_json(document_json, options)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a resolution created by `whttp_resolve`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolution_free(res: *mut FfiResolution) {
    if !res.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(res) });
        });
    }
}

/// Number of resolved operations. 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolution_binding_count(res: *const FfiResolution) -> u32 {
    if res.is_null() {
        return 0;
    }
    let res = unsafe { &*res };
    count(res.inner.bindings.len())
}

/// Number of operations that failed to resolve. 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolution_error_count(res: *const FfiResolution) -> u32 {
    if res.is_null() {
        return 0;
    }
    let res = unsafe { &*res };
    count(res.inner.errors.len())
}

/// Human-readable description of the `index`-th failed operation.
///
/// Returns null for a null handle or an index out of range. The caller must
/// free the string with `whttp_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolution_error_message(
    res: *const FfiResolution,
    index: u32,
) -> *mut c_char {
    catch_unwind(|| {
        if res.is_null() {
            return std::ptr::null_mut();
        }
        let res = unsafe { &*res };
        res.inner
            .errors
            .get(index as usize)
            .and_then(|error| CString::new(error.to_string()).ok())
            .map_or(std::ptr::null_mut(), CString::into_raw)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Resolved binding for `operation` as a JSON object.
///
/// Returns null if either argument is null or the operation is not resolved.
/// The caller must free the string with `whttp_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_resolution_binding_json(
    res: *const FfiResolution,
    operation: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if res.is_null() {
            return std::ptr::null_mut();
        }
        let res = unsafe { &*res };
        let Some(operation) = (unsafe { c_str(operation) }) else {
            return std::ptr::null_mut();
        };
        lookup(res, operation)
            .and_then(|binding| serde_json::to_string(binding).ok())
            .and_then(|json| CString::new(json).ok())
            .map_or(std::ptr::null_mut(), CString::into_raw)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Build the HTTP request for `operation` from a JSON object of parameters.
///
/// `params_json` may be null for no parameters. Returns null if `res` or
/// `operation` is null, the operation is unknown, the parameters are not a
/// flat JSON object, or the binding rejects them.
/// The caller must free the returned pointer with `whttp_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_build_request(
    res: *const FfiResolution,
    operation: *const c_char,
    params_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if res.is_null() {
            return std::ptr::null_mut();
        }
        let res = unsafe { &*res };
        let Some(binding) = (unsafe { c_str(operation) }).and_then(|op| lookup(res, op)) else {
            return std::ptr::null_mut();
        };
        let params = if params_json.is_null() {
            Parameters::new()
        } else {
            match unsafe { c_str(params_json) }.map(serde_json::from_str::<Parameters>) {
                Some(Ok(params)) => params,
                _ => return std::ptr::null_mut(),
            }
        };
        match binding.build_request(&params) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                debug!("{}: {e}", binding.operation);
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Parse the HTTP response of `operation`.
///
/// On success the result's `data` is a JSON object of the decoded
/// parameters.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_parse_response(
    res: *const FfiResolution,
    operation: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if res.is_null() {
            return FfiResult::null_arg("res");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let Some(operation) = (unsafe { c_str(operation) }) else {
            return FfiResult::null_arg("operation");
        };
        let res = unsafe { &*res };
        let Some(binding) = lookup(res, operation) else {
            return FfiResult::unknown_operation(operation);
        };
        let resp = unsafe { &*response };
        match binding.parse_response(ffi_response_to_core(resp)) {
            Ok(params) => match serde_json::to_string(&params) {
                Ok(json) => FfiResult::ok_json(json),
                Err(e) => FfiResult::panic(&e.to_string()),
            },
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in whttp_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `whttp_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.body, req.body_len))
            });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiResult` returned by `whttp_parse_response`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            drop(unsafe { CString::from_raw(result.data) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn whttp_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
