//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use wsdl_http_core::{BindingError, HttpExtensionMethod, HttpRequest, Resolution};

/// Opaque handle to a resolved document. C callers receive a pointer to this
/// and pass it back into every build/parse function.
pub struct FfiResolution {
    pub(crate) inner: Resolution,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Options = 4,
    Head = 5,
    Trace = 6,
    Connect = 7,
}

impl From<HttpExtensionMethod> for FfiHttpMethod {
    fn from(m: HttpExtensionMethod) -> Self {
        match m {
            HttpExtensionMethod::Get => FfiHttpMethod::Get,
            HttpExtensionMethod::Post => FfiHttpMethod::Post,
            HttpExtensionMethod::Put => FfiHttpMethod::Put,
            HttpExtensionMethod::Delete => FfiHttpMethod::Delete,
            HttpExtensionMethod::Options => FfiHttpMethod::Options,
            HttpExtensionMethod::Head => FfiHttpMethod::Head,
            HttpExtensionMethod::Trace => FfiHttpMethod::Trace,
            HttpExtensionMethod::Connect => FfiHttpMethod::Connect,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `whttp_build_request`. The C caller executes the request and
/// passes the response back through `whttp_parse_response`. `body` is null
/// when the request has no body; it is not NUL-terminated.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    ///
    /// Returns null if the URL or a header contains an interior NUL byte, or
    /// if there are more headers than `headers_len` can hold.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let Ok(url) = CString::new(req.url) else {
            return std::ptr::null_mut();
        };
        let headers: Option<Vec<(CString, CString)>> = req
            .headers
            .into_iter()
            .map(|(k, v)| Some((CString::new(k).ok()?, CString::new(v).ok()?)))
            .collect();
        let Some(headers) = headers else {
            return std::ptr::null_mut();
        };

        let Ok(headers_len) = u32::try_from(headers.len()) else {
            return std::ptr::null_mut();
        };
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: k.into_raw(),
                    value: v.into_raw(),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        let (body, body_len) = match req.body {
            Some(bytes) => {
                let bytes = bytes.into_boxed_slice();
                let len = bytes.len();
                (Box::into_raw(bytes) as *mut u8, len)
            }
            None => (std::ptr::null_mut(), 0),
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: url.into_raw(),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to `whttp_parse_response`. The FFI layer reads but
/// does not free these fields. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    ExtensionValidation = 1,
    TemplateResolution = 2,
    UnsupportedSerialization = 3,
    Codec = 4,
    Cancelled = 5,
    Http = 6,
    Panic = 7,
    NullArg = 8,
    UnknownOperation = 9,
}

/// Result envelope for parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data` is a
/// JSON object holding the decoded parameters. On failure `error_code`
/// describes the category, `error_message` is a human-readable C string, and
/// `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut c_char,
}

impl FfiResult {
    fn boxed(error_code: FfiErrorCode, message: Option<String>, http_status: u16) -> *mut Self {
        let error_message = message
            .map(|msg| CString::new(msg.replace('\0', " ")).unwrap_or_default().into_raw())
            .unwrap_or(std::ptr::null_mut());
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying `json`.
    pub(crate) fn ok_json(json: String) -> *mut Self {
        match CString::new(json) {
            Ok(data) => {
                let result = Self::boxed(FfiErrorCode::Ok, None, 0);
                // SAFETY: `boxed` just returned a unique, non-null pointer.
                unsafe { (*result).data = data.into_raw() };
                result
            }
            Err(_) => Self::boxed(
                FfiErrorCode::Codec,
                Some("decoded parameters contain a NUL byte".to_string()),
                0,
            ),
        }
    }

    /// Build an error result from a `BindingError`.
    pub(crate) fn from_error(err: BindingError) -> *mut Self {
        let (error_code, http_status) = match &err {
            BindingError::ExtensionValidation(_) => (FfiErrorCode::ExtensionValidation, 0),
            BindingError::TemplateResolution(_) => (FfiErrorCode::TemplateResolution, 0),
            BindingError::UnsupportedSerialization(_) => {
                (FfiErrorCode::UnsupportedSerialization, 0)
            }
            BindingError::Codec(_) => (FfiErrorCode::Codec, 0),
            BindingError::Cancelled => (FfiErrorCode::Cancelled, 0),
            BindingError::HttpStatus { status, .. } => (FfiErrorCode::Http, *status),
        };
        Self::boxed(error_code, Some(err.to_string()), http_status)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(format!("null argument: {name}")),
            0,
        )
    }

    pub(crate) fn unknown_operation(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::UnknownOperation,
            Some(format!("no resolved operation named `{name}`")),
            0,
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0)
    }
}
