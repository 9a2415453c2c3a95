//! Requests and responses exchanged with the host.
//!
//! The core never opens a connection. `build_request` turns operation
//! parameters into an `HttpRequest` and the host sends it; the host then
//! hands the reply back as an `HttpResponse` for `parse_response`.
//!
//! Bodies are raw bytes because the codec in use may be XML, JSON or
//! url-encoded text.

use crate::model::HttpExtensionMethod;

/// A request ready to send.
///
/// `method` is the operation's `HttpExtensionMethod` and `url` is the joined
/// location with every placeholder expanded and any query string appended.
/// Headers keep declaration order, with `content-type` last when there is a
/// body. `body` holds the input codec's output, or `None` when the method
/// carries no body or every uncited parameter was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpExtensionMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The host's reply. A 2xx `body` is decoded with the output codec; any
/// other status becomes `BindingError::HttpStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}
