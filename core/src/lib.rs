//! WSDL HTTP binding resolver.
//!
//! # Overview
//! Reads the HTTP binding extension (`http:binding`, `http:operation`,
//! `http:header`) out of an already-parsed WSDL element tree and produces one
//! [`HttpOperationBinding`] per operation: method, URI template, headers,
//! body codecs and query separator. A binding then builds [`HttpRequest`]
//! values and parses [`HttpResponse`] values without touching the network
//! (host-does-IO pattern).
//!
//! # Design
//! - [`consts`] holds the extension vocabulary as compile-time constants.
//! - [`ExtensionMatcher`] turns generic [`Element`]s into typed properties.
//! - [`template`] joins binding and operation locations and substitutes
//!   placeholders.
//! - [`BodyCodec`] is a closed enum over url-encoded, XML and JSON bodies.
//! - [`BindingAssembler`] runs the per-operation stages and reports failures
//!   per operation; one bad operation never hides its siblings.
//!
//! ```
//! use wsdl_http_core::{consts, resolve, Element, Parameters};
//!
//! let http = |name: &str| Element::new(Some(consts::HTTP_NAMESPACE), name);
//! let wsdl = |name: &str| Element::new(Some(consts::WSDL_NAMESPACE), name);
//!
//! let document = wsdl("definitions").child(
//!     wsdl("binding")
//!         .attr("name", "Users")
//!         .child(http("binding").attr("location", "http://api.example.com/svc"))
//!         .child(
//!             wsdl("operation")
//!                 .attr("name", "GetUser")
//!                 .child(http("operation").attr("method", "GET").attr("location", "/users/{id}")),
//!         ),
//! );
//!
//! let resolution = resolve(&document);
//! let binding = resolution.binding("GetUser").unwrap();
//! let request = binding
//!     .build_request(&Parameters::from_iter([("id", "42")]))
//!     .unwrap();
//! assert_eq!(request.url, "http://api.example.com/svc/users/42");
//! ```

pub mod assembler;
pub mod binding;
mod client;
pub mod codec;
pub mod consts;
pub mod error;
pub mod http;
pub mod matcher;
pub mod model;
pub mod template;
pub mod types;

pub use assembler::{
    resolve, AssemblyStage, BindingAssembler, OperationError, Resolution, ResolveOptions,
};
pub use binding::HttpOperationBinding;
pub use codec::BodyCodec;
pub use error::BindingError;
pub use http::{HttpRequest, HttpResponse};
pub use matcher::ExtensionMatcher;
pub use model::{
    Element, ExtensionLevel, HttpExtension, HttpExtensionMethod, HttpExtensionProperties,
    HttpHeaderElement, PropertyKey, SerializationKind,
};
pub use template::UriTemplate;
pub use types::{ParamValue, Parameters};
