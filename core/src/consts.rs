//! Names and default values of the WSDL HTTP binding extension.
//!
//! Everything here is a compile-time constant. The matcher reads attribute
//! and element names through these so that the vocabulary lives in one place.

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

/// WSDL 1.1 HTTP binding extension namespace (`http:` prefix).
pub const HTTP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/http/";

/// WSDL 2.0 HTTP binding extension namespace (`whttp:` prefix).
pub const HTTP_NAMESPACE_WSDL20: &str = "http://www.w3.org/ns/wsdl/http";

/// WSDL 1.1 core namespace.
pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";

/// WSDL 2.0 core namespace.
pub const WSDL_NAMESPACE_WSDL20: &str = "http://www.w3.org/ns/wsdl";

/// Every namespace the matcher treats as the HTTP extension.
pub const HTTP_NAMESPACES: [&str; 2] = [HTTP_NAMESPACE, HTTP_NAMESPACE_WSDL20];

/// Every namespace whose elements are WSDL structure rather than extensions.
pub const WSDL_NAMESPACES: [&str; 2] = [WSDL_NAMESPACE, WSDL_NAMESPACE_WSDL20];

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

pub const METHOD_GET: &str = "GET";
pub const METHOD_POST: &str = "POST";
pub const METHOD_PUT: &str = "PUT";
pub const METHOD_DELETE: &str = "DELETE";
pub const METHOD_OPTIONS: &str = "OPTIONS";
pub const METHOD_HEAD: &str = "HEAD";
pub const METHOD_TRACE: &str = "TRACE";
pub const METHOD_CONNECT: &str = "CONNECT";

// ---------------------------------------------------------------------------
// Extension property names
// ---------------------------------------------------------------------------

pub const PROPERTY_COOKIES: &str = "cookies";
pub const PROPERTY_METHOD: &str = "method";
pub const PROPERTY_LOCATION: &str = "location";
pub const PROPERTY_IGNORE_UNCITED: &str = "ignoreUncited";
pub const PROPERTY_INPUT_SERIALIZATION: &str = "inputSerialization";
pub const PROPERTY_OUTPUT_SERIALIZATION: &str = "outputSerialization";
pub const PROPERTY_TRANSFER_CODING_DEFAULT: &str = "transferCodingDefault";
pub const PROPERTY_TRANSFER_CODING: &str = "transferCoding";
pub const PROPERTY_QUERY_PARAMETER_SEPARATOR: &str = "queryParameterSeparator";

/// Binding-level spelling of `method`.
pub const PROPERTY_METHOD_DEFAULT: &str = "methodDefault";

/// Binding-level spelling of `queryParameterSeparator`.
pub const PROPERTY_QUERY_PARAMETER_SEPARATOR_DEFAULT: &str = "queryParameterSeparatorDefault";

/// WSDL 1.1 `<http:binding verb="..."/>`, read as `method`.
pub const PROPERTY_VERB: &str = "verb";

// ---------------------------------------------------------------------------
// Element and attribute names
// ---------------------------------------------------------------------------

pub const ELEMENT_BINDING: &str = "binding";
pub const ELEMENT_OPERATION: &str = "operation";
pub const ELEMENT_HEADER: &str = "header";

pub const ATTRIBUTE_NAME: &str = "name";
pub const ATTRIBUTE_DEFAULT: &str = "default";

/// `wsdl:required` on an extension element: a processor that does not
/// understand the element must reject the enclosing construct.
pub const ATTRIBUTE_REQUIRED: &str = "required";

// ---------------------------------------------------------------------------
// Default values
// ---------------------------------------------------------------------------

pub const QUERY_PARAMETER_SEPARATOR_DEFAULT: &str = "&";

pub const SERIALIZATION_URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub const SERIALIZATION_XML: &str = "application/xml";
pub const SERIALIZATION_JSON: &str = "application/json";

/// Accepted as an alias of [`SERIALIZATION_XML`].
pub const SERIALIZATION_TEXT_XML: &str = "text/xml";

/// Recognised but not implemented by any codec.
pub const SERIALIZATION_TEXT_PLAIN: &str = "text/plain";

/// Suffix appended to an operation name to form its output XML element.
pub const OUTPUT_ELEMENT_SUFFIX: &str = "Response";
