//! Input element tree and the typed values extracted from HTTP extensions.
//!
//! # Design
//! The core does not parse XML text. Callers hand over an [`Element`] tree
//! that an XML parser has already produced; it also deserializes from JSON,
//! which is how fixtures and the FFI layer supply documents. Everything the
//! matcher extracts is a plain value type with no borrowed state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::BindingError;

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// A generic XML element: namespace, local name, attributes and children.
///
/// Attribute keys are local names. Text content is not modelled because no
/// WSDL construct the resolver reads carries any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder-style child appender.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn in_namespace(&self, candidates: &[&str]) -> bool {
        self.namespace
            .as_deref()
            .is_some_and(|ns| candidates.contains(&ns))
    }

    /// True when the element carries `required="true"` (or `"1"`).
    pub fn is_required(&self) -> bool {
        matches!(self.attribute(consts::ATTRIBUTE_REQUIRED), Some("true" | "1"))
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// HTTP method declared by a binding or operation extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpExtensionMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
    Trace,
    Connect,
}

impl HttpExtensionMethod {
    pub const ALL: [HttpExtensionMethod; 8] = [
        HttpExtensionMethod::Get,
        HttpExtensionMethod::Post,
        HttpExtensionMethod::Put,
        HttpExtensionMethod::Delete,
        HttpExtensionMethod::Options,
        HttpExtensionMethod::Head,
        HttpExtensionMethod::Trace,
        HttpExtensionMethod::Connect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpExtensionMethod::Get => consts::METHOD_GET,
            HttpExtensionMethod::Post => consts::METHOD_POST,
            HttpExtensionMethod::Put => consts::METHOD_PUT,
            HttpExtensionMethod::Delete => consts::METHOD_DELETE,
            HttpExtensionMethod::Options => consts::METHOD_OPTIONS,
            HttpExtensionMethod::Head => consts::METHOD_HEAD,
            HttpExtensionMethod::Trace => consts::METHOD_TRACE,
            HttpExtensionMethod::Connect => consts::METHOD_CONNECT,
        }
    }

    /// Whether requests with this method carry the uncited parameters in a
    /// body rather than in the query string.
    pub fn has_body(self) -> bool {
        matches!(
            self,
            HttpExtensionMethod::Post | HttpExtensionMethod::Put
        )
    }
}

impl FromStr for HttpExtensionMethod {
    type Err = BindingError;

    /// Exact, case-sensitive match against the registry names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpExtensionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| BindingError::ExtensionValidation(format!("unknown HTTP method `{s}`")))
    }
}

impl fmt::Display for HttpExtensionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Serialization kinds
// ---------------------------------------------------------------------------

/// Body format declared by `inputSerialization` / `outputSerialization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationKind {
    UrlEncoded,
    Xml,
    Json,
    /// Reserved. Recognised so it can be reported precisely, but no codec
    /// implements it.
    PlainText,
}

impl SerializationKind {
    pub fn media_type(self) -> &'static str {
        match self {
            SerializationKind::UrlEncoded => consts::SERIALIZATION_URL_ENCODED,
            SerializationKind::Xml => consts::SERIALIZATION_XML,
            SerializationKind::Json => consts::SERIALIZATION_JSON,
            SerializationKind::PlainText => consts::SERIALIZATION_TEXT_PLAIN,
        }
    }
}

impl FromStr for SerializationKind {
    type Err = BindingError;

    /// Case-insensitive media type match; `;` parameters are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            consts::SERIALIZATION_URL_ENCODED => Ok(SerializationKind::UrlEncoded),
            consts::SERIALIZATION_XML | consts::SERIALIZATION_TEXT_XML => Ok(SerializationKind::Xml),
            consts::SERIALIZATION_JSON => Ok(SerializationKind::Json),
            consts::SERIALIZATION_TEXT_PLAIN => Ok(SerializationKind::PlainText),
            _ => Err(BindingError::UnsupportedSerialization(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Extension properties
// ---------------------------------------------------------------------------

/// Property keys of the HTTP extension, as spelled in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Cookies,
    Method,
    Location,
    IgnoreUncited,
    InputSerialization,
    OutputSerialization,
    TransferCodingDefault,
    TransferCoding,
    QueryParameterSeparator,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 9] = [
        PropertyKey::Cookies,
        PropertyKey::Method,
        PropertyKey::Location,
        PropertyKey::IgnoreUncited,
        PropertyKey::InputSerialization,
        PropertyKey::OutputSerialization,
        PropertyKey::TransferCodingDefault,
        PropertyKey::TransferCoding,
        PropertyKey::QueryParameterSeparator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKey::Cookies => consts::PROPERTY_COOKIES,
            PropertyKey::Method => consts::PROPERTY_METHOD,
            PropertyKey::Location => consts::PROPERTY_LOCATION,
            PropertyKey::IgnoreUncited => consts::PROPERTY_IGNORE_UNCITED,
            PropertyKey::InputSerialization => consts::PROPERTY_INPUT_SERIALIZATION,
            PropertyKey::OutputSerialization => consts::PROPERTY_OUTPUT_SERIALIZATION,
            PropertyKey::TransferCodingDefault => consts::PROPERTY_TRANSFER_CODING_DEFAULT,
            PropertyKey::TransferCoding => consts::PROPERTY_TRANSFER_CODING,
            PropertyKey::QueryParameterSeparator => consts::PROPERTY_QUERY_PARAMETER_SEPARATOR,
        }
    }

    /// Alternative attribute names read for this key, tried after the
    /// primary name.
    pub(crate) fn aliases(self) -> &'static [&'static str] {
        match self {
            PropertyKey::Method => &[consts::PROPERTY_METHOD_DEFAULT, consts::PROPERTY_VERB],
            PropertyKey::QueryParameterSeparator => {
                &[consts::PROPERTY_QUERY_PARAMETER_SEPARATOR_DEFAULT]
            }
            _ => &[],
        }
    }
}

/// Typed properties of one `binding` or `operation` extension element.
///
/// Every field is optional; operation-level values override binding-level
/// ones when the assembler merges them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpExtensionProperties {
    pub cookies: Option<bool>,
    pub method: Option<HttpExtensionMethod>,
    pub location: Option<String>,
    pub ignore_uncited: Option<bool>,
    pub input_serialization: Option<SerializationKind>,
    pub output_serialization: Option<SerializationKind>,
    pub transfer_coding_default: Option<String>,
    pub transfer_coding: Option<String>,
    pub query_parameter_separator: Option<String>,
}

impl HttpExtensionProperties {
    /// Values layered over `defaults`: fields set on `self` win.
    pub fn overlay(&self, defaults: &HttpExtensionProperties) -> HttpExtensionProperties {
        HttpExtensionProperties {
            cookies: self.cookies.or(defaults.cookies),
            method: self.method.or(defaults.method),
            location: self.location.clone().or_else(|| defaults.location.clone()),
            ignore_uncited: self.ignore_uncited.or(defaults.ignore_uncited),
            input_serialization: self.input_serialization.or(defaults.input_serialization),
            output_serialization: self.output_serialization.or(defaults.output_serialization),
            transfer_coding_default: self
                .transfer_coding_default
                .clone()
                .or_else(|| defaults.transfer_coding_default.clone()),
            transfer_coding: self
                .transfer_coding
                .clone()
                .or_else(|| defaults.transfer_coding.clone()),
            query_parameter_separator: self
                .query_parameter_separator
                .clone()
                .or_else(|| defaults.query_parameter_separator.clone()),
        }
    }
}

/// One `header` extension child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaderElement {
    pub name: String,
    pub default: Option<String>,
}

/// Where an extension element sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionLevel {
    Binding,
    Operation,
}

/// Classification of a single extension element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpExtension {
    Binding(HttpExtensionProperties),
    Operation(HttpExtensionProperties),
    Header(HttpHeaderElement),
    /// Not an HTTP extension, or an HTTP element this resolver does not use.
    Unrecognized,
}
