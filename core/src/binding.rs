//! The resolved, per-operation HTTP binding.

use serde::{Deserialize, Serialize};

use crate::codec::BodyCodec;
use crate::consts;
use crate::error::Result;
use crate::model::{HttpExtensionMethod, HttpHeaderElement, SerializationKind};
use crate::template::UriTemplate;

/// Everything a transport needs to call one WSDL operation over HTTP.
///
/// Produced by the assembler and not modified afterwards. The location has
/// already been joined with the binding base and validated; placeholders are
/// substituted per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOperationBinding {
    pub binding: String,
    pub operation: String,
    pub method: HttpExtensionMethod,
    pub location: String,
    pub headers: Vec<HttpHeaderElement>,
    pub input_serialization: SerializationKind,
    pub output_serialization: SerializationKind,
    pub query_parameter_separator: String,
    pub ignore_uncited: bool,
    pub cookies: bool,
    pub transfer_coding: Option<String>,
}

impl HttpOperationBinding {
    pub fn template(&self) -> Result<UriTemplate> {
        UriTemplate::parse(&self.location)
    }

    /// Codec for request bodies; the XML wrapper is the operation name.
    pub fn input_codec(&self) -> Result<BodyCodec> {
        BodyCodec::for_kind(
            self.input_serialization,
            &self.query_parameter_separator,
            &self.operation,
        )
    }

    /// Codec for response bodies; the XML wrapper is `{operation}Response`.
    pub fn output_codec(&self) -> Result<BodyCodec> {
        BodyCodec::for_kind(
            self.output_serialization,
            &self.query_parameter_separator,
            &output_element(&self.operation),
        )
    }
}

pub fn output_element(operation: &str) -> String {
    format!("{operation}{}", consts::OUTPUT_ELEMENT_SUFFIX)
}
