//! Body codecs selected by `inputSerialization` / `outputSerialization`.
//!
//! # Design
//! The set of formats is closed, so dispatch is an enum rather than a trait
//! object. `text/plain` parses to a [`SerializationKind`] but has no codec;
//! asking for one is the point where it is rejected.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};
use url::form_urlencoded;

use crate::consts;
use crate::error::{BindingError, Result};
use crate::model::SerializationKind;
use crate::types::{ParamValue, Parameters};

/// A ready-to-use body codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyCodec {
    /// `name=value` pairs joined by `separator`.
    UrlEncoded { separator: String },
    /// `<element><name>value</name>...</element>`.
    Xml { element: String },
    /// A flat JSON object.
    Json,
}

impl BodyCodec {
    /// Build the codec for `kind`.
    ///
    /// `separator` is only used by the url-encoded codec and `element` only
    /// by the XML codec.
    pub fn for_kind(kind: SerializationKind, separator: &str, element: &str) -> Result<Self> {
        match kind {
            SerializationKind::UrlEncoded => {
                validate_separator(separator)?;
                Ok(BodyCodec::UrlEncoded {
                    separator: separator.to_string(),
                })
            }
            SerializationKind::Xml => {
                if !is_xml_name(element) {
                    return Err(BindingError::Codec(format!(
                        "`{element}` is not a valid XML element name"
                    )));
                }
                Ok(BodyCodec::Xml {
                    element: element.to_string(),
                })
            }
            SerializationKind::Json => Ok(BodyCodec::Json),
            SerializationKind::PlainText => Err(BindingError::UnsupportedSerialization(format!(
                "{} has no codec",
                consts::SERIALIZATION_TEXT_PLAIN
            ))),
        }
    }

    pub fn kind(&self) -> SerializationKind {
        match self {
            BodyCodec::UrlEncoded { .. } => SerializationKind::UrlEncoded,
            BodyCodec::Xml { .. } => SerializationKind::Xml,
            BodyCodec::Json => SerializationKind::Json,
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.kind().media_type()
    }

    pub fn encode(&self, params: &Parameters) -> Result<Vec<u8>> {
        match self {
            BodyCodec::UrlEncoded { separator } => Ok(encode_url(params, separator).into_bytes()),
            BodyCodec::Xml { element } => encode_xml(params, element).map(String::into_bytes),
            BodyCodec::Json => {
                serde_json::to_vec(&to_json(params)).map_err(|e| BindingError::Codec(e.to_string()))
            }
        }
    }

    pub fn decode(&self, body: &[u8]) -> Result<Parameters> {
        let text = std::str::from_utf8(body).map_err(|e| BindingError::Codec(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Parameters::new());
        }
        match self {
            BodyCodec::UrlEncoded { separator } => Ok(decode_url(text, separator)),
            BodyCodec::Xml { .. } => decode_xml(text),
            BodyCodec::Json => decode_json(text),
        }
    }
}

// ---------------------------------------------------------------------------
// URL-encoded
// ---------------------------------------------------------------------------

/// Form-encode `params` as `name=value` pairs joined by `separator`.
pub fn encode_url(params: &Parameters, separator: &str) -> String {
    params
        .iter()
        .map(|(name, value)| {
            let name: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
            let value: String =
                form_urlencoded::byte_serialize(value.canonical().as_bytes()).collect();
            format!("{name}={value}")
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn decode_url(text: &str, separator: &str) -> Parameters {
    let mut params = Parameters::new();
    for pair in text.split(separator).filter(|pair| !pair.is_empty()) {
        for (name, value) in form_urlencoded::parse(pair.as_bytes()) {
            params.insert(name.into_owned(), value.into_owned());
        }
    }
    params
}

/// The separator must not be something form encoding leaves unescaped,
/// otherwise decoding could not tell it apart from content.
fn validate_separator(separator: &str) -> Result<()> {
    let collides = separator
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | '.' | '_' | '=' | '%' | '+'));
    if separator.is_empty() || collides {
        return Err(BindingError::ExtensionValidation(format!(
            "query parameter separator `{separator}` collides with encoded content"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

fn encode_xml(params: &Parameters, element: &str) -> Result<String> {
    let mut out = format!("<{element}>");
    for (name, value) in params {
        if !is_xml_name(name) {
            return Err(BindingError::Codec(format!(
                "parameter `{name}` is not a valid XML element name"
            )));
        }
        let text = value.canonical();
        out.push_str(&format!("<{name}>{}</{name}>", escape(&*text)));
    }
    out.push_str(&format!("</{element}>"));
    Ok(out)
}

fn decode_xml(text: &str) -> Result<Parameters> {
    let mut reader = Reader::from_str(text);
    let mut params = Parameters::new();
    let mut depth = 0usize;
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                match depth {
                    1 => {}
                    2 => {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        current = Some((name, String::new()));
                    }
                    _ => return Err(nested_element(e.local_name().as_ref())),
                }
            }
            Ok(Event::Empty(ref e)) => match depth {
                0 => {}
                1 => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    params.insert(name, String::new());
                }
                _ => return Err(nested_element(e.local_name().as_ref())),
            },
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some((name, value)) = current.take() {
                        params.insert(name, value);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(ref e)) => {
                if let (2, Some((_, value))) = (depth, current.as_mut()) {
                    let text = e.unescape().map_err(|err| BindingError::Codec(err.to_string()))?;
                    value.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (2, Some((_, value))) = (depth, current.as_mut()) {
                    value.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(BindingError::Codec(format!("invalid XML: {e}"))),
            _ => {}
        }
    }
    Ok(params)
}

fn nested_element(name: &[u8]) -> BindingError {
    BindingError::Codec(format!(
        "nested element `{}` is not a flat parameter",
        String::from_utf8_lossy(name)
    ))
}

/// Conservative XML name check: ASCII letters, digits, `_`, `-`, `.`, and
/// any non-ASCII character; no colon, not starting with a digit, `-` or `.`.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || !first.is_ascii())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') || !c.is_ascii())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn to_json(params: &Parameters) -> Value {
    let object: Map<String, Value> = params
        .iter()
        .map(|(name, value)| {
            let json = match value {
                ParamValue::Text(s) => Value::String(s.clone()),
                ParamValue::Integer(i) => Value::Number(Number::from(*i)),
                ParamValue::Float(f) => Number::from_f64(*f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(value.canonical().into_owned())),
                ParamValue::Boolean(b) => Value::Bool(*b),
            };
            (name.clone(), json)
        })
        .collect();
    Value::Object(object)
}

fn decode_json(text: &str) -> Result<Parameters> {
    let value: Value = serde_json::from_str(text).map_err(|e| BindingError::Codec(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(BindingError::Codec("JSON body is not an object".to_string()));
    };
    let mut params = Parameters::new();
    for (name, value) in object {
        let param = match value {
            Value::String(s) => ParamValue::Text(s),
            Value::Bool(b) => ParamValue::Boolean(b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => ParamValue::Integer(i),
                (None, Some(f)) if n.is_f64() => ParamValue::Float(f),
                _ => ParamValue::Text(n.to_string()),
            },
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(BindingError::Codec(format!(
                    "JSON member `{name}` is not a string, number or boolean"
                )));
            }
        };
        params.insert(name, param);
    }
    Ok(params)
}
