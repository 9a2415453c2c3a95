//! Recognises HTTP binding extension elements and extracts their properties.

use log::trace;

use crate::consts;
use crate::error::{BindingError, Result};
use crate::model::{
    Element, ExtensionLevel, HttpExtension, HttpExtensionMethod, HttpExtensionProperties,
    HttpHeaderElement, PropertyKey, SerializationKind,
};

/// Pure transform from generic extension elements to typed HTTP properties.
///
/// A matcher built with [`ExtensionMatcher::with_defaults`] knows the
/// binding-level properties, so it can tell whether an operation without a
/// `method` attribute still has one to inherit.
#[derive(Debug, Clone, Default)]
pub struct ExtensionMatcher {
    defaults: HttpExtensionProperties,
}

impl ExtensionMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: HttpExtensionProperties) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &HttpExtensionProperties {
        &self.defaults
    }

    pub fn is_http_extension(element: &Element) -> bool {
        element.in_namespace(&consts::HTTP_NAMESPACES)
    }

    /// Sort an extension element into one of the known shapes.
    ///
    /// Unknown elements in the HTTP namespace are ignored unless they are
    /// marked `required`, in which case the enclosing construct is invalid.
    pub fn classify(&self, element: &Element) -> Result<HttpExtension> {
        if !Self::is_http_extension(element) {
            return Ok(HttpExtension::Unrecognized);
        }
        let classified = match element.name.as_str() {
            consts::ELEMENT_BINDING => self
                .match_properties(element, ExtensionLevel::Binding)?
                .map_or(HttpExtension::Unrecognized, HttpExtension::Binding),
            consts::ELEMENT_OPERATION => self
                .match_properties(element, ExtensionLevel::Operation)?
                .map_or(HttpExtension::Unrecognized, HttpExtension::Operation),
            consts::ELEMENT_HEADER => Self::match_header(element)?
                .map_or(HttpExtension::Unrecognized, HttpExtension::Header),
            other if element.is_required() => {
                return Err(BindingError::ExtensionValidation(format!(
                    "required HTTP extension element `{other}` is not supported"
                )));
            }
            _ => HttpExtension::Unrecognized,
        };
        trace!("classified `{}` as {:?}", element.name, classified);
        Ok(classified)
    }

    /// Extract properties when `element` is in the HTTP namespace.
    ///
    /// Attributes the registry does not name are ignored. At the operation
    /// level a `method` must be present on the element or in the defaults.
    pub fn match_properties(
        &self,
        element: &Element,
        level: ExtensionLevel,
    ) -> Result<Option<HttpExtensionProperties>> {
        if !Self::is_http_extension(element) {
            return Ok(None);
        }

        let props = HttpExtensionProperties {
            cookies: read(element, PropertyKey::Cookies).map(parse_bool).transpose()?,
            method: read(element, PropertyKey::Method)
                .map(str::parse::<HttpExtensionMethod>)
                .transpose()?,
            location: read(element, PropertyKey::Location).map(str::to_string),
            ignore_uncited: read(element, PropertyKey::IgnoreUncited)
                .map(parse_bool)
                .transpose()?,
            input_serialization: read(element, PropertyKey::InputSerialization)
                .map(str::parse::<SerializationKind>)
                .transpose()?,
            output_serialization: read(element, PropertyKey::OutputSerialization)
                .map(str::parse::<SerializationKind>)
                .transpose()?,
            transfer_coding_default: read(element, PropertyKey::TransferCodingDefault)
                .map(|value| non_empty(PropertyKey::TransferCodingDefault, value))
                .transpose()?,
            transfer_coding: read(element, PropertyKey::TransferCoding)
                .map(|value| non_empty(PropertyKey::TransferCoding, value))
                .transpose()?,
            query_parameter_separator: read(element, PropertyKey::QueryParameterSeparator)
                .map(|value| non_empty(PropertyKey::QueryParameterSeparator, value))
                .transpose()?,
        };

        if level == ExtensionLevel::Operation
            && props.method.is_none()
            && self.defaults.method.is_none()
        {
            return Err(BindingError::ExtensionValidation(format!(
                "operation extension has no `{}` and the binding declares no default",
                consts::PROPERTY_METHOD
            )));
        }

        trace!("matched {level:?} properties {props:?}");
        Ok(Some(props))
    }

    /// Extract a `header` element. Returns `None` for other namespaces.
    pub fn match_header(element: &Element) -> Result<Option<HttpHeaderElement>> {
        if !Self::is_http_extension(element) || element.name != consts::ELEMENT_HEADER {
            return Ok(None);
        }
        let name = element
            .attribute(consts::ATTRIBUTE_NAME)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                BindingError::ExtensionValidation("header element has no `name`".to_string())
            })?;
        Ok(Some(HttpHeaderElement {
            name: name.to_string(),
            default: element.attribute(consts::ATTRIBUTE_DEFAULT).map(str::to_string),
        }))
    }
}

fn read(element: &Element, key: PropertyKey) -> Option<&str> {
    element.attribute(key.as_str()).or_else(|| {
        key.aliases()
            .iter()
            .find_map(|alias| element.attribute(alias))
    })
}

/// `xsd:boolean` lexical forms.
fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(BindingError::ExtensionValidation(format!(
            "`{other}` is not a boolean"
        ))),
    }
}

fn non_empty(key: PropertyKey, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BindingError::ExtensionValidation(format!(
            "`{}` must not be empty",
            key.as_str()
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(name: &str) -> Element {
        Element::new(Some(consts::HTTP_NAMESPACE), name)
    }

    #[test]
    fn every_method_maps_to_its_variant() {
        let matcher = ExtensionMatcher::new();
        for method in HttpExtensionMethod::ALL {
            let el = http("operation").attr("method", method.as_str());
            let props = matcher
                .match_properties(&el, ExtensionLevel::Operation)
                .unwrap()
                .unwrap();
            assert_eq!(props.method, Some(method));
        }
    }

    #[test]
    fn foreign_namespace_is_not_matched() {
        let el = Element::new(Some("http://schemas.xmlsoap.org/wsdl/soap/"), "operation")
            .attr("method", "GET");
        let matcher = ExtensionMatcher::new();
        assert_eq!(matcher.match_properties(&el, ExtensionLevel::Operation).unwrap(), None);
        assert_eq!(matcher.classify(&el).unwrap(), HttpExtension::Unrecognized);
    }

    #[test]
    fn wsdl20_namespace_is_matched() {
        let el = Element::new(Some(consts::HTTP_NAMESPACE_WSDL20), "binding")
            .attr("methodDefault", "PUT");
        let classified = ExtensionMatcher::new().classify(&el).unwrap();
        match classified {
            HttpExtension::Binding(props) => assert_eq!(props.method, Some(HttpExtensionMethod::Put)),
            other => panic!("unexpected classification {other:?}"),
        }
    }

    #[test]
    fn wsdl11_verb_is_read_as_method() {
        let el = http("binding").attr("verb", "POST");
        let props = ExtensionMatcher::new()
            .match_properties(&el, ExtensionLevel::Binding)
            .unwrap()
            .unwrap();
        assert_eq!(props.method, Some(HttpExtensionMethod::Post));
    }

    #[test]
    fn operation_without_method_fails_without_default() {
        let el = http("operation").attr("location", "/users");
        let err = ExtensionMatcher::new()
            .match_properties(&el, ExtensionLevel::Operation)
            .unwrap_err();
        assert!(matches!(err, BindingError::ExtensionValidation(_)));
    }

    #[test]
    fn operation_without_method_inherits_default() {
        let defaults = HttpExtensionProperties {
            method: Some(HttpExtensionMethod::Get),
            ..Default::default()
        };
        let el = http("operation").attr("location", "/users");
        let props = ExtensionMatcher::with_defaults(defaults)
            .match_properties(&el, ExtensionLevel::Operation)
            .unwrap()
            .unwrap();
        assert_eq!(props.method, None);
        assert_eq!(props.location.as_deref(), Some("/users"));
    }

    #[test]
    fn binding_level_method_is_optional() {
        let el = http("binding").attr("location", "http://api.example.com/svc");
        let props = ExtensionMatcher::new()
            .match_properties(&el, ExtensionLevel::Binding)
            .unwrap()
            .unwrap();
        assert_eq!(props.method, None);
    }

    #[test]
    fn typed_properties_are_extracted() {
        let el = http("operation")
            .attr("method", "POST")
            .attr("cookies", "1")
            .attr("ignoreUncited", "false")
            .attr("inputSerialization", "application/json")
            .attr("outputSerialization", "application/xml")
            .attr("transferCoding", "chunked")
            .attr("queryParameterSeparator", ";")
            .attr("unrelated", "ignored");
        let props = ExtensionMatcher::new()
            .match_properties(&el, ExtensionLevel::Operation)
            .unwrap()
            .unwrap();
        assert_eq!(props.cookies, Some(true));
        assert_eq!(props.ignore_uncited, Some(false));
        assert_eq!(props.input_serialization, Some(SerializationKind::Json));
        assert_eq!(props.output_serialization, Some(SerializationKind::Xml));
        assert_eq!(props.transfer_coding.as_deref(), Some("chunked"));
        assert_eq!(props.query_parameter_separator.as_deref(), Some(";"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let matcher = ExtensionMatcher::new();
        let bad_bool = http("binding").attr("cookies", "yes");
        assert!(matches!(
            matcher.match_properties(&bad_bool, ExtensionLevel::Binding),
            Err(BindingError::ExtensionValidation(_))
        ));

        let bad_method = http("operation").attr("method", "FETCH");
        assert!(matches!(
            matcher.match_properties(&bad_method, ExtensionLevel::Operation),
            Err(BindingError::ExtensionValidation(_))
        ));

        let empty_separator = http("binding").attr("queryParameterSeparator", "");
        assert!(matches!(
            matcher.match_properties(&empty_separator, ExtensionLevel::Binding),
            Err(BindingError::ExtensionValidation(_))
        ));

        let unknown_media = http("operation")
            .attr("method", "GET")
            .attr("outputSerialization", "image/png");
        assert!(matches!(
            matcher.match_properties(&unknown_media, ExtensionLevel::Operation),
            Err(BindingError::UnsupportedSerialization(_))
        ));
    }

    #[test]
    fn headers_need_a_name() {
        let header = http("header").attr("name", "X-Tenant").attr("default", "acme");
        let parsed = ExtensionMatcher::match_header(&header).unwrap().unwrap();
        assert_eq!(parsed.name, "X-Tenant");
        assert_eq!(parsed.default.as_deref(), Some("acme"));

        let nameless = http("header").attr("default", "acme");
        assert!(ExtensionMatcher::match_header(&nameless).is_err());
    }

    #[test]
    fn unknown_http_elements_fail_only_when_required() {
        let matcher = ExtensionMatcher::new();
        let optional = http("urlReplacement");
        assert_eq!(matcher.classify(&optional).unwrap(), HttpExtension::Unrecognized);

        let required = http("urlReplacement").attr("required", "true");
        assert!(matches!(
            matcher.classify(&required),
            Err(BindingError::ExtensionValidation(_))
        ));
    }
}
