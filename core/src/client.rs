//! Stateless request building and response parsing for resolved bindings.
//!
//! # Design
//! A resolved `HttpOperationBinding` carries no mutable state. Each call is
//! split into `build_request`, which produces an `HttpRequest`, and
//! `parse_response`, which consumes an `HttpResponse`. The caller executes the
//! HTTP round-trip in between, keeping the core deterministic and free of
//! I/O dependencies.
//!
//! Parameter placement, in order:
//! 1. placeholders cited by the location template;
//! 2. declared headers with a same-named parameter;
//! 3. everything left ("uncited") goes to the query string for body-less
//!    methods, or to the body otherwise. With `ignore_uncited` set, uncited
//!    parameters that would be url-encoded are dropped instead.

use log::debug;

use crate::binding::HttpOperationBinding;
use crate::codec::encode_url;
use crate::error::{BindingError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::model::SerializationKind;
use crate::types::Parameters;

impl HttpOperationBinding {
    pub fn build_request(&self, params: &Parameters) -> Result<HttpRequest> {
        let template = self.template()?;
        let mut url = template.expand(params)?;

        let mut uncited = params.clone();
        for name in template.placeholders() {
            uncited.remove(name);
        }

        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        for header in &self.headers {
            let value = params
                .get(&header.name)
                .map(|value| value.canonical().into_owned())
                .or_else(|| header.default.clone());
            uncited.remove(&header.name);
            if let Some(value) = value {
                headers.push((header.name.clone(), value));
            }
        }

        let url_encoded = !self.method.has_body()
            || self.input_serialization == SerializationKind::UrlEncoded;
        let mut body = None;

        if self.ignore_uncited && url_encoded {
            if !uncited.is_empty() {
                debug!(
                    "{}: dropping {} uncited parameter(s)",
                    self.operation,
                    uncited.len()
                );
            }
        } else if !self.method.has_body() {
            if !uncited.is_empty() {
                let query = encode_url(&uncited, &self.query_parameter_separator);
                append_query(&mut url, &query, &self.query_parameter_separator);
            }
        } else {
            let codec = self.input_codec()?;
            body = Some(codec.encode(&uncited)?);
            headers.push(("content-type".to_string(), codec.media_type().to_string()));
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<Parameters> {
        check_status(&response)?;
        self.output_codec()?.decode(&response.body)
    }
}

/// Append `query` to the query component of `url`, ahead of any fragment.
fn append_query(url: &mut String, query: &str, separator: &str) {
    let fragment = url.find('#').map(|pos| url.split_off(pos));
    match url.find('?') {
        None => url.push('?'),
        Some(pos) if pos + 1 < url.len() => url.push_str(separator),
        Some(_) => {}
    }
    url.push_str(query);
    if let Some(fragment) = fragment {
        url.push_str(&fragment);
    }
}

/// Map non-2xx status codes to `BindingError::HttpStatus`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(BindingError::HttpStatus {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpExtensionMethod, HttpHeaderElement};
    use crate::types::ParamValue;

    fn binding(method: HttpExtensionMethod, location: &str) -> HttpOperationBinding {
        HttpOperationBinding {
            binding: "UserHttpBinding".to_string(),
            operation: "GetUser".to_string(),
            method,
            location: location.to_string(),
            headers: Vec::new(),
            input_serialization: SerializationKind::UrlEncoded,
            output_serialization: SerializationKind::Json,
            query_parameter_separator: "&".to_string(),
            ignore_uncited: false,
            cookies: false,
            transfer_coding: None,
        }
    }

    #[test]
    fn get_substitutes_path_and_queries_the_rest() {
        let b = binding(HttpExtensionMethod::Get, "http://api.example.com/svc/users/{id}");
        let params = Parameters::from_iter([("id", "42"), ("fields", "name email")]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(req.method, HttpExtensionMethod::Get);
        assert_eq!(req.url, "http://api.example.com/svc/users/42?fields=name+email");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn existing_query_is_extended_with_separator() {
        let mut b = binding(HttpExtensionMethod::Get, "http://a/search?q={q}");
        b.query_parameter_separator = ";".to_string();
        let params = Parameters::from_iter([("q", "x"), ("page", "2")]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(req.url, "http://a/search?q=x;page=2");
    }

    #[test]
    fn query_goes_before_fragment() {
        let b = binding(HttpExtensionMethod::Get, "http://a/svc/x#top");
        let req = b.build_request(&Parameters::from_iter([("q", "1")])).unwrap();
        assert_eq!(req.url, "http://a/svc/x?q=1#top");

        let b = binding(HttpExtensionMethod::Get, "http://a/svc/x?lang=en#top");
        let req = b.build_request(&Parameters::from_iter([("q", "1")])).unwrap();
        assert_eq!(req.url, "http://a/svc/x?lang=en&q=1#top");
    }

    #[test]
    fn ignore_uncited_drops_query_parameters() {
        let mut b = binding(HttpExtensionMethod::Get, "http://a/users/{id}");
        b.ignore_uncited = true;
        let params = Parameters::from_iter([("id", "1"), ("extra", "x")]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(req.url, "http://a/users/1");
    }

    #[test]
    fn post_encodes_uncited_into_body() {
        let mut b = binding(HttpExtensionMethod::Post, "http://a/users");
        b.operation = "CreateUser".to_string();
        b.input_serialization = SerializationKind::Xml;
        let params = Parameters::from_iter([("name", "Ada")]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(
            req.body.as_deref(),
            Some(&b"<CreateUser><name>Ada</name></CreateUser>"[..])
        );
        assert_eq!(req.header("Content-Type"), Some("application/xml"));
    }

    #[test]
    fn ignore_uncited_keeps_structured_bodies() {
        let mut b = binding(HttpExtensionMethod::Put, "http://a/users/{id}");
        b.ignore_uncited = true;
        b.input_serialization = SerializationKind::Json;
        let params = Parameters::from_iter([("id", "7"), ("name", "Ada")]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(req.url, "http://a/users/7");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Ada"}));
    }

    #[test]
    fn headers_take_parameters_then_defaults() {
        let mut b = binding(HttpExtensionMethod::Get, "http://a/users");
        b.headers = vec![
            HttpHeaderElement {
                name: "X-Tenant".to_string(),
                default: Some("acme".to_string()),
            },
            HttpHeaderElement {
                name: "X-Trace".to_string(),
                default: None,
            },
            HttpHeaderElement {
                name: "X-Limit".to_string(),
                default: None,
            },
        ];
        let params = Parameters::from_iter([("X-Limit", ParamValue::Integer(10))]);
        let req = b.build_request(&params).unwrap();
        assert_eq!(
            req.headers,
            vec![
                ("X-Tenant".to_string(), "acme".to_string()),
                ("X-Limit".to_string(), "10".to_string()),
            ]
        );
        assert_eq!(req.url, "http://a/users");
    }

    #[test]
    fn missing_path_parameter_fails() {
        let b = binding(HttpExtensionMethod::Get, "http://a/users/{id}");
        let err = b.build_request(&Parameters::new()).unwrap_err();
        assert!(matches!(err, BindingError::TemplateResolution(_)));
    }

    #[test]
    fn parse_response_decodes_output() {
        let b = binding(HttpExtensionMethod::Get, "http://a/users/{id}");
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: br#"{"id":"42","name":"Ada"}"#.to_vec(),
        };
        let params = b.parse_response(response).unwrap();
        assert_eq!(params.get("name"), Some(&ParamValue::from("Ada")));
    }

    #[test]
    fn parse_response_maps_error_status() {
        let b = binding(HttpExtensionMethod::Get, "http://a/users/{id}");
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: b"no such user".to_vec(),
        };
        let err = b.parse_response(response).unwrap_err();
        assert_eq!(
            err,
            BindingError::HttpStatus {
                status: 404,
                body: "no such user".to_string()
            }
        );
    }

    #[test]
    fn parse_response_accepts_empty_body() {
        let b = binding(HttpExtensionMethod::Delete, "http://a/users/{id}");
        let response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(b.parse_response(response).unwrap().is_empty());
    }
}
