//! Property tests for the resolver, templates and codecs.

use proptest::prelude::*;
use wsdl_http_core::template::{self, resolve_location};
use wsdl_http_core::{
    consts, resolve, BindingError, BodyCodec, Element, HttpExtensionMethod, ParamValue,
    Parameters, SerializationKind, UriTemplate,
};

fn wsdl(name: &str) -> Element {
    Element::new(Some(consts::WSDL_NAMESPACE), name)
}

fn http(name: &str) -> Element {
    Element::new(Some(consts::HTTP_NAMESPACE), name)
}

fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        "[a-zA-Z0-9 &<>'\"%+;=/?._-]{0,12}".prop_map(ParamValue::Text),
        any::<i64>().prop_map(ParamValue::Integer),
        (-1.0e9f64..1.0e9f64).prop_map(ParamValue::Float),
        any::<bool>().prop_map(ParamValue::Boolean),
    ]
}

/// A path segment: a literal or one of the `p`/`q` placeholders.
fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9]{1,6}",
        Just("{p}".to_string()),
        Just("{q}".to_string()),
    ]
}

fn leading_slashes(s: &str) -> usize {
    s.len() - s.trim_start_matches('/').len()
}

fn trailing_slashes(s: &str) -> usize {
    s.len() - s.trim_end_matches('/').len()
}

/// Names valid both as XML elements and as url-encoded keys.
fn parameters() -> impl Strategy<Value = Parameters> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", param_value(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn method_names_map_exactly(name in "[A-Za-z]{1,8}") {
        let known = HttpExtensionMethod::ALL.iter().find(|m| m.as_str() == name);
        match (name.parse::<HttpExtensionMethod>(), known) {
            (Ok(parsed), Some(expected)) => prop_assert_eq!(parsed, *expected),
            (Err(BindingError::ExtensionValidation(_)), None) => {}
            (other, _) => prop_assert!(false, "unexpected {:?} for {}", other, name),
        }
    }

    #[test]
    fn template_resolution_commutes_with_expansion(
        host in "[a-z]{1,10}",
        base_segments in prop::collection::vec(segment(), 0..3),
        relative_segments in prop::collection::vec(segment(), 1..3),
        p in "[a-zA-Z0-9 /?]{0,6}",
        q in "[a-zA-Z0-9 /?]{0,6}",
    ) {
        let base = format!("http://{host}.example.com/{}", base_segments.join("/"));
        let relative = format!("/{}", relative_segments.join("/"));
        let params = Parameters::from_iter([("p", p.as_str()), ("q", q.as_str())]);

        let joined = template::resolve(Some(&base), Some(&relative)).unwrap();
        let expanded_base = UriTemplate::parse(&base).unwrap().expand(&params).unwrap();
        let expanded_relative = UriTemplate::parse(&relative).unwrap().expand(&params).unwrap();

        // An empty value next to the join point adds a `/` of its own.
        prop_assume!(trailing_slashes(&expanded_base) == trailing_slashes(&base));
        prop_assume!(leading_slashes(&expanded_relative) == leading_slashes(&relative));

        prop_assert_eq!(
            joined.expand(&params).unwrap(),
            resolve_location(&expanded_base, &expanded_relative)
        );
    }

    #[test]
    fn codecs_round_trip(params in parameters(), separator in prop_oneof![Just("&"), Just(";")]) {
        let codecs = [
            BodyCodec::for_kind(SerializationKind::UrlEncoded, separator, "Op").unwrap(),
            BodyCodec::for_kind(SerializationKind::Xml, separator, "OpResponse").unwrap(),
            BodyCodec::for_kind(SerializationKind::Json, separator, "Op").unwrap(),
        ];
        for codec in codecs {
            let body = codec.encode(&params).unwrap();
            let decoded = codec.decode(&body).unwrap();
            prop_assert_eq!(&decoded, &params, "{:?}", codec.kind());
        }
    }

    #[test]
    fn missing_method_fails_only_that_operation(has_method in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut binding = wsdl("binding")
            .attr("name", "B")
            .child(http("binding").attr("location", "http://api.example.com"));
        for (i, with_method) in has_method.iter().enumerate() {
            let mut ext = http("operation").attr("location", &format!("/op{i}"));
            if *with_method {
                ext = ext.attr("method", "GET");
            }
            binding = binding.child(wsdl("operation").attr("name", &format!("Op{i}")).child(ext));
        }

        let resolution = resolve(&wsdl("definitions").child(binding));
        let expected_ok: Vec<String> = has_method
            .iter()
            .enumerate()
            .filter(|(_, ok)| **ok)
            .map(|(i, _)| format!("Op{i}"))
            .collect();
        let expected_err: Vec<String> = has_method
            .iter()
            .enumerate()
            .filter(|(_, ok)| !**ok)
            .map(|(i, _)| format!("Op{i}"))
            .collect();

        let resolved: Vec<String> = resolution.bindings.iter().map(|b| b.operation.clone()).collect();
        let failed: Vec<String> = resolution.errors.iter().map(|e| e.operation.clone()).collect();
        prop_assert_eq!(resolved, expected_ok);
        prop_assert_eq!(failed, expected_err);
        for error in &resolution.errors {
            prop_assert!(matches!(error.error, BindingError::ExtensionValidation(_)));
        }
    }

    #[test]
    fn default_separator_joins_query_with_ampersand(a in "[a-z0-9]{1,6}", b in "[a-z0-9]{1,6}") {
        let document = wsdl("binding")
            .attr("name", "B")
            .child(http("binding").attr("location", "http://api.example.com"))
            .child(
                wsdl("operation")
                    .attr("name", "Search")
                    .child(http("operation").attr("method", "GET").attr("location", "/search")),
            );
        let resolution = resolve(&document);
        let binding = resolution.binding("Search").unwrap();
        prop_assert_eq!(binding.query_parameter_separator.as_str(), "&");

        let request = binding
            .build_request(&Parameters::from_iter([("a", a.as_str()), ("b", b.as_str())]))
            .unwrap();
        prop_assert_eq!(request.url, format!("http://api.example.com/search?a={a}&b={b}"));
    }

    #[test]
    fn text_plain_is_recognised_but_unsupported(
        upper in any::<bool>(),
        charset in prop::option::of("[a-z0-9-]{1,8}"),
    ) {
        let mut media_type = if upper { "TEXT/PLAIN".to_string() } else { "text/plain".to_string() };
        if let Some(charset) = charset {
            media_type.push_str(&format!("; charset={charset}"));
        }
        let kind: SerializationKind = media_type.parse().unwrap();
        prop_assert_eq!(kind, SerializationKind::PlainText);
        prop_assert!(matches!(
            BodyCodec::for_kind(kind, "&", "Op"),
            Err(BindingError::UnsupportedSerialization(_))
        ));
    }
}
