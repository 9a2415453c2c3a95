//! URI template resolution: joining binding and operation locations, and
//! substituting parameters into placeholders.
//!
//! # Syntax
//! - `{name}` is replaced by the percent-encoded parameter value.
//! - `{!name}` is replaced by the raw value.
//! - `{{` and `}}` are literal braces.

use std::fmt;

use url::form_urlencoded;

use crate::consts;
use crate::error::{BindingError, Result};
use crate::types::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, raw: bool },
}

/// A parsed location template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse `source`, rejecting unbalanced braces and empty placeholders.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(malformed(source, pos, "unmatched `}`"));
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed(source, inner_pos, "nested `{`")),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(malformed(source, pos, "unterminated placeholder"));
                    }
                    let (name, raw) = match name.strip_prefix('!') {
                        Some(rest) => (rest.trim().to_string(), true),
                        None => (name.trim().to_string(), false),
                    };
                    if name.is_empty() {
                        return Err(malformed(source, pos, "empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder { name, raw });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names cited by placeholders, in template order. Repeated names appear
    /// once per occurrence.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `params`.
    pub fn expand(&self, params: &Parameters) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, raw } => {
                    let value = params.get(name).ok_or_else(|| {
                        BindingError::TemplateResolution(format!(
                            "no value for placeholder `{name}` in `{}`",
                            self.source
                        ))
                    })?;
                    if *raw {
                        out.push_str(&value.canonical());
                    } else {
                        out.push_str(&encode_component(&value.canonical()));
                    }
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Join a binding-level base location with an operation-level location.
///
/// An absolute operation location replaces the base. Otherwise the two are
/// joined with exactly one `/`, except that a location starting with `?` or
/// `#` is appended as-is.
pub fn resolve_location(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    if base.is_empty() || is_absolute(relative) {
        return relative.to_string();
    }
    if relative.starts_with('?') || relative.starts_with('#') {
        return format!("{base}{relative}");
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Join and parse in one step.
pub fn resolve(base: Option<&str>, relative: Option<&str>) -> Result<UriTemplate> {
    UriTemplate::parse(&resolve_location(
        base.unwrap_or_default(),
        relative.unwrap_or_default(),
    ))
}

/// Pick the query parameter separator: operation, then binding, then `&`.
pub fn resolve_separator<'a>(binding: Option<&'a str>, operation: Option<&'a str>) -> &'a str {
    operation
        .or(binding)
        .unwrap_or(consts::QUERY_PARAMETER_SEPARATOR_DEFAULT)
}

/// RFC 3986 scheme check: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
pub fn is_absolute(location: &str) -> bool {
    let Some((scheme, _)) = location.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Percent-encode a value for use inside a path segment or query value.
pub(crate) fn encode_component(value: &str) -> String {
    // form encoding writes spaces as `+` and escapes literal `+`, so the
    // swap below is unambiguous.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn malformed(source: &str, pos: usize, reason: &str) -> BindingError {
    BindingError::TemplateResolution(format!("malformed location `{source}` at {pos}: {reason}"))
}
