//! Turns a WSDL element tree into one `HttpOperationBinding` per operation.
//!
//! # Design
//! Each operation walks the same sequence of stages:
//!
//! `Start → MatchedBindingExtension → MatchedOperationExtension → HeadersCollected → Resolved`
//!
//! A failure at any stage is recorded against that operation only; the
//! remaining operations keep going. Operations read nothing but their own
//! subtree and the binding-level defaults, so they can be resolved on a rayon
//! pool without coordination. Order in the output always follows the
//! document.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::binding::{output_element, HttpOperationBinding};
use crate::codec::BodyCodec;
use crate::consts;
use crate::error::BindingError;
use crate::matcher::ExtensionMatcher;
use crate::model::{Element, HttpExtension, HttpExtensionProperties, SerializationKind};
use crate::template::{self, resolve_separator};

/// Stages an operation passes through while its binding is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyStage {
    Start,
    MatchedBindingExtension,
    MatchedOperationExtension,
    HeadersCollected,
    Resolved,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssemblyStage::Start => "start",
            AssemblyStage::MatchedBindingExtension => "matched binding extension",
            AssemblyStage::MatchedOperationExtension => "matched operation extension",
            AssemblyStage::HeadersCollected => "headers collected",
            AssemblyStage::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// A single operation that could not be resolved.
///
/// `stage` is the last stage the operation reached before failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub binding: String,
    pub operation: String,
    pub stage: AssemblyStage,
    pub error: BindingError,
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (after {}): {}",
            self.binding, self.operation, self.stage, self.error
        )
    }
}

impl std::error::Error for OperationError {}

/// Outcome of resolving a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub bindings: Vec<HttpOperationBinding>,
    pub errors: Vec<OperationError>,
}

impl Resolution {
    /// First resolved binding for `operation`, searching all bindings.
    pub fn binding(&self, operation: &str) -> Option<&HttpOperationBinding> {
        self.bindings.iter().find(|b| b.operation == operation)
    }

    pub fn error(&self, operation: &str) -> Option<&OperationError> {
        self.errors.iter().find(|e| e.operation == operation)
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Knobs for a resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Resolve operations on the rayon global pool.
    pub parallel: bool,
    /// Operations still unresolved at this instant fail with `Cancelled`.
    pub deadline: Option<Instant>,
    /// Operations still unresolved once this is set fail with `Cancelled`.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Resolve `document` sequentially with default options.
pub fn resolve(document: &Element) -> Resolution {
    BindingAssembler::new(document).resolve()
}

struct BindingContext {
    name: String,
    matcher: ExtensionMatcher,
}

struct WorkItem<'a> {
    context: Arc<BindingContext>,
    index: usize,
    operation: &'a Element,
}

enum Outcome {
    Resolved(HttpOperationBinding),
    Failed(OperationError),
}

pub struct BindingAssembler<'a> {
    document: &'a Element,
    options: ResolveOptions,
}

impl<'a> BindingAssembler<'a> {
    pub fn new(document: &'a Element) -> Self {
        Self {
            document,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve(&self) -> Resolution {
        let mut outcomes: Vec<(usize, Outcome)> = Vec::new();
        let mut work: Vec<(usize, WorkItem<'a>)> = Vec::new();
        let mut slot = 0usize;

        for binding in self.bindings() {
            let binding_name = binding
                .attribute(consts::ATTRIBUTE_NAME)
                .unwrap_or_default()
                .to_string();
            let operations: Vec<&Element> = binding
                .children
                .iter()
                .filter(|child| is_wsdl_element(child, consts::ELEMENT_OPERATION))
                .collect();

            match self.binding_context(binding, &binding_name) {
                Ok(Some(context)) => {
                    let context = Arc::new(context);
                    for (index, operation) in operations.into_iter().enumerate() {
                        work.push((
                            slot,
                            WorkItem {
                                context: Arc::clone(&context),
                                index,
                                operation,
                            },
                        ));
                        slot += 1;
                    }
                }
                Ok(None) => {
                    debug!("binding `{binding_name}` has no HTTP extension, skipping");
                }
                Err(error) => {
                    warn!("binding `{binding_name}` is invalid: {error}");
                    for (index, operation) in operations.into_iter().enumerate() {
                        let failure = OperationError {
                            binding: binding_name.clone(),
                            operation: operation_name(operation, index),
                            stage: AssemblyStage::Start,
                            error: error.clone(),
                        };
                        outcomes.push((slot, Outcome::Failed(failure)));
                        slot += 1;
                    }
                }
            }
        }

        let resolved: Vec<(usize, Outcome)> = if self.options.parallel {
            work.into_par_iter()
                .map(|(slot, item)| (slot, self.assemble(&item)))
                .collect()
        } else {
            work.into_iter()
                .map(|(slot, item)| (slot, self.assemble(&item)))
                .collect()
        };
        outcomes.extend(resolved);
        outcomes.sort_by_key(|(slot, _)| *slot);

        let mut resolution = Resolution::default();
        for (_, outcome) in outcomes {
            match outcome {
                Outcome::Resolved(binding) => resolution.bindings.push(binding),
                Outcome::Failed(error) => resolution.errors.push(error),
            }
        }
        debug!(
            "resolved {} operation(s), {} failed",
            resolution.bindings.len(),
            resolution.errors.len()
        );
        resolution
    }

    /// WSDL `binding` elements: the root itself, or the root's children.
    fn bindings(&self) -> Vec<&'a Element> {
        if is_wsdl_element(self.document, consts::ELEMENT_BINDING) {
            return vec![self.document];
        }
        self.document
            .children
            .iter()
            .filter(|child| is_wsdl_element(child, consts::ELEMENT_BINDING))
            .collect()
    }

    /// `Start → MatchedBindingExtension` for a whole binding.
    fn binding_context(
        &self,
        binding: &Element,
        name: &str,
    ) -> Result<Option<BindingContext>, BindingError> {
        let matcher = ExtensionMatcher::new();
        let mut defaults: Option<HttpExtensionProperties> = None;

        for child in &binding.children {
            if child.in_namespace(&consts::WSDL_NAMESPACES) {
                continue;
            }
            // Only the first `http:binding` counts; later ones are not read.
            if defaults.is_some() && is_http_element(child, consts::ELEMENT_BINDING) {
                continue;
            }
            match matcher.classify(child)? {
                HttpExtension::Binding(props) if defaults.is_none() => defaults = Some(props),
                HttpExtension::Unrecognized => reject_required(child)?,
                _ => {}
            }
        }

        Ok(defaults.map(|defaults| {
            trace!("binding `{name}`: {} with {defaults:?}", AssemblyStage::MatchedBindingExtension);
            BindingContext {
                name: name.to_string(),
                matcher: ExtensionMatcher::with_defaults(defaults),
            }
        }))
    }

    fn assemble(&self, item: &WorkItem<'_>) -> Outcome {
        let mut stage = AssemblyStage::MatchedBindingExtension;
        match self.assemble_operation(item, &mut stage) {
            Ok(binding) => {
                trace!("{}/{}: {}", binding.binding, binding.operation, AssemblyStage::Resolved);
                Outcome::Resolved(binding)
            }
            Err(error) => {
                let failure = OperationError {
                    binding: item.context.name.clone(),
                    operation: operation_name(item.operation, item.index),
                    stage,
                    error,
                };
                warn!("operation not resolved: {failure}");
                Outcome::Failed(failure)
            }
        }
    }

    fn assemble_operation(
        &self,
        item: &WorkItem<'_>,
        stage: &mut AssemblyStage,
    ) -> Result<HttpOperationBinding, BindingError> {
        let context = &item.context;
        let operation = item.operation;
        let defaults = context.matcher.defaults();

        let name = operation
            .attribute(consts::ATTRIBUTE_NAME)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                BindingError::ExtensionValidation(format!(
                    "operation #{} in binding `{}` has no `name`",
                    item.index, context.name
                ))
            })?
            .to_string();
        self.check_cancelled()?;

        // → MatchedOperationExtension
        let mut extension: Option<(&Element, HttpExtensionProperties)> = None;
        for child in &operation.children {
            if child.in_namespace(&consts::WSDL_NAMESPACES) {
                continue;
            }
            if extension.is_some() && is_http_element(child, consts::ELEMENT_OPERATION) {
                continue;
            }
            match context.matcher.classify(child)? {
                HttpExtension::Operation(props) if extension.is_none() => {
                    extension = Some((child, props));
                }
                HttpExtension::Unrecognized => reject_required(child)?,
                _ => {}
            }
        }
        let (extension_element, props) = match extension {
            Some((element, props)) => (Some(element), props),
            None if defaults.method.is_some() => (None, HttpExtensionProperties::default()),
            None => {
                return Err(BindingError::ExtensionValidation(format!(
                    "operation `{name}` has no HTTP operation extension and the binding declares no default `{}`",
                    consts::PROPERTY_METHOD
                )));
            }
        };
        *stage = AssemblyStage::MatchedOperationExtension;
        trace!("{}/{name}: {}", context.name, stage);
        self.check_cancelled()?;

        // → HeadersCollected
        let mut headers = Vec::new();
        for child in &operation.children {
            if let Some(header) = ExtensionMatcher::match_header(child)? {
                headers.push(header);
            } else if extension_element.is_some_and(|ext| std::ptr::eq(ext, child)) {
                for nested in &child.children {
                    if let Some(header) = ExtensionMatcher::match_header(nested)? {
                        headers.push(header);
                    }
                }
            }
        }
        *stage = AssemblyStage::HeadersCollected;
        trace!("{}/{name}: {} ({} header(s))", context.name, stage, headers.len());
        self.check_cancelled()?;

        // → Resolved
        let merged = props.overlay(defaults);
        let method = merged.method.ok_or_else(|| {
            BindingError::ExtensionValidation(format!("operation `{name}` has no method"))
        })?;
        let template = template::resolve(defaults.location.as_deref(), props.location.as_deref())?;
        let separator = resolve_separator(
            defaults.query_parameter_separator.as_deref(),
            props.query_parameter_separator.as_deref(),
        )
        .to_string();
        // The separator is used for query strings regardless of body format.
        BodyCodec::for_kind(SerializationKind::UrlEncoded, &separator, &name)?;

        let input_serialization = merged.input_serialization.unwrap_or(if method.has_body() {
            SerializationKind::Xml
        } else {
            SerializationKind::UrlEncoded
        });
        let output_serialization = merged.output_serialization.unwrap_or(SerializationKind::Xml);
        BodyCodec::for_kind(input_serialization, &separator, &name)?;
        BodyCodec::for_kind(output_serialization, &separator, &output_element(&name))?;
        self.check_cancelled()?;

        Ok(HttpOperationBinding {
            binding: context.name.clone(),
            operation: name,
            method,
            location: template.as_str().to_string(),
            headers,
            input_serialization,
            output_serialization,
            query_parameter_separator: separator,
            ignore_uncited: merged.ignore_uncited.unwrap_or(false),
            cookies: merged.cookies.unwrap_or(false),
            transfer_coding: merged.transfer_coding.or(merged.transfer_coding_default),
        })
    }

    fn check_cancelled(&self) -> Result<(), BindingError> {
        let cancelled = self
            .options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        let expired = self
            .options
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        if cancelled || expired {
            return Err(BindingError::Cancelled);
        }
        Ok(())
    }
}

/// Structural WSDL element check. Elements without a namespace are accepted
/// so that trees from namespace-unaware parsers still resolve.
fn is_wsdl_element(element: &Element, name: &str) -> bool {
    element.name == name
        && (element.namespace.is_none() || element.in_namespace(&consts::WSDL_NAMESPACES))
}

fn is_http_element(element: &Element, name: &str) -> bool {
    element.name == name && ExtensionMatcher::is_http_extension(element)
}

/// An extension the resolver does not understand is only fatal when the
/// document marks it `required`.
fn reject_required(element: &Element) -> Result<(), BindingError> {
    if element.is_required() {
        return Err(BindingError::ExtensionValidation(format!(
            "required extension `{}` in namespace `{}` is not understood",
            element.name,
            element.namespace.as_deref().unwrap_or_default()
        )));
    }
    Ok(())
}

fn operation_name(operation: &Element, index: usize) -> String {
    operation
        .attribute(consts::ATTRIBUTE_NAME)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}
