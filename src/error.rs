//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
/// Some variants are only constructed in library code/tests.
#[derive(Error, Debug)]
pub enum GraftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Dependency resolution
    // ─────────────────────────────────────────────────────────────
    #[error("Service '{service}' could not be constructed for '{definition}': no provider was declared on the definition or the framework")]
    UnresolvedDependency { service: String, definition: String },

    #[error("Constructor of '{definition}' asked for more arguments than its declared dependency list resolves")]
    ConstructorArity { definition: String },

    #[error("Constructor of '{definition}' expected service '{service}' to be a '{expected_type}'")]
    ServiceType {
        definition: String,
        service: String,
        expected_type: &'static str,
    },

    // ─────────────────────────────────────────────────────────────
    // Selectors and documents
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid selector '{selector}': {details}")]
    SelectorParse { selector: String, details: String },

    #[error("HTML parse error at position {position}: {details}")]
    HtmlParse { position: usize, details: String },

    // ─────────────────────────────────────────────────────────────
    // Template compilation and rendering
    // ─────────────────────────────────────────────────────────────
    #[error("Template parse error at position {position}: {details}")]
    TemplateParse { position: usize, details: String },

    #[error("Event binding '{fragment}' has no quoted method name")]
    MalformedEventBinding { fragment: String },

    #[error("Generated listener id '{id}' was not found in the rendered subtree of '{definition}'")]
    MissingEventTarget { id: String, definition: String },

    #[error("'{definition}' has no method '{method}'")]
    UnknownMethod { definition: String, method: String },

    #[error("'{definition}' has no property '{property}'")]
    UnknownProperty {
        definition: String,
        property: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────
    #[error("Expression parse error in '{expr}' at position {position}: {details}")]
    ExprParse {
        expr: String,
        position: usize,
        details: String,
    },

    #[error("Expression path '{path}' matched nothing in the current scope")]
    ExprPathNoMatch { path: String },
}

impl FixSuggestion for GraftError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            GraftError::Io(_) => Some("Check file path and permissions"),
            GraftError::UnresolvedDependency { .. } => {
                Some("Add a provider for this service name to the definition or to the bootstrap module")
            }
            GraftError::ConstructorArity { .. } => {
                Some("Keep the declared dependency list and the constructor's argument reads in sync")
            }
            GraftError::ServiceType { .. } => {
                Some("The provider for this name constructs a different type than the constructor downcasts to")
            }
            GraftError::SelectorParse { .. } => {
                Some("Supported selectors: tag, #id, .class, [attr], [attr=value], and conjunctions like div[chrono]")
            }
            GraftError::HtmlParse { .. } => Some("Check for an unterminated quoted attribute value"),
            GraftError::TemplateParse { .. } => {
                Some("Check that every {{ has a matching }} in the template")
            }
            GraftError::MalformedEventBinding { .. } => {
                Some("Event bindings must look like (click)=\"methodName\"")
            }
            GraftError::MissingEventTarget { .. } => None,
            GraftError::UnknownMethod { .. } => {
                Some("Declare the method in the directive's call() dispatch")
            }
            GraftError::UnknownProperty { .. } => {
                Some("Declare the property in the directive's property()/set_property() dispatch")
            }
            GraftError::ExprParse { .. } => {
                Some("Supported expressions: booleans, numbers, quoted strings, [a, b] arrays, and dotted paths")
            }
            GraftError::ExprPathNoMatch { .. } => {
                Some("Check the path against the event payload shape (e.g. event.target.value)")
            }
        }
    }
}
