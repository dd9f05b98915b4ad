//! Error types for samlobjects
//!
//! This module defines all error types used throughout the library.
//! Decoding either succeeds completely or fails with one of these kinds;
//! an unregistered `xsi:type` is not an error (see [`crate::dispatch`]).

use std::fmt;
use thiserror::Error;

use crate::registry::Family;

/// Result type alias using samlobjects Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for samlobjects operations
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong element handed to a decoder (local name or namespace mismatch)
    #[error("invalid element: expected {expected}, got {actual}")]
    InvalidElement {
        /// Expected element in `{namespace}local` notation
        expected: String,
        /// Actual element in `{namespace}local` notation
        actual: String,
    },

    /// Content present but violating a schema constraint
    #[error("schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    /// A registered handler belongs to a different extension family
    #[error(
        "classification error: handler registered for type '{type_name}' decodes {actual}, expected {expected}"
    )]
    Classification {
        /// The canonical type the handler was found for
        type_name: String,
        /// The family being decoded
        expected: Family,
        /// The family the handler produces
        actual: Family,
    },

    /// A required child element is absent
    #[error("missing element: {0}")]
    MissingElement(String),

    /// A child element occurs more often than allowed
    #[error("too many elements: {0}")]
    TooManyElements(String),

    /// SAML processing rule violated
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// Build an [`Error::InvalidElement`] from expected and actual names
    pub fn invalid_element(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::InvalidElement {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Shorthand for a schema violation carrying only a message
    pub fn schema(message: impl Into<String>) -> Self {
        Error::SchemaViolation(SchemaViolation::new(message))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Schema constraint violation with context
#[derive(Debug, Clone)]
pub struct SchemaViolation {
    /// Error message
    pub message: String,
    /// Element the violation was found on
    pub element: Option<String>,
    /// Offending attribute or text value
    pub value: Option<String>,
}

impl SchemaViolation {
    /// Create a new schema violation
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            element: None,
            value: None,
        }
    }

    /// Set the element where the violation was found
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref element) = self.element {
            write!(f, " (element: {})", element)?;
        }

        if let Some(ref value) = self.value {
            write!(f, " (value: '{}')", value)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaViolation {}
