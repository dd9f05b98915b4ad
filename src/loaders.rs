//! Resource loading utilities
//!
//! This module loads SAML documents from files, readers or strings under
//! the configured [`Limits`].

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Resource loader for SAML documents
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits applied by this loader
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load and parse a document from a file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Document::parse_with_limits(&content, &self.limits)
    }

    /// Load and parse a document from a reader, refusing oversized input early
    pub fn load_reader(&self, reader: impl Read) -> Result<Document> {
        let mut content = Vec::new();
        let cap = self.limits.max_xml_size as u64 + 1;
        reader.take(cap).read_to_end(&mut content)?;
        Document::parse_with_limits(&content, &self.limits)
    }

    /// Parse a document held in memory
    pub fn load_str(&self, xml: &str) -> Result<Document> {
        Document::parse_with_limits(xml.as_bytes(), &self.limits)
    }
}
