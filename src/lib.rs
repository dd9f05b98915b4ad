//! # samlobjects
//!
//! A typed object model for SAML 2.0 XML structures.
//!
//! Every element type pairs a decode operation (`from_xml` / `decode`) with an
//! encode operation (`to_xml`) over a namespace-aware element tree, and
//! validates its content against the SAML schema constraints.
//!
//! ## Extension points
//!
//! `BaseID`, `Condition`, `Statement` and `RoleDescriptor` are abstract in the
//! SAML schema and are specialised with `xsi:type`. Decoding one of them
//! resolves the `xsi:type` value against the namespaces in scope, looks the
//! resulting type up in an [`ExtensionRegistry`] supplied by the caller, and
//! either delegates to the registered handler or keeps the element verbatim in
//! an "unknown" holder that re-emits it unchanged.
//!
//! ## Example
//!
//! ```rust,ignore
//! use samlobjects::{Assertion, Document, ExtensionRegistry, SamlElement};
//!
//! let registry = ExtensionRegistry::new();
//! let root = Document::from_string(xml)?.into_root()?;
//! let assertion = Assertion::decode(&root, &registry)?;
//! let xml = assertion.to_xml()?.to_xml_string()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// XML layer
pub mod names;
pub mod namespaces;
pub mod documents;
pub mod chunk;
pub mod loaders;

// Extension dispatch
pub mod helpers;
pub mod registry;
pub mod dispatch;
pub mod object;

// SAML elements
pub mod assertion;
pub mod metadata;

// Re-exports for convenience
pub use assertion::*;
pub use chunk::RawChunk;
pub use documents::{Document, Element};
pub use error::{Error, Result, SchemaViolation};
pub use metadata::{CustomRoleDescriptor, RoleDescriptor, RoleDescriptorAttributes, UnknownRoleDescriptor};
pub use namespaces::{QName, XsiType};
pub use object::SamlElement;
pub use registry::{ExtensionRegistry, Family, Handler};

/// Version of the samlobjects library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SAML 2.0 assertion namespace
pub const SAML_ASSERTION_NAMESPACE: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// Conventional prefix for the assertion namespace
pub const SAML_ASSERTION_PREFIX: &str = "saml";

/// SAML 2.0 metadata namespace
pub const SAML_METADATA_NAMESPACE: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// Conventional prefix for the metadata namespace
pub const SAML_METADATA_PREFIX: &str = "md";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Conventional prefix for the XML Schema instance namespace
pub const XSI_PREFIX: &str = "xsi";

/// XML Schema namespace
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Signature namespace
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Encryption namespace
pub const XMLENC_NAMESPACE: &str = "http://www.w3.org/2001/04/xmlenc#";
