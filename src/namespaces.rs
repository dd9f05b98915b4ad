//! XML namespace handling
//!
//! This module provides qualified names, namespace prefix mappings and the
//! resolver that turns an `xsi:type` value into a canonical type name.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::documents::Element;
use crate::error::{Error, Result, SchemaViolation};
use crate::names::{is_valid_ncname, split_qname};
use crate::{XML_NAMESPACE, XSI_NAMESPACE, XSI_PREFIX};

/// Qualified name (QName) - combination of namespace and local name
///
/// Also serves as the canonical type identifier of an `xsi:type` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace URI as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Registry key form: `namespace:local` when resolved, `local` otherwise
    pub fn canonical(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Whether this name has the given namespace and local name
    pub fn matches(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace context for resolving prefixes
///
/// Keys are prefixes (`None` for the default namespace). A binding to the
/// empty string undeclares the prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    bindings: IndexMap<Option<String>, String>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.bindings.insert(Some(prefix.into()), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.bindings.insert(None, namespace.into());
    }

    /// Bind `prefix` (or the default namespace when `None`)
    pub fn bind(&mut self, prefix: Option<&str>, namespace: impl Into<String>) {
        self.bindings.insert(prefix.map(str::to_string), namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.lookup(Some(prefix))
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.lookup(None)
    }

    /// Look up a prefix; `xml` is always bound, empty bindings count as unbound
    pub fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .get(&prefix.map(str::to_string))
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Whether the prefix has an entry (including an undeclaration)
    pub fn declares(&self, prefix: Option<&str>) -> bool {
        self.bindings.contains_key(&prefix.map(str::to_string))
    }

    /// Find a prefix bound to `namespace`, preferring the most recent binding
    pub fn prefix_for(&self, namespace: &str) -> Option<Option<&str>> {
        self.bindings
            .iter()
            .rev()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_deref())
    }

    /// Iterate over declarations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, ns)| (prefix.as_deref(), ns.as_str()))
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no declarations
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Overlay `other` on top of this context; bindings in `other` win
    pub fn extend(&mut self, other: &NamespaceContext) {
        for (prefix, ns) in &other.bindings {
            self.bindings.insert(prefix.clone(), ns.clone());
        }
    }

    /// Resolve an `xsi:type` value against this context.
    ///
    /// An unbound prefix degrades to a namespace-less name instead of failing.
    pub fn resolve_type_name(&self, value: &str) -> QName {
        let (prefix, local) = split_qname(value);
        match self.lookup(prefix) {
            Some(ns) => QName::namespaced(ns, local),
            None => QName::local(local),
        }
    }
}

/// Resolve an `xsi:type` value using the bindings in scope at `element`
pub fn resolve_type_name(value: &str, element: &Element) -> QName {
    element.in_scope().resolve_type_name(value)
}

/// An `xsi:type` value together with the prefix binding it was written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsiType {
    prefix: Option<String>,
    namespace: Option<String>,
    local_name: String,
}

impl XsiType {
    /// A prefixed type in `namespace`
    ///
    /// Fails unless `prefix` and `local_name` are NCNames and `namespace` is
    /// non-empty, so that the written value always decodes again.
    pub fn new(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Result<Self> {
        let (prefix, namespace, local_name) = (prefix.into(), namespace.into(), local_name.into());
        let lexical = format!("{}:{}", prefix, local_name);
        if !is_valid_ncname(&prefix) || !is_valid_ncname(&local_name) {
            return Err(Error::SchemaViolation(
                SchemaViolation::new(format!("'{}' is not a valid xs:QName", lexical))
                    .with_element("xsi:type")
                    .with_value(lexical),
            ));
        }
        if namespace.trim().is_empty() {
            return Err(Error::SchemaViolation(
                SchemaViolation::new("xsi:type prefix must be bound to a namespace")
                    .with_element("xsi:type")
                    .with_value(lexical),
            ));
        }
        Ok(Self::builtin(prefix, namespace, local_name))
    }

    /// A type from a fixed, known-valid vocabulary such as `xs:string`
    pub(crate) fn builtin(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Read the lexical value back from an element's in-scope bindings
    pub fn from_attribute(value: &str, element: &Element) -> Self {
        let (prefix, local) = split_qname(value);
        Self {
            prefix: prefix.map(str::to_string),
            namespace: element.lookup_namespace(prefix).map(str::to_string),
            local_name: local.to_string(),
        }
    }

    /// Prefix used in the lexical form
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Namespace the prefix is bound to, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local part of the type name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Lexical attribute value, e.g. `ssp:CustomType`
    pub fn attribute_value(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// The resolved type name
    pub fn type_name(&self) -> QName {
        QName::new(self.namespace.clone(), self.local_name.clone())
    }

    /// Write `xsi:type` onto `element`, declaring both the xsi prefix and
    /// the type prefix on the element itself.
    ///
    /// When the type prefix is already bound on `element` to another
    /// namespace (typically the element's own prefix), a fresh prefix is
    /// used instead so the value still resolves to this type.
    pub fn apply_to(&self, element: &mut Element) {
        if element
            .lookup_namespace(Some(XSI_PREFIX))
            .map_or(true, |ns| ns == XSI_NAMESPACE)
        {
            element.declare_namespace(Some(XSI_PREFIX), XSI_NAMESPACE);
        }

        let value = match &self.namespace {
            Some(ns) => {
                let prefix = match self.prefix.as_deref() {
                    Some(p) if element.lookup_namespace(Some(p)).map_or(true, |bound| bound == ns) => {
                        p.to_string()
                    }
                    wanted => fresh_prefix(element, wanted.unwrap_or("ns")),
                };
                element.declare_namespace(Some(&prefix), ns.clone());
                format!("{}:{}", prefix, self.local_name)
            }
            None => self.attribute_value(),
        };
        element.set_attribute_ns(XSI_NAMESPACE, XSI_PREFIX, "type", value);
    }
}

/// First `{base}{n}` prefix not bound at `element`
fn fresh_prefix(element: &Element, base: &str) -> String {
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| element.lookup_namespace(Some(candidate)).is_none())
        .unwrap_or_else(|| base.to_string())
}

impl fmt::Display for XsiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attribute_value())
    }
}
