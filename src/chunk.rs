//! Raw element passthrough
//!
//! A [`RawChunk`] owns a verbatim copy of an element subtree. Namespace
//! bindings that the subtree uses but inherits from ancestors are copied
//! onto the captured root, so the chunk re-serializes on its own.

use crate::documents::Element;
use crate::error::Result;
use crate::names::split_qname;
use crate::namespaces::NamespaceContext;

/// Opaque, owned copy of an element
#[derive(Debug, Clone)]
pub struct RawChunk {
    element: Element,
}

impl RawChunk {
    /// Capture `element` and every inherited binding its subtree refers to
    pub fn capture(element: &Element) -> Self {
        let mut needed: Vec<(Option<String>, String)> = Vec::new();
        collect_inherited_bindings(element, &NamespaceContext::new(), &mut needed);

        let mut captured = element.clone();
        for (prefix, namespace) in needed {
            if !captured.namespaces.declares(prefix.as_deref()) {
                captured.declare_namespace(prefix.as_deref(), namespace);
            }
        }
        Self { element: captured }
    }

    /// The captured element
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Local name of the captured element
    pub fn local_name(&self) -> &str {
        self.element.local_name()
    }

    /// Namespace of the captured element
    pub fn namespace(&self) -> Option<&str> {
        self.element.namespace()
    }

    /// Name as written, e.g. `ds:Signature`
    pub fn qualified_name(&self) -> String {
        self.element.prefixed_name()
    }

    /// A copy of the captured element, ready to be placed in a new tree
    pub fn to_xml(&self) -> Element {
        self.element.clone()
    }

    /// Append a copy of the captured element to `parent`
    pub fn append_to(&self, parent: &mut Element) {
        parent.add_child(self.to_xml());
    }

    /// Serialize the captured element
    pub fn to_xml_string(&self) -> Result<String> {
        self.element.to_xml_string()
    }

    /// Unwrap into the captured element
    pub fn into_element(self) -> Element {
        self.element
    }
}

impl From<Element> for RawChunk {
    fn from(element: Element) -> Self {
        Self::capture(&element)
    }
}

fn collect_inherited_bindings(
    element: &Element,
    declared_above: &NamespaceContext,
    needed: &mut Vec<(Option<String>, String)>,
) {
    let mut declared = declared_above.clone();
    declared.extend(&element.namespaces);

    let mut used: Vec<Option<&str>> = Vec::new();
    if element.namespace().is_some() {
        used.push(element.prefix.as_deref());
    }
    for (qname, attr) in &element.attributes {
        if qname.namespace().is_some() {
            used.push(attr.prefix.as_deref());
        }
    }
    if let Some(xsi_type) = element.xsi_type() {
        used.push(split_qname(xsi_type).0);
    }

    for prefix in used {
        if prefix == Some("xml") || declared.declares(prefix) {
            continue;
        }
        if let Some(namespace) = element.lookup_namespace(prefix) {
            let key = prefix.map(str::to_string);
            if !needed.iter().any(|(p, _)| *p == key) {
                needed.push((key, namespace.to_string()));
            }
        }
    }

    for child in element.children() {
        collect_inherited_bindings(child, &declared, needed);
    }
}
