//! XML document handling
//!
//! A small namespace-aware element tree. Namespaces are resolved while
//! parsing, and every element keeps the full set of bindings in scope at
//! its position so that QName-valued content (`xsi:type`) can be resolved
//! without access to its ancestors.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names::split_qname;
use crate::namespaces::{resolve_type_name, NamespaceContext, QName};
use crate::XSI_NAMESPACE;
use indexmap::IndexMap;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Attribute value plus the prefix it was written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Prefix used for the attribute name, if any
    pub prefix: Option<String>,
    /// Unescaped value
    pub value: String,
}

/// A node in element content
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Character data, unescaped and untrimmed
    Text(String),
    /// CDATA section
    CData(String),
    /// Comment, without the `<!--` `-->` delimiters
    Comment(String),
    /// Processing instruction, target and data as written
    ProcessingInstruction(String),
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Prefix the element name is written with
    pub prefix: Option<String>,
    /// Element attributes (namespace declarations excluded), in document order
    pub attributes: IndexMap<QName, XmlAttribute>,
    /// Content nodes in document order
    pub content: Vec<Node>,
    /// Namespace declarations made on this element
    pub namespaces: NamespaceContext,
    in_scope: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: IndexMap::new(),
            content: Vec::new(),
            namespaces: NamespaceContext::new(),
            in_scope: NamespaceContext::new(),
        }
    }

    /// Create a namespaced element written as `prefix:local`
    pub fn qualified(namespace: &str, prefix: &str, local_name: &str) -> Self {
        let mut element = Self::new(QName::namespaced(namespace, local_name));
        element.prefix = Some(prefix.to_string());
        element.in_scope.add_prefix(prefix, namespace);
        element
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Name as written in the document, e.g. `saml:Issuer`
    pub fn prefixed_name(&self) -> String {
        match (&self.prefix, self.namespace()) {
            (Some(prefix), Some(_)) => format!("{}:{}", prefix, self.local_name()),
            _ => self.local_name().to_string(),
        }
    }

    /// Whether this element has the given namespace and local name
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.qname.matches(namespace, local_name)
    }

    /// Bindings in scope at this element, including its own declarations
    pub fn in_scope(&self) -> &NamespaceContext {
        &self.in_scope
    }

    /// Look up a prefix in scope at this element
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        self.in_scope.lookup(prefix)
    }

    /// Declare a namespace on this element
    pub fn declare_namespace(&mut self, prefix: Option<&str>, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.namespaces.bind(prefix, namespace.clone());
        self.in_scope.bind(prefix, namespace);
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&QName::local(name))
            .map(|a| a.value.as_str())
    }

    /// Get a namespaced attribute value
    pub fn get_attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .get(&QName::namespaced(namespace, name))
            .map(|a| a.value.as_str())
    }

    /// Set an unqualified attribute
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(
            QName::local(name),
            XmlAttribute {
                prefix: None,
                value: value.into(),
            },
        );
    }

    /// Set an unqualified attribute when a value is present
    pub fn set_optional_attribute(&mut self, name: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set_attribute(name, value);
        }
    }

    /// Set a namespaced attribute written with `prefix`
    pub fn set_attribute_ns(
        &mut self,
        namespace: &str,
        prefix: &str,
        name: &str,
        value: impl Into<String>,
    ) {
        if self.in_scope.lookup(Some(prefix)).is_none() {
            self.in_scope.add_prefix(prefix, namespace);
        }
        self.attributes.insert(
            QName::namespaced(namespace, name),
            XmlAttribute {
                prefix: Some(prefix.to_string()),
                value: value.into(),
            },
        );
    }

    /// The raw `xsi:type` attribute value, if present
    pub fn xsi_type(&self) -> Option<&str> {
        self.get_attribute_ns(XSI_NAMESPACE, "type")
    }

    /// Append a child element
    pub fn add_child(&mut self, child: Element) {
        self.content.push(Node::Element(child));
    }

    /// Append a content node
    pub fn push_node(&mut self, node: Node) {
        self.content.push(node);
    }

    /// Replace the character data of this element, keeping child elements
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content
            .retain(|node| !matches!(node, Node::Text(_) | Node::CData(_)));
        self.content.insert(0, Node::Text(text.into()));
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Mutable child elements in document order
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.content.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// The child element at `index`, counting elements only
    pub fn child(&self, index: usize) -> Option<&Element> {
        self.children().nth(index)
    }

    /// Whether the element has no child elements
    pub fn has_children(&self) -> bool {
        self.children().next().is_some()
    }

    /// Drop every child element, keeping character data
    pub fn clear_children(&mut self) {
        self.content.retain(|node| !matches!(node, Node::Element(_)));
    }

    /// All character data directly inside this element, concatenated
    pub fn text_content(&self) -> Cow<'_, str> {
        let mut texts = self.content.iter().filter_map(|node| match node {
            Node::Text(text) | Node::CData(text) => Some(text.as_str()),
            _ => None,
        });
        let Some(first) = texts.next() else {
            return Cow::Borrowed("");
        };
        match texts.next() {
            None => Cow::Borrowed(first),
            Some(second) => {
                let mut joined = format!("{}{}", first, second);
                joined.extend(texts);
                Cow::Owned(joined)
            }
        }
    }

    /// Character data, or `None` when there is none besides whitespace
    pub fn text(&self) -> Option<String> {
        let text = self.text_content();
        (!text.trim().is_empty()).then(|| text.into_owned())
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Child elements with the given namespace and local name
    pub fn children_ns<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children()
            .filter(move |e| e.is(namespace, local_name))
    }

    /// Serialize this element (and its subtree) to a string
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, &NamespaceContext::new())?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Serialized XML is not valid UTF-8: {}", e)))
    }

    /// XML equality: names and attribute values compared after namespace
    /// resolution, `xsi:type` compared as resolved names. Content order is
    /// significant; attribute order, prefixes, comments, processing
    /// instructions and surrounding whitespace are not.
    pub fn xml_eq(&self, other: &Element) -> bool {
        if self.qname != other.qname || self.attributes.len() != other.attributes.len() {
            return false;
        }

        for (qname, attr) in &self.attributes {
            let Some(other_attr) = other.attributes.get(qname) else {
                return false;
            };
            let equal = if qname.matches(XSI_NAMESPACE, "type") {
                resolve_type_name(&attr.value, self) == resolve_type_name(&other_attr.value, other)
            } else {
                attr.value == other_attr.value
            };
            if !equal {
                return false;
            }
        }

        let ours = self.significant_content();
        let theirs = other.significant_content();
        ours.len() == theirs.len()
            && ours.iter().zip(&theirs).all(|pair| match pair {
                (Significant::Text(a), Significant::Text(b)) => a == b,
                (Significant::Element(a), Significant::Element(b)) => a.xml_eq(b),
                _ => false,
            })
    }

    /// Content with comments and PIs dropped, adjacent text merged and
    /// trimmed, and whitespace-only text removed
    fn significant_content(&self) -> Vec<Significant<'_>> {
        let mut result = Vec::new();
        let mut pending = String::new();
        for node in &self.content {
            match node {
                Node::Text(text) | Node::CData(text) => pending.push_str(text),
                Node::Element(element) => {
                    flush_text(&mut pending, &mut result);
                    result.push(Significant::Element(element));
                }
                Node::Comment(_) | Node::ProcessingInstruction(_) => {}
            }
        }
        flush_text(&mut pending, &mut result);
        result
    }
}

enum Significant<'a> {
    Text(String),
    Element(&'a Element),
}

fn flush_text(pending: &mut String, result: &mut Vec<Significant<'_>>) {
    let trimmed = pending.trim();
    if !trimmed.is_empty() {
        result.push(Significant::Text(trimmed.to_string()));
    }
    pending.clear();
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    scope: &NamespaceContext,
) -> Result<()> {
    let mut declarations = element.namespaces.clone();
    let mut effective = scope.clone();
    effective.extend(&declarations);

    // Declare the element's own namespace where the output does not yet bind it
    let prefix = element.prefix.as_deref();
    match element.namespace() {
        Some(ns) if effective.lookup(prefix) != Some(ns) => {
            declarations.bind(prefix, ns);
            effective.bind(prefix, ns);
        }
        None if effective.lookup(None).is_some() => {
            declarations.bind(None, "");
            effective.bind(None, "");
        }
        _ => {}
    }

    let mut attributes: Vec<(String, &str)> = Vec::with_capacity(element.attributes.len());
    let mut generated = 0usize;
    for (qname, attr) in &element.attributes {
        let key = match qname.namespace() {
            None => qname.local_name.clone(),
            Some(ns) => {
                let wanted = attr.prefix.as_deref();
                let existing = effective.prefix_for(ns).flatten().map(str::to_string);
                let attr_prefix = match wanted {
                    Some(p) if effective.lookup(Some(p)) == Some(ns) => p.to_string(),
                    Some(p) if !declarations.declares(Some(p)) && Some(p) != prefix => {
                        declarations.add_prefix(p, ns);
                        effective.add_prefix(p, ns);
                        p.to_string()
                    }
                    _ => match existing {
                        Some(p) => p,
                        None => {
                            let mut candidate = format!("ns{}", generated);
                            while effective.declares(Some(&candidate)) {
                                generated += 1;
                                candidate = format!("ns{}", generated);
                            }
                            declarations.add_prefix(candidate.clone(), ns);
                            effective.add_prefix(candidate.clone(), ns);
                            candidate
                        }
                    },
                };
                format!("{}:{}", attr_prefix, qname.local_name)
            }
        };
        attributes.push((key, attr.value.as_str()));
    }

    let name = element.prefixed_name();
    let mut start = BytesStart::new(name.clone());
    for (prefix, ns) in declarations.iter() {
        let key = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), ns));
    }
    for (key, value) in &attributes {
        start.push_attribute((key.as_str(), *value));
    }

    if element.content.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for node in &element.content {
        match node {
            Node::Element(child) => write_element(writer, child, &effective)?,
            Node::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?
            }
            Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
            Node::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
            Node::ProcessingInstruction(text) => {
                writer.write_event(Event::PI(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        // Text is kept untrimmed so that passthrough content re-serializes verbatim
        let mut reader = Reader::from_reader(xml);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, element_stack.last(), limits)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.set_root(current)?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, element_stack.last(), limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        doc.set_root(element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        current.push_node(Node::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = std::str::from_utf8(&e)
                            .map_err(|e| Error::Xml(format!("Invalid CDATA section: {}", e)))?;
                        current.push_node(Node::CData(text.to_string()));
                    }
                }
                Ok(Event::Comment(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = std::str::from_utf8(&e)
                            .map_err(|e| Error::Xml(format!("Invalid comment: {}", e)))?;
                        current.push_node(Node::Comment(text.to_string()));
                    }
                }
                Ok(Event::PI(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = std::str::from_utf8(&e).map_err(|e| {
                            Error::Xml(format!("Invalid processing instruction: {}", e))
                        })?;
                        current.push_node(Node::ProcessingInstruction(text.to_string()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // XML declaration, DOCTYPE, and nodes outside the root
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document".to_string()));
        }

        Ok(doc)
    }

    fn set_root(&mut self, element: Element) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::Xml("Document has more than one root element".to_string()));
        }
        self.root = Some(element);
        Ok(())
    }

    /// Parse element from BytesStart event, resolving names against the parent scope
    fn parse_element(
        start: &BytesStart,
        parent: Option<&Element>,
        limits: &Limits,
    ) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut declarations = NamespaceContext::new();
        let mut raw_attributes: Vec<(String, String)> = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            // Handle namespace declarations
            if attr_name == "xmlns" {
                declarations.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declarations.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        limits.check_attributes(raw_attributes.len())?;
        limits.check_namespaces(declarations.len())?;

        let mut in_scope = parent.map(|p| p.in_scope.clone()).unwrap_or_default();
        in_scope.extend(&declarations);

        let (prefix, local) = split_qname(&name);
        let namespace = in_scope.lookup(prefix).map(str::to_string);
        if let (Some(p), None) = (prefix, &namespace) {
            return Err(Error::Xml(format!(
                "Unbound namespace prefix '{}' on element '{}'",
                p, name
            )));
        }

        let mut element = Element::new(QName::new(namespace, local));
        element.prefix = prefix.map(str::to_string);
        element.namespaces = declarations;
        element.in_scope = in_scope;

        for (attr_name, value) in raw_attributes {
            let (attr_prefix, attr_local) = split_qname(&attr_name);
            let qname = match attr_prefix {
                None => QName::local(attr_local),
                Some(p) => {
                    let ns = element.in_scope.lookup(Some(p)).ok_or_else(|| {
                        Error::Xml(format!(
                            "Unbound namespace prefix '{}' on attribute '{}'",
                            p, attr_name
                        ))
                    })?;
                    QName::namespaced(ns, attr_local)
                }
            };
            element.attributes.insert(
                qname,
                XmlAttribute {
                    prefix: attr_prefix.map(str::to_string),
                    value,
                },
            );
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take the root element, failing on an empty document
    pub fn into_root(self) -> Result<Element> {
        self.root
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAML_ASSERTION_NAMESPACE;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.root.is_none());
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children().count(), 1);
        assert_eq!(root.child(0).unwrap().local_name(), "child");
        assert_eq!(root.child(0).unwrap().text().as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="a &amp; b"><child/></root>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();

        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("a & b"));
        let keys: Vec<_> = root.attributes.keys().map(|q| q.local_name.as_str()).collect();
        assert_eq!(keys, ["attr1", "attr2"]);
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                         <saml:Issuer xsi:type="saml:NameIDType">idp</saml:Issuer>
                     </saml:Assertion>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();

        assert!(root.is(SAML_ASSERTION_NAMESPACE, "Assertion"));
        assert_eq!(root.prefixed_name(), "saml:Assertion");
        let issuer = root.child(0).unwrap();
        assert!(issuer.is(SAML_ASSERTION_NAMESPACE, "Issuer"));
        assert_eq!(issuer.xsi_type(), Some("saml:NameIDType"));
        assert_eq!(issuer.lookup_namespace(Some("xsi")), Some(XSI_NAMESPACE));
        assert!(issuer.namespaces.is_empty());
    }

    #[test]
    fn test_default_namespace_undeclaration() {
        let xml = r#"<a xmlns="urn:a"><b xmlns=""><c/></b></a>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();
        assert_eq!(root.namespace(), Some("urn:a"));
        let b = root.child(0).unwrap();
        assert_eq!(b.namespace(), None);
        assert_eq!(b.child(0).unwrap().namespace(), None);
    }

    #[test]
    fn test_unbound_element_prefix_is_an_error() {
        let err = Document::from_string("<x:root/>").unwrap_err();
        assert!(matches!(err, Error::Xml(_)));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        assert!(Document::from_string("<a/><b/>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a><a><a><a/></a></a></a>";
        let limits = Limits {
            max_xml_depth: 3,
            ..Limits::default()
        };
        let err = Document::parse_with_limits(xml.as_bytes(), &limits).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_find_children() {
        let xml = r#"<root><child1/><child2/><child1/></root>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();
        assert_eq!(root.find_children("child1").len(), 2);
    }

    #[test]
    fn test_writer_declares_used_namespaces() {
        let mut root = Element::qualified(SAML_ASSERTION_NAMESPACE, "saml", "Conditions");
        let mut child = Element::qualified(SAML_ASSERTION_NAMESPACE, "saml", "OneTimeUse");
        child.set_attribute("note", "<&>");
        root.add_child(child);

        let xml = root.to_xml_string().unwrap();
        assert_eq!(
            xml,
            r#"<saml:Conditions xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"><saml:OneTimeUse note="&lt;&amp;&gt;"/></saml:Conditions>"#
        );
    }

    #[test]
    fn test_serialize_then_parse_is_xml_equal() {
        let xml = r#"<p:root xmlns:p="urn:p" xmlns:q="urn:q" q:attr="1"><p:child>text</p:child><plain/></p:root>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();
        let written = root.to_xml_string().unwrap();
        let reparsed = Document::from_string(&written).unwrap().into_root().unwrap();
        assert!(root.xml_eq(&reparsed));
    }

    #[test]
    fn test_xml_eq_ignores_prefixes_but_not_values() {
        let a = Document::from_string(r#"<x:r xmlns:x="urn:r" a="1"/>"#)
            .unwrap()
            .into_root()
            .unwrap();
        let b = Document::from_string(r#"<r xmlns="urn:r" a="1"/>"#)
            .unwrap()
            .into_root()
            .unwrap();
        let c = Document::from_string(r#"<r xmlns="urn:r" a="2"/>"#)
            .unwrap()
            .into_root()
            .unwrap();
        assert!(a.xml_eq(&b));
        assert!(!a.xml_eq(&c));
    }

    #[test]
    fn test_xml_eq_compares_resolved_xsi_type() {
        let a = Document::from_string(
            r#"<e xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:one="urn:t" xsi:type="one:T"/>"#,
        )
        .unwrap()
        .into_root()
        .unwrap();
        let b = Document::from_string(
            r#"<e xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:two="urn:t" xsi:type="two:T"/>"#,
        )
        .unwrap()
        .into_root()
        .unwrap();
        assert!(a.xml_eq(&b));
    }

    #[test]
    fn test_mixed_content_keeps_document_order() {
        let xml = r#"<p:r xmlns:p="urn:p">Hello <p:b>w</p:b> world<!--keep--><?pi data?><![CDATA[<raw>]]></p:r>"#;
        let root = Document::from_string(xml).unwrap().into_root().unwrap();

        assert_eq!(root.content.len(), 6);
        assert_eq!(root.content[0], Node::Text("Hello ".to_string()));
        assert!(matches!(root.content[1], Node::Element(_)));
        assert_eq!(root.content[2], Node::Text(" world".to_string()));
        assert_eq!(root.content[3], Node::Comment("keep".to_string()));
        assert_eq!(root.content[4], Node::ProcessingInstruction("pi data".to_string()));
        assert_eq!(root.content[5], Node::CData("<raw>".to_string()));
        assert_eq!(root.text_content(), "Hello  world<raw>");

        assert_eq!(root.to_xml_string().unwrap(), xml);
    }

    #[test]
    fn test_whitespace_text_is_preserved() {
        let xml = "<r>\n  <a> padded </a>\n</r>";
        let root = Document::from_string(xml).unwrap().into_root().unwrap();
        assert_eq!(root.child(0).unwrap().text_content(), " padded ");
        assert_eq!(root.text(), None);
        assert_eq!(root.to_xml_string().unwrap(), xml);
    }

    #[test]
    fn test_set_text_replaces_character_data() {
        let mut element = Element::new(QName::local("e"));
        element.push_node(Node::Text("old".to_string()));
        element.add_child(Element::new(QName::local("c")));
        element.set_text("new");
        assert_eq!(element.text_content(), "new");
        assert_eq!(element.children().count(), 1);
        assert_eq!(element.to_xml_string().unwrap(), "<e>new<c/></e>");
    }

    #[test]
    fn test_xml_eq_is_order_aware_but_ignores_comments() {
        let parse = |xml: &str| Document::from_string(xml).unwrap().into_root().unwrap();
        let a = parse("<r>x<c/>y</r>");
        assert!(a.xml_eq(&parse("<r> x <!--note--><c/>y</r>")));
        assert!(!a.xml_eq(&parse("<r>xy<c/></r>")));
        assert!(!a.xml_eq(&parse("<r><c/>xy</r>")));
    }
}
