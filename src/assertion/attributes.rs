//! `saml:AttributeStatement`, `saml:Attribute` and `saml:AttributeValue`

use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{optional_attribute, required_attribute};
use crate::names::validate_qname;
use crate::namespaces::XsiType;
use crate::object::SamlElement;
use crate::registry::ExtensionRegistry;
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX, XSI_NAMESPACE, XSI_PREFIX, XS_NAMESPACE};

/// `saml:AttributeValue`
///
/// The value is kept as text plus any child elements; typed values keep
/// their `xsi:type` so they are written back the same way.
#[derive(Debug, Clone, Default)]
pub struct AttributeValue {
    xsi_type: Option<XsiType>,
    nil: bool,
    text: Option<String>,
    children: Vec<RawChunk>,
}

impl AttributeValue {
    /// Untyped text value
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            ..Self::default()
        }
    }

    /// Text value typed as `xs:string`
    pub fn string(value: impl Into<String>) -> Self {
        Self::text(value).with_type(XsiType::builtin("xs", XS_NAMESPACE, "string"))
    }

    /// Explicit `xsi:nil="true"` value
    pub fn nil() -> Self {
        Self {
            nil: true,
            ..Self::default()
        }
    }

    /// Value made of child elements
    pub fn elements(children: Vec<RawChunk>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Set the `xsi:type`
    pub fn with_type(mut self, xsi_type: XsiType) -> Self {
        self.xsi_type = Some(xsi_type);
        self
    }

    /// The declared `xsi:type`
    pub fn xsi_type(&self) -> Option<&XsiType> {
        self.xsi_type.as_ref()
    }

    /// Whether the value is `xsi:nil`
    pub fn is_nil(&self) -> bool {
        self.nil
    }

    /// Text content
    pub fn value(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Child elements
    pub fn children(&self) -> &[RawChunk] {
        &self.children
    }
}

impl SamlElement for AttributeValue {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AttributeValue";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;

        let xsi_type = match element.xsi_type() {
            Some(value) => {
                validate_qname(value, &element.prefixed_name())?;
                Some(XsiType::from_attribute(value, element))
            }
            None => None,
        };
        let nil = matches!(
            element.get_attribute_ns(XSI_NAMESPACE, "nil").map(str::trim),
            Some("true") | Some("1")
        );

        Ok(Self {
            xsi_type,
            nil,
            text: element.text(),
            children: element.children().map(RawChunk::capture).collect(),
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        if let Some(xsi_type) = &self.xsi_type {
            xsi_type.apply_to(&mut element);
        }
        if self.nil {
            element.set_attribute_ns(XSI_NAMESPACE, XSI_PREFIX, "nil", "true");
        }
        if let Some(text) = &self.text {
            element.set_text(text.clone());
        }
        for child in &self.children {
            child.append_to(&mut element);
        }
        Ok(element)
    }
}

/// `saml:Attribute`
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    name_format: Option<String>,
    friendly_name: Option<String>,
    values: Vec<AttributeValue>,
}

impl Attribute {
    /// Attribute with the given name and values
    pub fn new(name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values,
        }
    }

    /// Set `NameFormat`
    pub fn with_name_format(mut self, format: impl Into<String>) -> Self {
        self.name_format = Some(format.into());
        self
    }

    /// Set `FriendlyName`
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// `Name`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `NameFormat`
    pub fn name_format(&self) -> Option<&str> {
        self.name_format.as_deref()
    }

    /// `FriendlyName`
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    /// Attribute values in document order
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Text of every value that has text
    pub fn string_values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(AttributeValue::value)
    }
}

impl SamlElement for Attribute {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Attribute";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            name: required_attribute(element, "Name")?.to_string(),
            name_format: optional_attribute(element, "NameFormat"),
            friendly_name: optional_attribute(element, "FriendlyName"),
            values: AttributeValue::decode_all(element, registry)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("Name", self.name.clone());
        element.set_optional_attribute("NameFormat", self.name_format.as_deref());
        element.set_optional_attribute("FriendlyName", self.friendly_name.as_deref());
        for value in &self.values {
            value.append_to(&mut element)?;
        }
        Ok(element)
    }
}

/// A member of an `AttributeStatement`
#[derive(Debug, Clone)]
pub enum AttributeItem {
    /// `saml:Attribute`
    Attribute(Attribute),
    /// `saml:EncryptedAttribute`, carried without decryption
    Encrypted(RawChunk),
}

/// `saml:AttributeStatement`
#[derive(Debug, Clone)]
pub struct AttributeStatement {
    items: Vec<AttributeItem>,
}

impl AttributeStatement {
    /// Statement with at least one attribute or encrypted attribute
    pub fn new(items: Vec<AttributeItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::MissingElement(
                "Missing Attribute or EncryptedAttribute in saml:AttributeStatement".to_string(),
            ));
        }
        Ok(Self { items })
    }

    /// Statement made of plain attributes
    pub fn from_attributes(attributes: Vec<Attribute>) -> Result<Self> {
        Self::new(attributes.into_iter().map(AttributeItem::Attribute).collect())
    }

    /// Members in document order
    pub fn items(&self) -> &[AttributeItem] {
        &self.items
    }

    /// Plain attributes
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter_map(|item| match item {
            AttributeItem::Attribute(a) => Some(a),
            AttributeItem::Encrypted(_) => None,
        })
    }

    /// Encrypted attributes
    pub fn encrypted_attributes(&self) -> impl Iterator<Item = &RawChunk> {
        self.items.iter().filter_map(|item| match item {
            AttributeItem::Encrypted(chunk) => Some(chunk),
            AttributeItem::Attribute(_) => None,
        })
    }

    /// The attribute with the given `Name`
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|a| a.name() == name)
    }
}

impl SamlElement for AttributeStatement {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AttributeStatement";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;

        let mut items = Vec::new();
        for child in element.children() {
            if child.is(SAML_ASSERTION_NAMESPACE, "Attribute") {
                items.push(AttributeItem::Attribute(Attribute::decode(child, registry)?));
            } else if child.is(SAML_ASSERTION_NAMESPACE, "EncryptedAttribute") {
                items.push(AttributeItem::Encrypted(RawChunk::capture(child)));
            }
        }
        Self::new(items)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        for item in &self.items {
            match item {
                AttributeItem::Attribute(attribute) => attribute.append_to(&mut element)?,
                AttributeItem::Encrypted(chunk) => chunk.append_to(&mut element),
            }
        }
        Ok(element)
    }
}
