//! Identifiers: `NameID`, `Issuer`, `BaseID` and `EncryptedID`

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::assertion::NameIdFormat;
use crate::chunk::RawChunk;
use crate::dispatch::{self, lookup_by_type, ExtensionPoint};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{expect_element, non_empty_text, optional_attribute};
use crate::namespaces::{QName, XsiType};
use crate::object::SamlElement;
use crate::registry::{ExtensionRegistry, Family, Handler};
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

/// `NameQualifier` and `SPNameQualifier`, shared by every identifier type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdQualifiers {
    name_qualifier: Option<String>,
    sp_name_qualifier: Option<String>,
}

impl IdQualifiers {
    /// Qualifiers with the given values
    pub fn new(name_qualifier: Option<String>, sp_name_qualifier: Option<String>) -> Self {
        Self {
            name_qualifier,
            sp_name_qualifier,
        }
    }

    /// Read both qualifiers off `element`
    pub fn from_element(element: &Element) -> Self {
        Self {
            name_qualifier: optional_attribute(element, "NameQualifier"),
            sp_name_qualifier: optional_attribute(element, "SPNameQualifier"),
        }
    }

    /// Security domain of the identifying party
    pub fn name_qualifier(&self) -> Option<&str> {
        self.name_qualifier.as_deref()
    }

    /// Security domain of the service provider
    pub fn sp_name_qualifier(&self) -> Option<&str> {
        self.sp_name_qualifier.as_deref()
    }

    /// Whether neither qualifier is set
    pub fn is_empty(&self) -> bool {
        self.name_qualifier.is_none() && self.sp_name_qualifier.is_none()
    }

    /// Write the qualifiers onto `element`
    pub fn write_to(&self, element: &mut Element) {
        element.set_optional_attribute("NameQualifier", self.name_qualifier.as_deref());
        element.set_optional_attribute("SPNameQualifier", self.sp_name_qualifier.as_deref());
    }
}

/// Content model shared by `NameID` and `Issuer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIdType {
    value: String,
    qualifiers: IdQualifiers,
    format: Option<String>,
    sp_provided_id: Option<String>,
}

impl NameIdType {
    /// A bare identifier value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            qualifiers: IdQualifiers::default(),
            format: None,
            sp_provided_id: None,
        }
    }

    /// Set `NameQualifier` and `SPNameQualifier`
    pub fn with_qualifiers(mut self, qualifiers: IdQualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Set `Format`
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set `SPProvidedID`
    pub fn with_sp_provided_id(mut self, id: impl Into<String>) -> Self {
        self.sp_provided_id = Some(id.into());
        self
    }

    /// Identifier value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Qualifier attributes
    pub fn qualifiers(&self) -> &IdQualifiers {
        &self.qualifiers
    }

    /// `Format` URI
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// `SPProvidedID`
    pub fn sp_provided_id(&self) -> Option<&str> {
        self.sp_provided_id.as_deref()
    }

    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            value: non_empty_text(element)?,
            qualifiers: IdQualifiers::from_element(element),
            format: optional_attribute(element, "Format"),
            sp_provided_id: optional_attribute(element, "SPProvidedID"),
        })
    }

    fn write_to(&self, element: &mut Element) {
        self.qualifiers.write_to(element);
        element.set_optional_attribute("Format", self.format.as_deref());
        element.set_optional_attribute("SPProvidedID", self.sp_provided_id.as_deref());
        element.set_text(self.value.clone());
    }
}

/// `saml:Issuer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    name: NameIdType,
}

impl Issuer {
    /// Issuer with the given entity ID and no attributes
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            name: NameIdType::new(value),
        }
    }

    /// Issuer from a full name identifier
    ///
    /// An issuer in the entity format must not carry qualifiers or an
    /// `SPProvidedID` (SAML core 8.3.6).
    pub fn from_name(name: NameIdType) -> Result<Self> {
        let entity = name.format() == Some(NameIdFormat::Entity.uri());
        if entity && (!name.qualifiers.is_empty() || name.sp_provided_id.is_some()) {
            return Err(Error::ProtocolViolation(
                "Issuer with entity format must not have NameQualifier, SPNameQualifier or SPProvidedID"
                    .to_string(),
            ));
        }
        Ok(Self { name })
    }

    /// Issuer value
    pub fn value(&self) -> &str {
        self.name.value()
    }

    /// Full name identifier content
    pub fn name(&self) -> &NameIdType {
        &self.name
    }
}

impl SamlElement for Issuer {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Issuer";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Self::from_name(NameIdType::from_element(element)?)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        self.name.write_to(&mut element);
        Ok(element)
    }
}

/// `saml:NameID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    name: NameIdType,
}

impl NameId {
    /// NameID with the given value and no attributes
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            name: NameIdType::new(value),
        }
    }

    /// NameID from a full name identifier
    pub fn from_name(name: NameIdType) -> Self {
        Self { name }
    }

    /// Identifier value
    pub fn value(&self) -> &str {
        self.name.value()
    }

    /// `Format` URI
    pub fn format(&self) -> Option<&str> {
        self.name.format()
    }

    /// Full name identifier content
    pub fn name(&self) -> &NameIdType {
        &self.name
    }
}

impl SamlElement for NameId {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "NameID";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            name: NameIdType::from_element(element)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        self.name.write_to(&mut element);
        Ok(element)
    }
}

/// A `BaseID` type supplied by the hosting application
pub trait CustomBaseId: fmt::Debug + Send + Sync {
    /// The `xsi:type` this identifier is written with
    fn xsi_type(&self) -> &XsiType;

    /// `NameQualifier` and `SPNameQualifier`
    fn qualifiers(&self) -> &IdQualifiers;

    /// Encode as a `saml:BaseID` element
    fn to_xml(&self) -> Result<Element>;

    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// A `BaseID` whose `xsi:type` has no registered handler
#[derive(Debug, Clone)]
pub struct UnknownId {
    raw: RawChunk,
    xsi_type: String,
    type_name: QName,
    qualifiers: IdQualifiers,
}

impl UnknownId {
    /// The element as it was received
    pub fn raw(&self) -> &RawChunk {
        &self.raw
    }

    /// Lexical `xsi:type` value
    pub fn xsi_type(&self) -> &str {
        &self.xsi_type
    }

    /// Resolved `xsi:type`
    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    /// `NameQualifier` and `SPNameQualifier`
    pub fn qualifiers(&self) -> &IdQualifiers {
        &self.qualifiers
    }
}

/// `saml:BaseID`
#[derive(Debug, Clone)]
pub enum BaseId {
    /// Decoded by a registered handler
    Extension(Arc<dyn CustomBaseId>),
    /// Kept verbatim
    Unknown(UnknownId),
}

impl BaseId {
    /// Wrap an application-defined identifier
    pub fn extension(id: impl CustomBaseId + 'static) -> Self {
        BaseId::Extension(Arc::new(id))
    }

    /// Lexical `xsi:type` value
    pub fn xsi_type(&self) -> String {
        match self {
            BaseId::Extension(id) => id.xsi_type().attribute_value(),
            BaseId::Unknown(id) => id.xsi_type.clone(),
        }
    }

    /// Resolved `xsi:type`
    pub fn type_name(&self) -> QName {
        match self {
            BaseId::Extension(id) => id.xsi_type().type_name(),
            BaseId::Unknown(id) => id.type_name.clone(),
        }
    }

    /// `NameQualifier` and `SPNameQualifier`
    pub fn qualifiers(&self) -> &IdQualifiers {
        match self {
            BaseId::Extension(id) => id.qualifiers(),
            BaseId::Unknown(id) => &id.qualifiers,
        }
    }

    /// `NameQualifier`
    pub fn name_qualifier(&self) -> Option<&str> {
        self.qualifiers().name_qualifier()
    }

    /// `SPNameQualifier`
    pub fn sp_name_qualifier(&self) -> Option<&str> {
        self.qualifiers().sp_name_qualifier()
    }

    /// The concrete extension type, if this is one
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            BaseId::Extension(id) => id.as_any().downcast_ref(),
            BaseId::Unknown(_) => None,
        }
    }

    /// The unknown holder, if no handler was registered
    pub fn as_unknown(&self) -> Option<&UnknownId> {
        match self {
            BaseId::Unknown(id) => Some(id),
            BaseId::Extension(_) => None,
        }
    }
}

impl ExtensionPoint for BaseId {
    const FAMILY: Family = Family::BaseId;
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const LOCAL_NAME: &'static str = "BaseID";

    fn lookup<'r>(
        registry: &'r ExtensionRegistry,
        type_name: &QName,
        xsi_type: &str,
    ) -> Option<&'r Handler> {
        lookup_by_type(registry, type_name, xsi_type)
    }

    fn from_handler(
        handler: &Handler,
        element: &Element,
        registry: &ExtensionRegistry,
    ) -> Option<Result<Self>> {
        match handler {
            Handler::BaseId(decode) => Some(decode(element, registry).map(BaseId::Extension)),
            _ => None,
        }
    }

    fn unknown(
        raw: RawChunk,
        xsi_type: String,
        type_name: QName,
        element: &Element,
    ) -> Result<Self> {
        Ok(BaseId::Unknown(UnknownId {
            raw,
            xsi_type,
            type_name,
            qualifiers: IdQualifiers::from_element(element),
        }))
    }
}

impl SamlElement for BaseId {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "BaseID";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        dispatch::decode(element, registry)
    }

    fn to_xml(&self) -> Result<Element> {
        match self {
            BaseId::Extension(id) => id.to_xml(),
            BaseId::Unknown(id) => Ok(id.raw.to_xml()),
        }
    }
}

/// The identifier of a `Subject` or `SubjectConfirmation`
#[derive(Debug, Clone)]
pub enum Identifier {
    /// `saml:BaseID`
    BaseId(BaseId),
    /// `saml:NameID`
    NameId(NameId),
    /// `saml:EncryptedID`, carried without decryption
    EncryptedId(RawChunk),
}

impl Identifier {
    /// Decode the identifier child of `parent`, if any
    ///
    /// At most one of `BaseID`, `NameID` and `EncryptedID` may be present.
    pub fn decode_optional(parent: &Element, registry: &ExtensionRegistry) -> Result<Option<Self>> {
        let mut found = parent.children().filter(|child| {
            child.namespace() == Some(SAML_ASSERTION_NAMESPACE)
                && matches!(child.local_name(), "BaseID" | "NameID" | "EncryptedID")
        });

        let Some(first) = found.next() else {
            return Ok(None);
        };
        if found.next().is_some() {
            return Err(Error::TooManyElements(format!(
                "More than one identifier in {}",
                parent.prefixed_name()
            )));
        }

        let identifier = match first.local_name() {
            "BaseID" => Identifier::BaseId(BaseId::decode(first, registry)?),
            "NameID" => Identifier::NameId(NameId::decode(first, registry)?),
            _ => {
                expect_element(first, SAML_ASSERTION_NAMESPACE, "EncryptedID")?;
                Identifier::EncryptedId(RawChunk::capture(first))
            }
        };
        Ok(Some(identifier))
    }

    /// Encode and append under `parent`
    pub fn append_to(&self, parent: &mut Element) -> Result<()> {
        match self {
            Identifier::BaseId(id) => id.append_to(parent),
            Identifier::NameId(id) => id.append_to(parent),
            Identifier::EncryptedId(chunk) => {
                chunk.append_to(parent);
                Ok(())
            }
        }
    }

    /// The `NameID`, if this is one
    pub fn as_name_id(&self) -> Option<&NameId> {
        match self {
            Identifier::NameId(id) => Some(id),
            _ => None,
        }
    }

    /// The `BaseID`, if this is one
    pub fn as_base_id(&self) -> Option<&BaseId> {
        match self {
            Identifier::BaseId(id) => Some(id),
            _ => None,
        }
    }
}

impl From<BaseId> for Identifier {
    fn from(id: BaseId) -> Self {
        Identifier::BaseId(id)
    }
}

impl From<NameId> for Identifier {
    fn from(id: NameId) -> Self {
        Identifier::NameId(id)
    }
}
