//! `md:RoleDescriptor`

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::chunk::RawChunk;
use crate::dispatch::{self, lookup_by_element, ExtensionPoint};
use crate::documents::Element;
use crate::error::{Error, Result, SchemaViolation};
use crate::helpers::{format_instant, optional_attribute, optional_instant, required_attribute};
use crate::namespaces::{QName, XsiType};
use crate::object::SamlElement;
use crate::registry::{ExtensionRegistry, Family, Handler};
use crate::{SAML_METADATA_NAMESPACE, SAML_METADATA_PREFIX};

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P([0-9]+Y)?([0-9]+M)?([0-9]+D)?(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$")
        .expect("duration pattern is valid")
});

fn is_valid_duration(value: &str) -> bool {
    DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T')
}

/// Attributes every role descriptor carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDescriptorAttributes {
    id: Option<String>,
    valid_until: Option<DateTime<Utc>>,
    cache_duration: Option<String>,
    protocol_support_enumeration: Vec<String>,
    error_url: Option<String>,
}

impl RoleDescriptorAttributes {
    /// Attributes for a role supporting `protocols`; at least one is required
    pub fn new(protocols: Vec<String>) -> Result<Self> {
        if protocols.is_empty() {
            return Err(Error::schema(
                "protocolSupportEnumeration must list at least one protocol",
            ));
        }
        Ok(Self {
            id: None,
            valid_until: None,
            cache_duration: None,
            protocol_support_enumeration: protocols,
            error_url: None,
        })
    }

    /// Set `ID`
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set `validUntil`
    pub fn with_valid_until(mut self, instant: DateTime<Utc>) -> Self {
        self.valid_until = Some(instant);
        self
    }

    /// Set `cacheDuration`, an `xs:duration`
    pub fn with_cache_duration(mut self, duration: impl Into<String>) -> Result<Self> {
        let duration = duration.into();
        if !is_valid_duration(&duration) {
            return Err(Error::SchemaViolation(
                SchemaViolation::new("'cacheDuration' attribute is not a valid xs:duration")
                    .with_value(duration),
            ));
        }
        self.cache_duration = Some(duration);
        Ok(self)
    }

    /// Set `errorURL`
    pub fn with_error_url(mut self, url: impl Into<String>) -> Self {
        self.error_url = Some(url.into());
        self
    }

    /// Read the attributes off a role descriptor element
    pub fn from_element(element: &Element) -> Result<Self> {
        let protocols = required_attribute(element, "protocolSupportEnumeration")?;
        let protocols: Vec<String> = protocols.split_whitespace().map(str::to_string).collect();
        if protocols.is_empty() {
            return Err(Error::SchemaViolation(
                SchemaViolation::new("protocolSupportEnumeration must list at least one protocol")
                    .with_element(element.prefixed_name()),
            ));
        }

        let cache_duration = optional_attribute(element, "cacheDuration");
        if let Some(duration) = &cache_duration {
            if !is_valid_duration(duration) {
                return Err(Error::SchemaViolation(
                    SchemaViolation::new("'cacheDuration' attribute is not a valid xs:duration")
                        .with_element(element.prefixed_name())
                        .with_value(duration.clone()),
                ));
            }
        }

        Ok(Self {
            id: optional_attribute(element, "ID"),
            valid_until: optional_instant(element, "validUntil")?,
            cache_duration,
            protocol_support_enumeration: protocols,
            error_url: optional_attribute(element, "errorURL"),
        })
    }

    /// Write the attributes onto `element`
    pub fn write_to(&self, element: &mut Element) {
        element.set_optional_attribute("ID", self.id.as_deref());
        element.set_optional_attribute("validUntil", self.valid_until.as_ref().map(format_instant));
        element.set_optional_attribute("cacheDuration", self.cache_duration.as_deref());
        element.set_attribute(
            "protocolSupportEnumeration",
            self.protocol_support_enumeration.join(" "),
        );
        element.set_optional_attribute("errorURL", self.error_url.as_deref());
    }

    /// `ID`
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// `validUntil`
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    /// `cacheDuration`
    pub fn cache_duration(&self) -> Option<&str> {
        self.cache_duration.as_deref()
    }

    /// Protocols listed in `protocolSupportEnumeration`
    pub fn protocol_support_enumeration(&self) -> &[String] {
        &self.protocol_support_enumeration
    }

    /// `errorURL`
    pub fn error_url(&self) -> Option<&str> {
        self.error_url.as_deref()
    }

    /// Whether `protocol` is listed
    pub fn supports(&self, protocol: &str) -> bool {
        self.protocol_support_enumeration.iter().any(|p| p == protocol)
    }
}

/// A `RoleDescriptor` type supplied by the hosting application
pub trait CustomRoleDescriptor: fmt::Debug + Send + Sync {
    /// The `xsi:type` this descriptor is written with
    fn xsi_type(&self) -> &XsiType;

    /// Attributes shared by all role descriptors
    fn attributes(&self) -> &RoleDescriptorAttributes;

    /// Encode as an `md:RoleDescriptor` element
    fn to_xml(&self) -> Result<Element>;

    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// A `RoleDescriptor` whose `xsi:type` has no registered handler
#[derive(Debug, Clone)]
pub struct UnknownRoleDescriptor {
    raw: RawChunk,
    xsi_type: String,
    type_name: QName,
    attributes: RoleDescriptorAttributes,
}

impl UnknownRoleDescriptor {
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

    /// Attributes read off the element
    pub fn attributes(&self) -> &RoleDescriptorAttributes {
        &self.attributes
    }
}

/// `md:RoleDescriptor`
#[derive(Debug, Clone)]
pub enum RoleDescriptor {
    /// Decoded by a registered handler
    Extension(Arc<dyn CustomRoleDescriptor>),
    /// Kept verbatim
    Unknown(UnknownRoleDescriptor),
}

impl RoleDescriptor {
    /// Wrap an application-defined descriptor
    pub fn extension(descriptor: impl CustomRoleDescriptor + 'static) -> Self {
        RoleDescriptor::Extension(Arc::new(descriptor))
    }

    /// Lexical `xsi:type` value
    pub fn xsi_type(&self) -> String {
        match self {
            RoleDescriptor::Extension(d) => d.xsi_type().attribute_value(),
            RoleDescriptor::Unknown(d) => d.xsi_type.clone(),
        }
    }

    /// Resolved `xsi:type`
    pub fn type_name(&self) -> QName {
        match self {
            RoleDescriptor::Extension(d) => d.xsi_type().type_name(),
            RoleDescriptor::Unknown(d) => d.type_name.clone(),
        }
    }

    /// Attributes shared by all role descriptors
    pub fn attributes(&self) -> &RoleDescriptorAttributes {
        match self {
            RoleDescriptor::Extension(d) => d.attributes(),
            RoleDescriptor::Unknown(d) => &d.attributes,
        }
    }

    /// The concrete extension type, if this is one
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            RoleDescriptor::Extension(d) => d.as_any().downcast_ref(),
            RoleDescriptor::Unknown(_) => None,
        }
    }

    /// The unknown holder, if no handler was registered
    pub fn as_unknown(&self) -> Option<&UnknownRoleDescriptor> {
        match self {
            RoleDescriptor::Unknown(d) => Some(d),
            RoleDescriptor::Extension(_) => None,
        }
    }
}

impl ExtensionPoint for RoleDescriptor {
    const FAMILY: Family = Family::RoleDescriptor;
    const NAMESPACE: &'static str = SAML_METADATA_NAMESPACE;
    const LOCAL_NAME: &'static str = "RoleDescriptor";

    fn lookup<'r>(
        registry: &'r ExtensionRegistry,
        type_name: &QName,
        xsi_type: &str,
    ) -> Option<&'r Handler> {
        lookup_by_element(registry, type_name, xsi_type)
    }

    fn from_handler(
        handler: &Handler,
        element: &Element,
        registry: &ExtensionRegistry,
    ) -> Option<Result<Self>> {
        match handler {
            Handler::RoleDescriptor(decode) => {
                Some(decode(element, registry).map(RoleDescriptor::Extension))
            }
            _ => None,
        }
    }

    fn unknown(
        raw: RawChunk,
        xsi_type: String,
        type_name: QName,
        element: &Element,
    ) -> Result<Self> {
        Ok(RoleDescriptor::Unknown(UnknownRoleDescriptor {
            raw,
            xsi_type,
            type_name,
            attributes: RoleDescriptorAttributes::from_element(element)?,
        }))
    }
}

impl SamlElement for RoleDescriptor {
    const NAMESPACE: &'static str = SAML_METADATA_NAMESPACE;
    const PREFIX: &'static str = SAML_METADATA_PREFIX;
    const LOCAL_NAME: &'static str = "RoleDescriptor";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        dispatch::decode(element, registry)
    }

    fn to_xml(&self) -> Result<Element> {
        match self {
            RoleDescriptor::Extension(d) => d.to_xml(),
            RoleDescriptor::Unknown(d) => Ok(d.raw.to_xml()),
        }
    }
}
