//! Application-defined extension types used by the integration tests.
//!
//! One custom type per extension family, each with a decoder that can be
//! registered in an `ExtensionRegistry`.

#![allow(dead_code)]

use std::any::Any;

use samlobjects::dispatch::extension_element;
use samlobjects::documents::Element;
use samlobjects::helpers::non_empty_text;
use samlobjects::{
    CustomBaseId, CustomCondition, CustomRoleDescriptor, CustomStatement, Error, ExtensionRegistry,
    Handler, IdQualifiers, Result, RoleDescriptorAttributes, XsiType, SAML_ASSERTION_NAMESPACE,
    SAML_METADATA_NAMESPACE,
};

pub const SSP_NAMESPACE: &str = "urn:custom:ssp";
pub const GEO_NAMESPACE: &str = "urn:example:geo";
pub const CORP_NAMESPACE: &str = "urn:example:corp";
pub const FED_NAMESPACE: &str = "http://docs.oasis-open.org/wsfed/federation/200706";

fn xsi_type_of(element: &Element) -> Result<XsiType> {
    let value = element
        .xsi_type()
        .ok_or_else(|| Error::schema("Missing required xsi:type attribute"))?;
    Ok(XsiType::from_attribute(value, element))
}

// ============================================================================
// BaseID
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeId {
    xsi_type: XsiType,
    qualifiers: IdQualifiers,
    number: String,
}

impl EmployeeId {
    pub fn new(number: &str, qualifiers: IdQualifiers) -> Self {
        Self {
            xsi_type: XsiType::new("corp", CORP_NAMESPACE, "EmployeeID").expect("valid type name"),
            qualifiers,
            number: number.to_string(),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Ok(Self {
            xsi_type: xsi_type_of(element)?,
            qualifiers: IdQualifiers::from_element(element),
            number: non_empty_text(element)?,
        })
    }
}

impl CustomBaseId for EmployeeId {
    fn xsi_type(&self) -> &XsiType {
        &self.xsi_type
    }

    fn qualifiers(&self) -> &IdQualifiers {
        &self.qualifiers
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = extension_element(SAML_ASSERTION_NAMESPACE, "saml", "BaseID", &self.xsi_type);
        self.qualifiers.write_to(&mut element);
        element.set_text(self.number.clone());
        Ok(element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Condition
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRestriction {
    xsi_type: XsiType,
    countries: Vec<String>,
}

impl RegionRestriction {
    pub fn new(countries: &[&str]) -> Self {
        Self {
            xsi_type: XsiType::new("geo", GEO_NAMESPACE, "RegionRestriction").expect("valid type name"),
            countries: countries.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Ok(Self {
            xsi_type: xsi_type_of(element)?,
            countries: element
                .children_ns(GEO_NAMESPACE, "Country")
                .map(non_empty_text)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl CustomCondition for RegionRestriction {
    fn xsi_type(&self) -> &XsiType {
        &self.xsi_type
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element =
            extension_element(SAML_ASSERTION_NAMESPACE, "saml", "Condition", &self.xsi_type);
        for country in &self.countries {
            let mut child = Element::qualified(GEO_NAMESPACE, "geo", "Country");
            child.set_text(country.clone());
            element.add_child(child);
        }
        Ok(element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Statement
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyStatement {
    xsi_type: XsiType,
    tier: String,
}

impl LoyaltyStatement {
    pub fn new(tier: &str) -> Self {
        Self {
            xsi_type: XsiType::new("ssp", SSP_NAMESPACE, "LoyaltyStatement").expect("valid type name"),
            tier: tier.to_string(),
        }
    }

    pub fn tier(&self) -> &str {
        &self.tier
    }

    pub fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        let tier = element
            .children_ns(SSP_NAMESPACE, "Tier")
            .next()
            .ok_or_else(|| Error::MissingElement("Missing Tier in saml:Statement".to_string()))?;
        Ok(Self {
            xsi_type: xsi_type_of(element)?,
            tier: non_empty_text(tier)?,
        })
    }
}

impl CustomStatement for LoyaltyStatement {
    fn xsi_type(&self) -> &XsiType {
        &self.xsi_type
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element =
            extension_element(SAML_ASSERTION_NAMESPACE, "saml", "Statement", &self.xsi_type);
        let mut tier = Element::qualified(SSP_NAMESPACE, "ssp", "Tier");
        tier.set_text(self.tier.clone());
        element.add_child(tier);
        Ok(element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// RoleDescriptor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityTokenService {
    xsi_type: XsiType,
    attributes: RoleDescriptorAttributes,
    endpoints: Vec<String>,
}

impl SecurityTokenService {
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Ok(Self {
            xsi_type: xsi_type_of(element)?,
            attributes: RoleDescriptorAttributes::from_element(element)?,
            endpoints: element
                .children_ns(FED_NAMESPACE, "PassiveRequestorEndpoint")
                .map(non_empty_text)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl CustomRoleDescriptor for SecurityTokenService {
    fn xsi_type(&self) -> &XsiType {
        &self.xsi_type
    }

    fn attributes(&self) -> &RoleDescriptorAttributes {
        &self.attributes
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element =
            extension_element(SAML_METADATA_NAMESPACE, "md", "RoleDescriptor", &self.xsi_type);
        self.attributes.write_to(&mut element);
        for endpoint in &self.endpoints {
            let mut child = Element::qualified(FED_NAMESPACE, "fed", "PassiveRequestorEndpoint");
            child.set_text(endpoint.clone());
            element.add_child(child);
        }
        Ok(element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A registry with every test extension registered in its family's key shape
pub fn registry() -> ExtensionRegistry {
    ExtensionRegistry::new()
        .with_type(
            format!("{}:EmployeeID", CORP_NAMESPACE),
            Handler::base_id(EmployeeId::decode),
        )
        .with_element(
            Some(GEO_NAMESPACE),
            "RegionRestriction",
            Handler::condition(RegionRestriction::decode),
        )
        .with_type(
            format!("{}:LoyaltyStatement", SSP_NAMESPACE),
            Handler::statement(LoyaltyStatement::decode),
        )
        .with_element(
            Some(FED_NAMESPACE),
            "SecurityTokenServiceType",
            Handler::role_descriptor(SecurityTokenService::decode),
        )
}

pub fn parse(xml: &str) -> Element {
    samlobjects::Document::from_string(xml)
        .expect("test XML is well-formed")
        .into_root()
        .expect("test XML has a root")
}

pub fn fixture(name: &str) -> std::path::PathBuf {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}
