//! `saml:Conditions` and the `Condition` extension point

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::chunk::RawChunk;
use crate::dispatch::{self, lookup_by_element, ExtensionPoint};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{format_instant, non_empty_text, optional_count, optional_instant};
use crate::namespaces::{QName, XsiType};
use crate::object::SamlElement;
use crate::registry::{ExtensionRegistry, Family, Handler};
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

/// Decode every `saml:Audience` child of `parent`
fn decode_audiences(parent: &Element) -> Result<Vec<String>> {
    parent
        .children_ns(SAML_ASSERTION_NAMESPACE, "Audience")
        .map(non_empty_text)
        .collect()
}

fn append_audiences(parent: &mut Element, audiences: &[String]) {
    for audience in audiences {
        let mut element =
            Element::qualified(SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX, "Audience");
        element.set_text(audience.clone());
        parent.add_child(element);
    }
}

/// `saml:AudienceRestriction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceRestriction {
    audiences: Vec<String>,
}

impl AudienceRestriction {
    /// Restriction to the given audiences; at least one is required
    pub fn new(audiences: Vec<String>) -> Result<Self> {
        if audiences.is_empty() {
            return Err(Error::MissingElement(
                "Missing Audience in saml:AudienceRestriction".to_string(),
            ));
        }
        Ok(Self { audiences })
    }

    /// Audience URIs
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }
}

impl SamlElement for AudienceRestriction {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AudienceRestriction";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Self::new(decode_audiences(element)?)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        append_audiences(&mut element, &self.audiences);
        Ok(element)
    }
}

/// `saml:OneTimeUse`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneTimeUse;

impl SamlElement for OneTimeUse {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "OneTimeUse";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(OneTimeUse)
    }

    fn to_xml(&self) -> Result<Element> {
        Ok(Self::new_element())
    }
}

/// `saml:ProxyRestriction`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRestriction {
    count: Option<u32>,
    audiences: Vec<String>,
}

impl ProxyRestriction {
    /// Proxy restriction with an optional maximum number of indirections
    pub fn new(count: Option<u32>, audiences: Vec<String>) -> Self {
        Self { count, audiences }
    }

    /// Maximum number of indirections
    pub fn count(&self) -> Option<u32> {
        self.count
    }

    /// Audiences allowed for new assertions
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }
}

impl SamlElement for ProxyRestriction {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "ProxyRestriction";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            count: optional_count(element, "Count")?,
            audiences: decode_audiences(element)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_optional_attribute("Count", self.count.map(|c| c.to_string()));
        append_audiences(&mut element, &self.audiences);
        Ok(element)
    }
}

/// A `Condition` type supplied by the hosting application
pub trait CustomCondition: fmt::Debug + Send + Sync {
    /// The `xsi:type` this condition is written with
    fn xsi_type(&self) -> &XsiType;

    /// Encode as a `saml:Condition` element
    fn to_xml(&self) -> Result<Element>;

    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// A `Condition` whose `xsi:type` has no registered handler
#[derive(Debug, Clone)]
pub struct UnknownCondition {
    raw: RawChunk,
    xsi_type: String,
    type_name: QName,
}

impl UnknownCondition {
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
}

/// A member of `saml:Conditions`
#[derive(Debug, Clone)]
pub enum Condition {
    /// `saml:AudienceRestriction`
    AudienceRestriction(AudienceRestriction),
    /// `saml:OneTimeUse`
    OneTimeUse(OneTimeUse),
    /// `saml:ProxyRestriction`
    ProxyRestriction(ProxyRestriction),
    /// `saml:Condition` decoded by a registered handler
    Extension(Arc<dyn CustomCondition>),
    /// `saml:Condition` kept verbatim
    Unknown(UnknownCondition),
}

impl Condition {
    /// Wrap an application-defined condition
    pub fn extension(condition: impl CustomCondition + 'static) -> Self {
        Condition::Extension(Arc::new(condition))
    }

    /// Lexical `xsi:type` value, for `saml:Condition` members
    pub fn xsi_type(&self) -> Option<String> {
        match self {
            Condition::Extension(c) => Some(c.xsi_type().attribute_value()),
            Condition::Unknown(c) => Some(c.xsi_type.clone()),
            _ => None,
        }
    }

    /// The concrete extension type, if this is one
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Condition::Extension(c) => c.as_any().downcast_ref(),
            _ => None,
        }
    }

    /// The unknown holder, if no handler was registered
    pub fn as_unknown(&self) -> Option<&UnknownCondition> {
        match self {
            Condition::Unknown(c) => Some(c),
            _ => None,
        }
    }
}

impl ExtensionPoint for Condition {
    const FAMILY: Family = Family::Condition;
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const LOCAL_NAME: &'static str = "Condition";

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
            Handler::Condition(decode) => Some(decode(element, registry).map(Condition::Extension)),
            _ => None,
        }
    }

    fn unknown(
        raw: RawChunk,
        xsi_type: String,
        type_name: QName,
        _element: &Element,
    ) -> Result<Self> {
        Ok(Condition::Unknown(UnknownCondition {
            raw,
            xsi_type,
            type_name,
        }))
    }
}

impl SamlElement for Condition {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Condition";

    /// Built-in conditions are recognised by element name, everything else
    /// goes through `xsi:type` dispatch on `saml:Condition`.
    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        if element.namespace() == Some(SAML_ASSERTION_NAMESPACE) {
            match element.local_name() {
                "AudienceRestriction" => {
                    return AudienceRestriction::decode(element, registry)
                        .map(Condition::AudienceRestriction)
                }
                "OneTimeUse" => return OneTimeUse::decode(element, registry).map(Condition::OneTimeUse),
                "ProxyRestriction" => {
                    return ProxyRestriction::decode(element, registry)
                        .map(Condition::ProxyRestriction)
                }
                _ => {}
            }
        }
        dispatch::decode(element, registry)
    }

    fn to_xml(&self) -> Result<Element> {
        match self {
            Condition::AudienceRestriction(c) => c.to_xml(),
            Condition::OneTimeUse(c) => c.to_xml(),
            Condition::ProxyRestriction(c) => c.to_xml(),
            Condition::Extension(c) => c.to_xml(),
            Condition::Unknown(c) => Ok(c.raw.to_xml()),
        }
    }
}

impl From<AudienceRestriction> for Condition {
    fn from(c: AudienceRestriction) -> Self {
        Condition::AudienceRestriction(c)
    }
}

impl From<OneTimeUse> for Condition {
    fn from(c: OneTimeUse) -> Self {
        Condition::OneTimeUse(c)
    }
}

impl From<ProxyRestriction> for Condition {
    fn from(c: ProxyRestriction) -> Self {
        Condition::ProxyRestriction(c)
    }
}

/// `saml:Conditions`
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    not_before: Option<DateTime<Utc>>,
    not_on_or_after: Option<DateTime<Utc>>,
    conditions: Vec<Condition>,
}

impl Conditions {
    /// Validity window plus conditions
    ///
    /// At most one `OneTimeUse` and one `ProxyRestriction` are allowed.
    pub fn new(
        not_before: Option<DateTime<Utc>>,
        not_on_or_after: Option<DateTime<Utc>>,
        conditions: Vec<Condition>,
    ) -> Result<Self> {
        let one_time = conditions
            .iter()
            .filter(|c| matches!(c, Condition::OneTimeUse(_)))
            .count();
        if one_time > 1 {
            return Err(Error::TooManyElements(
                "More than one OneTimeUse in saml:Conditions".to_string(),
            ));
        }
        let proxy = conditions
            .iter()
            .filter(|c| matches!(c, Condition::ProxyRestriction(_)))
            .count();
        if proxy > 1 {
            return Err(Error::TooManyElements(
                "More than one ProxyRestriction in saml:Conditions".to_string(),
            ));
        }

        Ok(Self {
            not_before,
            not_on_or_after,
            conditions,
        })
    }

    /// `NotBefore`
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// `NotOnOrAfter`
    pub fn not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.not_on_or_after
    }

    /// Conditions in document order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// All audience restrictions
    pub fn audience_restrictions(&self) -> impl Iterator<Item = &AudienceRestriction> {
        self.conditions.iter().filter_map(|c| match c {
            Condition::AudienceRestriction(r) => Some(r),
            _ => None,
        })
    }

    /// Whether a `OneTimeUse` condition is present
    pub fn is_one_time_use(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Condition::OneTimeUse(_)))
    }

    /// The proxy restriction, if any
    pub fn proxy_restriction(&self) -> Option<&ProxyRestriction> {
        self.conditions.iter().find_map(|c| match c {
            Condition::ProxyRestriction(r) => Some(r),
            _ => None,
        })
    }
}

impl SamlElement for Conditions {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Conditions";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        let conditions = element
            .children()
            .map(|child| Condition::decode(child, registry))
            .collect::<Result<Vec<_>>>()?;

        Self::new(
            optional_instant(element, "NotBefore")?,
            optional_instant(element, "NotOnOrAfter")?,
            conditions,
        )
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_optional_attribute("NotBefore", self.not_before.as_ref().map(format_instant));
        element.set_optional_attribute(
            "NotOnOrAfter",
            self.not_on_or_after.as_ref().map(format_instant),
        );
        for condition in &self.conditions {
            condition.append_to(&mut element)?;
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use chrono::TimeZone;

    fn element(xml: &str) -> Element {
        Document::from_string(xml).unwrap().into_root().unwrap()
    }

    #[test]
    fn test_decode_builtin_conditions() {
        let root = element(
            r#"<saml:Conditions xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                NotBefore="2024-01-01T00:00:00Z" NotOnOrAfter="2024-01-01T00:05:00.500Z">
                <saml:AudienceRestriction>
                    <saml:Audience>https://sp.example.org</saml:Audience>
                </saml:AudienceRestriction>
                <saml:OneTimeUse/>
                <saml:ProxyRestriction Count="2"/>
            </saml:Conditions>"#,
        );
        let conditions = Conditions::from_xml(&root).unwrap();

        assert_eq!(
            conditions.not_before(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            conditions.not_on_or_after(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap())
        );
        assert_eq!(conditions.conditions().len(), 3);
        assert!(conditions.is_one_time_use());
        assert_eq!(conditions.proxy_restriction().and_then(|p| p.count()), Some(2));

        let audiences: Vec<_> = conditions
            .audience_restrictions()
            .flat_map(|r| r.audiences().iter().cloned())
            .collect();
        assert_eq!(audiences, vec!["https://sp.example.org".to_string()]);
    }

    #[test]
    fn test_audience_restriction_requires_audience() {
        let root = element(
            r#"<saml:AudienceRestriction xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"/>"#,
        );
        assert!(matches!(
            AudienceRestriction::from_xml(&root),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_second_one_time_use_is_rejected() {
        let root = element(
            r#"<saml:Conditions xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">
                <saml:OneTimeUse/>
                <saml:OneTimeUse/>
            </saml:Conditions>"#,
        );
        assert!(matches!(Conditions::from_xml(&root), Err(Error::TooManyElements(_))));
    }

    #[test]
    fn test_bad_proxy_count_is_rejected() {
        let root = element(
            r#"<saml:ProxyRestriction xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" Count="-1"/>"#,
        );
        assert!(matches!(
            ProxyRestriction::from_xml(&root),
            Err(Error::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_condition_without_xsi_type_is_rejected() {
        let root = element(
            r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"/>"#,
        );
        let err = Condition::from_xml(&root).unwrap_err();
        assert!(err.to_string().contains("xsi:type"));
    }

    #[test]
    fn test_unknown_condition_roundtrips() {
        let root = element(
            r#"<saml:Condition xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                xmlns:geo="urn:example:geo" xsi:type="geo:Region">
                <geo:Country>NL</geo:Country>
            </saml:Condition>"#,
        );
        let condition = Condition::from_xml(&root).unwrap();
        let unknown = condition.as_unknown().unwrap();
        assert_eq!(unknown.type_name(), &QName::namespaced("urn:example:geo", "Region"));
        assert_eq!(condition.xsi_type().as_deref(), Some("geo:Region"));
        assert!(condition.to_xml().unwrap().xml_eq(&root));
    }
}
