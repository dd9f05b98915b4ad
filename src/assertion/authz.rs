//! `saml:AuthzDecisionStatement`, `saml:Action` and `saml:Evidence`

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::assertion::Assertion;
use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result, SchemaViolation};
use crate::helpers::{non_empty_text, required_attribute};
use crate::object::SamlElement;
use crate::registry::ExtensionRegistry;
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

/// Result of an authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    /// The action is permitted
    Permit,
    /// The action is denied
    Deny,
    /// No decision could be made
    Indeterminate,
}

impl Decision {
    /// Lexical form
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::Indeterminate => "Indeterminate",
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Permit" => Ok(Decision::Permit),
            "Deny" => Ok(Decision::Deny),
            "Indeterminate" => Ok(Decision::Indeterminate),
            other => Err(Error::SchemaViolation(
                SchemaViolation::new(format!("Unknown value '{}' for Decision attribute", other))
                    .with_value(other),
            )),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `saml:Action`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    namespace: String,
    value: String,
}

impl Action {
    /// Action `value` interpreted in `namespace`
    pub fn new(namespace: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            value: value.into(),
        }
    }

    /// `Namespace`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The action
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl SamlElement for Action {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Action";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            namespace: required_attribute(element, "Namespace")?.to_string(),
            value: non_empty_text(element)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("Namespace", self.namespace.clone());
        element.set_text(self.value.clone());
        Ok(element)
    }
}

/// A member of `saml:Evidence`
#[derive(Debug, Clone)]
pub enum EvidenceItem {
    /// `saml:AssertionIDRef`
    AssertionIdRef(String),
    /// `saml:AssertionURIRef`
    AssertionUriRef(String),
    /// `saml:Assertion`
    Assertion(Box<Assertion>),
    /// `saml:EncryptedAssertion`, carried without decryption
    EncryptedAssertion(RawChunk),
}

/// `saml:Evidence`
#[derive(Debug, Clone)]
pub struct Evidence {
    items: Vec<EvidenceItem>,
}

impl Evidence {
    /// Evidence with at least one item
    pub fn new(items: Vec<EvidenceItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::MissingElement(
                "Missing assertion or assertion reference in saml:Evidence".to_string(),
            ));
        }
        Ok(Self { items })
    }

    /// Members in document order
    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }
}

impl SamlElement for Evidence {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Evidence";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;

        let mut items = Vec::new();
        for child in element.children() {
            if child.namespace() != Some(SAML_ASSERTION_NAMESPACE) {
                continue;
            }
            let item = match child.local_name() {
                "AssertionIDRef" => EvidenceItem::AssertionIdRef(non_empty_text(child)?),
                "AssertionURIRef" => EvidenceItem::AssertionUriRef(non_empty_text(child)?),
                "Assertion" => {
                    EvidenceItem::Assertion(Box::new(Assertion::decode(child, registry)?))
                }
                "EncryptedAssertion" => EvidenceItem::EncryptedAssertion(RawChunk::capture(child)),
                _ => continue,
            };
            items.push(item);
        }
        Self::new(items)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        for item in &self.items {
            match item {
                EvidenceItem::AssertionIdRef(id) => {
                    let mut child = Element::qualified(
                        SAML_ASSERTION_NAMESPACE,
                        SAML_ASSERTION_PREFIX,
                        "AssertionIDRef",
                    );
                    child.set_text(id.clone());
                    element.add_child(child);
                }
                EvidenceItem::AssertionUriRef(uri) => {
                    let mut child = Element::qualified(
                        SAML_ASSERTION_NAMESPACE,
                        SAML_ASSERTION_PREFIX,
                        "AssertionURIRef",
                    );
                    child.set_text(uri.clone());
                    element.add_child(child);
                }
                EvidenceItem::Assertion(assertion) => assertion.append_to(&mut element)?,
                EvidenceItem::EncryptedAssertion(chunk) => chunk.append_to(&mut element),
            }
        }
        Ok(element)
    }
}

/// `saml:AuthzDecisionStatement`
#[derive(Debug, Clone)]
pub struct AuthzDecisionStatement {
    resource: String,
    decision: Decision,
    actions: Vec<Action>,
    evidence: Option<Evidence>,
}

impl AuthzDecisionStatement {
    /// Decision on `actions` against `resource`; at least one action is required
    pub fn new(
        resource: impl Into<String>,
        decision: Decision,
        actions: Vec<Action>,
        evidence: Option<Evidence>,
    ) -> Result<Self> {
        if actions.is_empty() {
            return Err(Error::MissingElement(
                "Missing Action in saml:AuthzDecisionStatement".to_string(),
            ));
        }
        Ok(Self {
            resource: resource.into(),
            decision,
            actions,
            evidence,
        })
    }

    /// `Resource`
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// `Decision`
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Actions in document order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// `Evidence`
    pub fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }
}

impl SamlElement for AuthzDecisionStatement {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AuthzDecisionStatement";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        let resource = required_attribute(element, "Resource")?;
        let decision: Decision = required_attribute(element, "Decision")?
            .parse()
            .map_err(|err| match err {
                Error::SchemaViolation(v) => {
                    Error::SchemaViolation(v.with_element(element.prefixed_name()))
                }
                other => other,
            })?;

        Self::new(
            resource,
            decision,
            Action::decode_all(element, registry)?,
            Evidence::decode_optional(element, registry)?,
        )
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("Resource", self.resource.clone());
        element.set_attribute("Decision", self.decision.as_str());
        for action in &self.actions {
            action.append_to(&mut element)?;
        }
        if let Some(evidence) = &self.evidence {
            evidence.append_to(&mut element)?;
        }
        Ok(element)
    }
}
