//! `saml:Subject` and subject confirmation

use chrono::{DateTime, Utc};

use crate::assertion::Identifier;
use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{format_instant, optional_attribute, optional_instant, required_attribute};
use crate::object::SamlElement;
use crate::registry::ExtensionRegistry;
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

/// `saml:SubjectConfirmationData`
#[derive(Debug, Clone, Default)]
pub struct SubjectConfirmationData {
    not_before: Option<DateTime<Utc>>,
    not_on_or_after: Option<DateTime<Utc>>,
    recipient: Option<String>,
    in_response_to: Option<String>,
    address: Option<String>,
    text: Option<String>,
    content: Vec<RawChunk>,
}

impl SubjectConfirmationData {
    /// Empty confirmation data
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `NotBefore`
    pub fn with_not_before(mut self, instant: DateTime<Utc>) -> Self {
        self.not_before = Some(instant);
        self
    }

    /// Set `NotOnOrAfter`
    pub fn with_not_on_or_after(mut self, instant: DateTime<Utc>) -> Self {
        self.not_on_or_after = Some(instant);
        self
    }

    /// Set `Recipient`
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Set `InResponseTo`
    pub fn with_in_response_to(mut self, id: impl Into<String>) -> Self {
        self.in_response_to = Some(id.into());
        self
    }

    /// Set `Address`
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// `NotBefore`
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// `NotOnOrAfter`
    pub fn not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.not_on_or_after
    }

    /// `Recipient`
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    /// `InResponseTo`
    pub fn in_response_to(&self) -> Option<&str> {
        self.in_response_to.as_deref()
    }

    /// `Address`
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Set character content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Character content, if any besides whitespace
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Child elements such as `ds:KeyInfo`, kept verbatim
    pub fn content(&self) -> &[RawChunk] {
        &self.content
    }
}

impl SamlElement for SubjectConfirmationData {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "SubjectConfirmationData";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            not_before: optional_instant(element, "NotBefore")?,
            not_on_or_after: optional_instant(element, "NotOnOrAfter")?,
            recipient: optional_attribute(element, "Recipient"),
            in_response_to: optional_attribute(element, "InResponseTo"),
            address: optional_attribute(element, "Address"),
            text: element.text(),
            content: element.children().map(RawChunk::capture).collect(),
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_optional_attribute("NotBefore", self.not_before.as_ref().map(format_instant));
        element.set_optional_attribute(
            "NotOnOrAfter",
            self.not_on_or_after.as_ref().map(format_instant),
        );
        element.set_optional_attribute("Recipient", self.recipient.as_deref());
        element.set_optional_attribute("InResponseTo", self.in_response_to.as_deref());
        element.set_optional_attribute("Address", self.address.as_deref());
        if let Some(text) = &self.text {
            element.set_text(text.clone());
        }
        for chunk in &self.content {
            chunk.append_to(&mut element);
        }
        Ok(element)
    }
}

/// `saml:SubjectConfirmation`
#[derive(Debug, Clone)]
pub struct SubjectConfirmation {
    method: String,
    identifier: Option<Identifier>,
    data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Confirmation by `method`, e.g. [`confirmation_method::BEARER`](crate::assertion::confirmation_method::BEARER)
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            identifier: None,
            data: None,
        }
    }

    /// Set the identifier of the confirming entity
    pub fn with_identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set the confirmation data
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.data = Some(data);
        self
    }

    /// `Method`
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Identifier of the confirming entity
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// `SubjectConfirmationData`
    pub fn data(&self) -> Option<&SubjectConfirmationData> {
        self.data.as_ref()
    }
}

impl SamlElement for SubjectConfirmation {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "SubjectConfirmation";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            method: required_attribute(element, "Method")?.to_string(),
            identifier: Identifier::decode_optional(element, registry)?,
            data: SubjectConfirmationData::decode_optional(element, registry)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("Method", self.method.clone());
        if let Some(identifier) = &self.identifier {
            identifier.append_to(&mut element)?;
        }
        if let Some(data) = &self.data {
            data.append_to(&mut element)?;
        }
        Ok(element)
    }
}

/// `saml:Subject`
#[derive(Debug, Clone)]
pub struct Subject {
    identifier: Option<Identifier>,
    confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Subject with an identifier, confirmations or both
    pub fn new(
        identifier: Option<Identifier>,
        confirmations: Vec<SubjectConfirmation>,
    ) -> Result<Self> {
        if identifier.is_none() && confirmations.is_empty() {
            return Err(Error::MissingElement(
                "Missing identifier or SubjectConfirmation in saml:Subject".to_string(),
            ));
        }
        Ok(Self {
            identifier,
            confirmations,
        })
    }

    /// Subject identified by `identifier` alone
    pub fn identified_by(identifier: impl Into<Identifier>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            confirmations: Vec::new(),
        }
    }

    /// Add a confirmation
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.confirmations.push(confirmation);
        self
    }

    /// The subject's identifier
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// Confirmations in document order
    pub fn confirmations(&self) -> &[SubjectConfirmation] {
        &self.confirmations
    }
}

impl SamlElement for Subject {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Subject";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Self::new(
            Identifier::decode_optional(element, registry)?,
            SubjectConfirmation::decode_all(element, registry)?,
        )
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        if let Some(identifier) = &self.identifier {
            identifier.append_to(&mut element)?;
        }
        for confirmation in &self.confirmations {
            confirmation.append_to(&mut element)?;
        }
        Ok(element)
    }
}
