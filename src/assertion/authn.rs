//! `saml:AuthnStatement` and its children

use chrono::{DateTime, Utc};

use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{
    at_most_one, format_instant, non_empty_text, optional_attribute, optional_instant,
    required_instant,
};
use crate::object::SamlElement;
use crate::registry::ExtensionRegistry;
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

fn text_element(local_name: &str, text: &str) -> Element {
    let mut element = Element::qualified(SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX, local_name);
    element.set_text(text);
    element
}

/// `saml:SubjectLocality`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectLocality {
    address: Option<String>,
    dns_name: Option<String>,
}

impl SubjectLocality {
    /// Locality with an optional network address and DNS name
    pub fn new(address: Option<String>, dns_name: Option<String>) -> Self {
        Self { address, dns_name }
    }

    /// `Address`
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// `DNSName`
    pub fn dns_name(&self) -> Option<&str> {
        self.dns_name.as_deref()
    }
}

impl SamlElement for SubjectLocality {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "SubjectLocality";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            address: optional_attribute(element, "Address"),
            dns_name: optional_attribute(element, "DNSName"),
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_optional_attribute("Address", self.address.as_deref());
        element.set_optional_attribute("DNSName", self.dns_name.as_deref());
        Ok(element)
    }
}

/// The authentication context declaration, inline or by reference
#[derive(Debug, Clone)]
pub enum AuthnContextDecl {
    /// `saml:AuthnContextDecl`, carried verbatim
    Decl(RawChunk),
    /// `saml:AuthnContextDeclRef`
    DeclRef(String),
}

/// `saml:AuthnContext`
#[derive(Debug, Clone)]
pub struct AuthnContext {
    class_ref: Option<String>,
    decl: Option<AuthnContextDecl>,
    authenticating_authorities: Vec<String>,
}

impl AuthnContext {
    /// Context with a class reference and optional declaration
    ///
    /// At least one of the class reference and the declaration is required.
    pub fn new(
        class_ref: Option<String>,
        decl: Option<AuthnContextDecl>,
        authenticating_authorities: Vec<String>,
    ) -> Result<Self> {
        if class_ref.is_none() && decl.is_none() {
            return Err(Error::MissingElement(
                "Missing AuthnContextClassRef, AuthnContextDecl or AuthnContextDeclRef in saml:AuthnContext"
                    .to_string(),
            ));
        }
        Ok(Self {
            class_ref,
            decl,
            authenticating_authorities,
        })
    }

    /// Context identified only by its class
    pub fn from_class_ref(class_ref: impl Into<String>) -> Self {
        Self {
            class_ref: Some(class_ref.into()),
            decl: None,
            authenticating_authorities: Vec::new(),
        }
    }

    /// `AuthnContextClassRef`
    pub fn class_ref(&self) -> Option<&str> {
        self.class_ref.as_deref()
    }

    /// `AuthnContextDecl` or `AuthnContextDeclRef`
    pub fn decl(&self) -> Option<&AuthnContextDecl> {
        self.decl.as_ref()
    }

    /// `AuthenticatingAuthority` entries
    pub fn authenticating_authorities(&self) -> &[String] {
        &self.authenticating_authorities
    }
}

impl SamlElement for AuthnContext {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AuthnContext";

    fn decode(element: &Element, _registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;

        let class_ref = at_most_one(element, SAML_ASSERTION_NAMESPACE, "AuthnContextClassRef")?
            .map(non_empty_text)
            .transpose()?;
        let decl = at_most_one(element, SAML_ASSERTION_NAMESPACE, "AuthnContextDecl")?;
        let decl_ref = at_most_one(element, SAML_ASSERTION_NAMESPACE, "AuthnContextDeclRef")?;

        let decl = match (decl, decl_ref) {
            (Some(_), Some(_)) => {
                return Err(Error::TooManyElements(format!(
                    "Both AuthnContextDecl and AuthnContextDeclRef in {}",
                    element.prefixed_name()
                )))
            }
            (Some(decl), None) => Some(AuthnContextDecl::Decl(RawChunk::capture(decl))),
            (None, Some(decl_ref)) => Some(AuthnContextDecl::DeclRef(non_empty_text(decl_ref)?)),
            (None, None) => None,
        };

        let authorities = element
            .children_ns(SAML_ASSERTION_NAMESPACE, "AuthenticatingAuthority")
            .map(non_empty_text)
            .collect::<Result<Vec<_>>>()?;

        Self::new(class_ref, decl, authorities)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        if let Some(class_ref) = &self.class_ref {
            element.add_child(text_element("AuthnContextClassRef", class_ref));
        }
        match &self.decl {
            Some(AuthnContextDecl::Decl(chunk)) => chunk.append_to(&mut element),
            Some(AuthnContextDecl::DeclRef(decl_ref)) => {
                element.add_child(text_element("AuthnContextDeclRef", decl_ref))
            }
            None => {}
        }
        for authority in &self.authenticating_authorities {
            element.add_child(text_element("AuthenticatingAuthority", authority));
        }
        Ok(element)
    }
}

/// `saml:AuthnStatement`
#[derive(Debug, Clone)]
pub struct AuthnStatement {
    authn_instant: DateTime<Utc>,
    session_index: Option<String>,
    session_not_on_or_after: Option<DateTime<Utc>>,
    subject_locality: Option<SubjectLocality>,
    authn_context: AuthnContext,
}

impl AuthnStatement {
    /// Statement that the subject authenticated at `authn_instant`
    pub fn new(authn_instant: DateTime<Utc>, authn_context: AuthnContext) -> Self {
        Self {
            authn_instant,
            session_index: None,
            session_not_on_or_after: None,
            subject_locality: None,
            authn_context,
        }
    }

    /// Set `SessionIndex`
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_index = Some(index.into());
        self
    }

    /// Set `SessionNotOnOrAfter`
    pub fn with_session_not_on_or_after(mut self, instant: DateTime<Utc>) -> Self {
        self.session_not_on_or_after = Some(instant);
        self
    }

    /// Set the subject locality
    pub fn with_subject_locality(mut self, locality: SubjectLocality) -> Self {
        self.subject_locality = Some(locality);
        self
    }

    /// `AuthnInstant`, without sub-second precision
    pub fn authn_instant(&self) -> DateTime<Utc> {
        self.authn_instant
    }

    /// `SessionIndex`
    pub fn session_index(&self) -> Option<&str> {
        self.session_index.as_deref()
    }

    /// `SessionNotOnOrAfter`
    pub fn session_not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.session_not_on_or_after
    }

    /// `SubjectLocality`
    pub fn subject_locality(&self) -> Option<&SubjectLocality> {
        self.subject_locality.as_ref()
    }

    /// `AuthnContext`
    pub fn authn_context(&self) -> &AuthnContext {
        &self.authn_context
    }
}

impl SamlElement for AuthnStatement {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "AuthnStatement";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;
        Ok(Self {
            authn_instant: required_instant(element, "AuthnInstant")?,
            session_index: optional_attribute(element, "SessionIndex"),
            session_not_on_or_after: optional_instant(element, "SessionNotOnOrAfter")?,
            subject_locality: SubjectLocality::decode_optional(element, registry)?,
            authn_context: AuthnContext::decode_required(element, registry)?,
        })
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("AuthnInstant", format_instant(&self.authn_instant));
        element.set_optional_attribute(
            "SessionNotOnOrAfter",
            self.session_not_on_or_after.as_ref().map(format_instant),
        );
        element.set_optional_attribute("SessionIndex", self.session_index.as_deref());
        if let Some(locality) = &self.subject_locality {
            locality.append_to(&mut element)?;
        }
        self.authn_context.append_to(&mut element)?;
        Ok(element)
    }
}
