//! The `Statement` extension point

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::assertion::{AttributeStatement, AuthnStatement, AuthzDecisionStatement};
use crate::chunk::RawChunk;
use crate::dispatch::{self, lookup_by_type, ExtensionPoint};
use crate::documents::Element;
use crate::error::Result;
use crate::namespaces::{QName, XsiType};
use crate::object::SamlElement;
use crate::registry::{ExtensionRegistry, Family, Handler};
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX};

/// A `Statement` type supplied by the hosting application
pub trait CustomStatement: fmt::Debug + Send + Sync {
    /// The `xsi:type` this statement is written with
    fn xsi_type(&self) -> &XsiType;

    /// Encode as a `saml:Statement` element
    fn to_xml(&self) -> Result<Element>;

    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// A `Statement` whose `xsi:type` has no registered handler
#[derive(Debug, Clone)]
pub struct UnknownStatement {
    raw: RawChunk,
    xsi_type: String,
    type_name: QName,
}

impl UnknownStatement {
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

/// A statement carried by an assertion
#[derive(Debug, Clone)]
pub enum Statement {
    /// `saml:AuthnStatement`
    Authn(AuthnStatement),
    /// `saml:AttributeStatement`
    Attribute(AttributeStatement),
    /// `saml:AuthzDecisionStatement`
    AuthzDecision(AuthzDecisionStatement),
    /// `saml:Statement` decoded by a registered handler
    Extension(Arc<dyn CustomStatement>),
    /// `saml:Statement` kept verbatim
    Unknown(UnknownStatement),
}

impl Statement {
    /// Wrap an application-defined statement
    pub fn extension(statement: impl CustomStatement + 'static) -> Self {
        Statement::Extension(Arc::new(statement))
    }

    /// Whether this is one of the statements defined by SAML core
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            Statement::Authn(_) | Statement::Attribute(_) | Statement::AuthzDecision(_)
        )
    }

    /// Lexical `xsi:type` value, for `saml:Statement` members
    pub fn xsi_type(&self) -> Option<String> {
        match self {
            Statement::Extension(s) => Some(s.xsi_type().attribute_value()),
            Statement::Unknown(s) => Some(s.xsi_type.clone()),
            _ => None,
        }
    }

    /// The concrete extension type, if this is one
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Statement::Extension(s) => s.as_any().downcast_ref(),
            _ => None,
        }
    }

    /// The unknown holder, if no handler was registered
    pub fn as_unknown(&self) -> Option<&UnknownStatement> {
        match self {
            Statement::Unknown(s) => Some(s),
            _ => None,
        }
    }

    /// Whether `element` is one of the statement elements
    pub(crate) fn is_statement_element(element: &Element) -> bool {
        element.namespace() == Some(SAML_ASSERTION_NAMESPACE)
            && matches!(
                element.local_name(),
                "Statement" | "AuthnStatement" | "AttributeStatement" | "AuthzDecisionStatement"
            )
    }
}

impl ExtensionPoint for Statement {
    const FAMILY: Family = Family::Statement;
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const LOCAL_NAME: &'static str = "Statement";

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
            Handler::Statement(decode) => Some(decode(element, registry).map(Statement::Extension)),
            _ => None,
        }
    }

    fn unknown(
        raw: RawChunk,
        xsi_type: String,
        type_name: QName,
        _element: &Element,
    ) -> Result<Self> {
        Ok(Statement::Unknown(UnknownStatement {
            raw,
            xsi_type,
            type_name,
        }))
    }
}

impl SamlElement for Statement {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Statement";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        if element.namespace() == Some(SAML_ASSERTION_NAMESPACE) {
            match element.local_name() {
                "AuthnStatement" => {
                    return AuthnStatement::decode(element, registry).map(Statement::Authn)
                }
                "AttributeStatement" => {
                    return AttributeStatement::decode(element, registry).map(Statement::Attribute)
                }
                "AuthzDecisionStatement" => {
                    return AuthzDecisionStatement::decode(element, registry)
                        .map(Statement::AuthzDecision)
                }
                _ => {}
            }
        }
        dispatch::decode(element, registry)
    }

    fn to_xml(&self) -> Result<Element> {
        match self {
            Statement::Authn(s) => s.to_xml(),
            Statement::Attribute(s) => s.to_xml(),
            Statement::AuthzDecision(s) => s.to_xml(),
            Statement::Extension(s) => s.to_xml(),
            Statement::Unknown(s) => Ok(s.raw.to_xml()),
        }
    }
}

impl From<AuthnStatement> for Statement {
    fn from(s: AuthnStatement) -> Self {
        Statement::Authn(s)
    }
}

impl From<AttributeStatement> for Statement {
    fn from(s: AttributeStatement) -> Self {
        Statement::Attribute(s)
    }
}

impl From<AuthzDecisionStatement> for Statement {
    fn from(s: AuthzDecisionStatement) -> Self {
        Statement::AuthzDecision(s)
    }
}
