//! `saml:Assertion`

use chrono::{DateTime, Utc};

use crate::assertion::{Conditions, Issuer, Statement, Subject};
use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::helpers::{at_most_one, format_instant, required_attribute, required_instant};
use crate::object::SamlElement;
use crate::registry::ExtensionRegistry;
use crate::{SAML_ASSERTION_NAMESPACE, SAML_ASSERTION_PREFIX, XMLDSIG_NAMESPACE};

/// The only assertion version this crate understands
pub const SAML_VERSION: &str = "2.0";

/// `saml:Assertion`
///
/// The signature is carried as an opaque chunk and never verified.
#[derive(Debug, Clone)]
pub struct Assertion {
    id: String,
    issue_instant: DateTime<Utc>,
    issuer: Issuer,
    signature: Option<RawChunk>,
    subject: Option<Subject>,
    conditions: Option<Conditions>,
    advice: Option<RawChunk>,
    statements: Vec<Statement>,
}

impl Assertion {
    /// Build an assertion
    ///
    /// Either a subject or at least one statement must be present, and the
    /// SAML-defined statements require a subject.
    pub fn new(
        id: impl Into<String>,
        issue_instant: DateTime<Utc>,
        issuer: Issuer,
        subject: Option<Subject>,
        conditions: Option<Conditions>,
        statements: Vec<Statement>,
    ) -> Result<Self> {
        if subject.is_none() {
            if statements.is_empty() {
                return Err(Error::ProtocolViolation(
                    "Either a Subject or a statement must be present in saml:Assertion".to_string(),
                ));
            }
            if statements.iter().any(Statement::is_builtin) {
                return Err(Error::ProtocolViolation(
                    "saml:Assertion with an authentication, attribute or authorization statement must have a Subject"
                        .to_string(),
                ));
            }
        }

        Ok(Self {
            id: id.into(),
            issue_instant,
            issuer,
            signature: None,
            subject,
            conditions,
            advice: None,
            statements,
        })
    }

    /// Attach a `ds:Signature` element
    pub fn with_signature(mut self, signature: RawChunk) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Attach a `saml:Advice` element
    pub fn with_advice(mut self, advice: RawChunk) -> Self {
        self.advice = Some(advice);
        self
    }

    /// `ID`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `IssueInstant`
    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.issue_instant
    }

    /// `Issuer`
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The enveloped signature, as received
    pub fn signature(&self) -> Option<&RawChunk> {
        self.signature.as_ref()
    }

    /// `Subject`
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// `Conditions`
    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }

    /// `Advice`, as received
    pub fn advice(&self) -> Option<&RawChunk> {
        self.advice.as_ref()
    }

    /// Statements in document order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl SamlElement for Assertion {
    const NAMESPACE: &'static str = SAML_ASSERTION_NAMESPACE;
    const PREFIX: &'static str = SAML_ASSERTION_PREFIX;
    const LOCAL_NAME: &'static str = "Assertion";

    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        Self::check_element(element)?;

        let version = required_attribute(element, "Version")?;
        if version != SAML_VERSION {
            return Err(Error::ProtocolViolation(format!(
                "Unsupported assertion version '{}'",
                version
            )));
        }
        let id = required_attribute(element, "ID")?;
        let issue_instant = required_instant(element, "IssueInstant")?;

        let issuer = Issuer::decode_required(element, registry)?;
        let signature = at_most_one(element, XMLDSIG_NAMESPACE, "Signature")?.map(RawChunk::capture);
        let subject = Subject::decode_optional(element, registry)?;
        let conditions = Conditions::decode_optional(element, registry)?;
        let advice = at_most_one(element, SAML_ASSERTION_NAMESPACE, "Advice")?.map(RawChunk::capture);

        let statements = element
            .children()
            .filter(|child| Statement::is_statement_element(child))
            .map(|child| Statement::decode(child, registry))
            .collect::<Result<Vec<_>>>()?;

        let mut assertion = Self::new(id, issue_instant, issuer, subject, conditions, statements)?;
        assertion.signature = signature;
        assertion.advice = advice;
        Ok(assertion)
    }

    fn to_xml(&self) -> Result<Element> {
        let mut element = Self::new_element();
        element.set_attribute("Version", SAML_VERSION);
        element.set_attribute("ID", self.id.clone());
        element.set_attribute("IssueInstant", format_instant(&self.issue_instant));

        self.issuer.append_to(&mut element)?;
        if let Some(signature) = &self.signature {
            signature.append_to(&mut element);
        }
        if let Some(subject) = &self.subject {
            subject.append_to(&mut element)?;
        }
        if let Some(conditions) = &self.conditions {
            conditions.append_to(&mut element)?;
        }
        if let Some(advice) = &self.advice {
            advice.append_to(&mut element);
        }
        for statement in &self.statements {
            statement.append_to(&mut element)?;
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{AuthnContext, AuthnStatement, NameId};
    use crate::documents::Document;
    use chrono::TimeZone;

    fn element(xml: &str) -> Element {
        Document::from_string(xml).unwrap().into_root().unwrap()
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_assertion_needs_subject_or_statement() {
        let result = Assertion::new("_a", instant(), Issuer::new("urn:idp"), None, None, vec![]);
        assert!(matches!(result, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_builtin_statement_needs_subject() {
        let authn = AuthnStatement::new(instant(), AuthnContext::from_class_ref("urn:ctx"));
        let result = Assertion::new(
            "_a",
            instant(),
            Issuer::new("urn:idp"),
            None,
            None,
            vec![authn.into()],
        );
        assert!(matches!(result, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_two_issuers_are_rejected() {
        let root = element(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                Version="2.0" ID="_a" IssueInstant="2024-03-01T10:00:00Z">
                <saml:Issuer>urn:one</saml:Issuer>
                <saml:Issuer>urn:two</saml:Issuer>
                <saml:Subject><saml:NameID>alice</saml:NameID></saml:Subject>
            </saml:Assertion>"#,
        );
        assert!(matches!(Assertion::from_xml(&root), Err(Error::TooManyElements(_))));
    }

    #[test]
    fn test_missing_issuer_is_rejected() {
        let root = element(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                Version="2.0" ID="_a" IssueInstant="2024-03-01T10:00:00Z">
                <saml:Subject><saml:NameID>alice</saml:NameID></saml:Subject>
            </saml:Assertion>"#,
        );
        assert!(matches!(Assertion::from_xml(&root), Err(Error::MissingElement(_))));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let root = element(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                Version="1.1" ID="_a" IssueInstant="2024-03-01T10:00:00Z">
                <saml:Issuer>urn:idp</saml:Issuer>
            </saml:Assertion>"#,
        );
        assert!(matches!(Assertion::from_xml(&root), Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_encode_in_schema_order() {
        let assertion = Assertion::new(
            "_a",
            instant(),
            Issuer::new("urn:idp"),
            Some(Subject::identified_by(NameId::new("alice"))),
            Some(Conditions::default()),
            vec![],
        )
        .unwrap();

        let encoded = assertion.to_xml().unwrap();
        let names: Vec<_> = encoded.children().map(|c| c.local_name()).collect();
        assert_eq!(names, vec!["Issuer", "Subject", "Conditions"]);
        assert_eq!(encoded.get_attribute("IssueInstant"), Some("2024-03-01T10:00:00Z"));

        let xml = encoded.to_xml_string().unwrap();
        let decoded = Assertion::from_xml(&element(&xml)).unwrap();
        assert_eq!(decoded.id(), "_a");
        assert_eq!(decoded.issuer().value(), "urn:idp");
        assert!(decoded.to_xml().unwrap().xml_eq(&encoded));
    }
}
