//! Decoding helpers shared by the SAML element types
//!
//! Element identity checks, child cardinality, required attributes and the
//! `xs:dateTime` handling SAML mandates (UTC only, sub-second precision
//! discarded).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use crate::documents::Element;
use crate::error::{Error, Result, SchemaViolation};
use crate::namespaces::QName;

static FRACTIONAL_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[0-9]+Z$").expect("fraction pattern is valid"));

static DATETIME_ZULU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z$")
        .expect("dateTime pattern is valid")
});

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Fail with [`Error::InvalidElement`] unless `element` is `{namespace}local_name`
pub fn expect_element(element: &Element, namespace: &str, local_name: &str) -> Result<()> {
    if element.local_name() != local_name || element.namespace() != Some(namespace) {
        return Err(Error::invalid_element(
            QName::namespaced(namespace, local_name).to_string(),
            element.qname.to_string(),
        ));
    }
    Ok(())
}

/// Drop sub-second precision from a UTC timestamp (SAML core 1.3.3)
pub fn strip_fractional_seconds(value: &str) -> Cow<'_, str> {
    FRACTIONAL_SECONDS.replace(value, "Z")
}

/// Parse a SAML timestamp, discarding fractional seconds
pub fn parse_instant(value: &str, attribute: &str, element: &Element) -> Result<DateTime<Utc>> {
    let stripped = strip_fractional_seconds(value.trim());
    let violation = || {
        Error::SchemaViolation(
            SchemaViolation::new(format!(
                "'{}' attribute is not a valid xs:dateTime in UTC",
                attribute
            ))
            .with_element(element.prefixed_name())
            .with_value(value),
        )
    };

    if !DATETIME_ZULU.is_match(&stripped) {
        return Err(violation());
    }
    let naive = NaiveDateTime::parse_from_str(&stripped, INSTANT_FORMAT).map_err(|_| violation())?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Format a timestamp the way SAML expects it on the wire
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// Read a required unqualified attribute
pub fn required_attribute<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element.get_attribute(name).ok_or_else(|| {
        Error::SchemaViolation(
            SchemaViolation::new(format!("Missing '{}' attribute", name))
                .with_element(element.prefixed_name()),
        )
    })
}

/// Read an optional unqualified attribute as an owned string
pub fn optional_attribute(element: &Element, name: &str) -> Option<String> {
    element.get_attribute(name).map(str::to_string)
}

/// Read a required timestamp attribute
pub fn required_instant(element: &Element, name: &str) -> Result<DateTime<Utc>> {
    let value = required_attribute(element, name)?;
    parse_instant(value, name, element)
}

/// Read an optional timestamp attribute
pub fn optional_instant(element: &Element, name: &str) -> Result<Option<DateTime<Utc>>> {
    element
        .get_attribute(name)
        .map(|value| parse_instant(value, name, element))
        .transpose()
}

/// Read an optional `xs:nonNegativeInteger` attribute
pub fn optional_count(element: &Element, name: &str) -> Result<Option<u32>> {
    element
        .get_attribute(name)
        .map(|value| {
            value.trim().parse::<u32>().map_err(|_| {
                Error::SchemaViolation(
                    SchemaViolation::new(format!(
                        "'{}' attribute is not a valid xs:nonNegativeInteger",
                        name
                    ))
                    .with_element(element.prefixed_name())
                    .with_value(value),
                )
            })
        })
        .transpose()
}

/// Trimmed text content that must not be empty
pub fn non_empty_text(element: &Element) -> Result<String> {
    let content = element.text_content();
    let text = content.trim();
    if text.is_empty() {
        return Err(Error::SchemaViolation(
            SchemaViolation::new("Element content must not be empty")
                .with_element(element.prefixed_name()),
        ));
    }
    Ok(text.to_string())
}

/// At most one child `{namespace}local_name`
pub fn at_most_one<'a>(
    parent: &'a Element,
    namespace: &'a str,
    local_name: &'a str,
) -> Result<Option<&'a Element>> {
    let mut matches = parent.children_ns(namespace, local_name);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(Error::TooManyElements(format!(
            "More than one {} in {}",
            local_name,
            parent.prefixed_name()
        )));
    }
    Ok(first)
}

/// Exactly one child `{namespace}local_name`
pub fn exactly_one<'a>(
    parent: &'a Element,
    namespace: &'a str,
    local_name: &'a str,
) -> Result<&'a Element> {
    at_most_one(parent, namespace, local_name)?.ok_or_else(|| {
        Error::MissingElement(format!(
            "Missing {} in {}",
            local_name,
            parent.prefixed_name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use chrono::Timelike;

    fn element(xml: &str) -> Element {
        Document::from_string(xml).unwrap().into_root().unwrap()
    }

    #[test]
    fn test_strip_fractional_seconds() {
        assert_eq!(
            strip_fractional_seconds("2020-01-01T00:00:00.123456Z"),
            "2020-01-01T00:00:00Z"
        );
        assert_eq!(
            strip_fractional_seconds("2020-01-01T00:00:00Z"),
            "2020-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_parse_instant() {
        let e = element("<e/>");
        let with_fraction = parse_instant("2020-01-01T00:00:00.123456Z", "At", &e).unwrap();
        let without = parse_instant("2020-01-01T00:00:00Z", "At", &e).unwrap();
        assert_eq!(with_fraction, without);
        assert_eq!(with_fraction.nanosecond(), 0);
        assert_eq!(format_instant(&with_fraction), "2020-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_instant_rejects_offsets_and_garbage() {
        let e = element("<e/>");
        assert!(parse_instant("2020-01-01T00:00:00+01:00", "At", &e).is_err());
        assert!(parse_instant("yesterday", "At", &e).is_err());
        assert!(parse_instant("2020-13-45T00:00:00Z", "At", &e).is_err());
    }

    #[test]
    fn test_cardinality() {
        let root = element(r#"<r xmlns:a="urn:a"><a:x/><a:y/><a:y/></r>"#);
        assert!(exactly_one(&root, "urn:a", "x").is_ok());
        assert!(at_most_one(&root, "urn:a", "z").unwrap().is_none());
        assert!(matches!(
            at_most_one(&root, "urn:a", "y"),
            Err(Error::TooManyElements(_))
        ));
        assert!(matches!(
            exactly_one(&root, "urn:a", "z"),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_expect_element() {
        let e = element(r#"<a:x xmlns:a="urn:a"/>"#);
        assert!(expect_element(&e, "urn:a", "x").is_ok());
        assert!(matches!(
            expect_element(&e, "urn:b", "x"),
            Err(Error::InvalidElement { .. })
        ));
        assert!(matches!(
            expect_element(&e, "urn:a", "y"),
            Err(Error::InvalidElement { .. })
        ));
    }

    #[test]
    fn test_optional_count() {
        let e = element(r#"<e Count="3" Bad="-1"/>"#);
        assert_eq!(optional_count(&e, "Count").unwrap(), Some(3));
        assert_eq!(optional_count(&e, "Missing").unwrap(), None);
        assert!(optional_count(&e, "Bad").is_err());
    }
}
