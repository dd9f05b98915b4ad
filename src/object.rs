//! The decode/encode contract shared by concrete SAML element types

use crate::documents::Element;
use crate::error::Result;
use crate::helpers::{at_most_one, exactly_one, expect_element};
use crate::registry::ExtensionRegistry;

/// A concrete SAML element with a fixed name
///
/// Every implementation checks its own element name and namespace, so it
/// can be decoded directly as well as from inside an aggregate.
pub trait SamlElement: Sized {
    /// Element namespace
    const NAMESPACE: &'static str;
    /// Prefix used when encoding
    const PREFIX: &'static str;
    /// Element local name
    const LOCAL_NAME: &'static str;

    /// Decode from `element`, resolving nested extension points in `registry`
    fn decode(element: &Element, registry: &ExtensionRegistry) -> Result<Self>;

    /// Encode into a new element
    fn to_xml(&self) -> Result<Element>;

    /// Decode with no extension handlers registered
    fn from_xml(element: &Element) -> Result<Self> {
        Self::decode(element, ExtensionRegistry::empty())
    }

    /// Encode and append under `parent`
    fn append_to(&self, parent: &mut Element) -> Result<()> {
        parent.add_child(self.to_xml()?);
        Ok(())
    }

    /// Fail unless `element` has this type's name and namespace
    fn check_element(element: &Element) -> Result<()> {
        expect_element(element, Self::NAMESPACE, Self::LOCAL_NAME)
    }

    /// An empty element with this type's name
    fn new_element() -> Element {
        Element::qualified(Self::NAMESPACE, Self::PREFIX, Self::LOCAL_NAME)
    }

    /// Decode every child of `parent` with this type's name
    fn decode_all(parent: &Element, registry: &ExtensionRegistry) -> Result<Vec<Self>> {
        parent
            .children_ns(Self::NAMESPACE, Self::LOCAL_NAME)
            .map(|e| Self::decode(e, registry))
            .collect()
    }

    /// Decode the single optional child of `parent` with this type's name
    fn decode_optional(parent: &Element, registry: &ExtensionRegistry) -> Result<Option<Self>> {
        at_most_one(parent, Self::NAMESPACE, Self::LOCAL_NAME)?
            .map(|e| Self::decode(e, registry))
            .transpose()
    }

    /// Decode the single required child of `parent` with this type's name
    fn decode_required(parent: &Element, registry: &ExtensionRegistry) -> Result<Self> {
        let element = exactly_one(parent, Self::NAMESPACE, Self::LOCAL_NAME)?;
        Self::decode(element, registry)
    }
}
