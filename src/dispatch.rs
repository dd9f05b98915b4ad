//! Polymorphic element dispatch
//!
//! Decoding an abstract SAML element (`BaseID`, `Condition`, `Statement`,
//! `RoleDescriptor`) follows the same steps for every family:
//!
//! 1. the element must be the family's wrapper element;
//! 2. it must carry a lexically valid `xsi:type`;
//! 3. the type is resolved against the namespaces in scope;
//! 4. the registry is consulted in the family's key shape;
//! 5. without a handler the element is kept verbatim in the family's
//!    unknown holder, otherwise the handler decodes it.
//!
//! Families plug into [`decode`] by implementing [`ExtensionPoint`].

use crate::chunk::RawChunk;
use crate::documents::Element;
use crate::error::{Error, Result, SchemaViolation};
use crate::helpers::expect_element;
use crate::names::validate_qname;
use crate::namespaces::{resolve_type_name, QName, XsiType};
use crate::registry::{ExtensionRegistry, Family, Handler};

/// An abstract element family that is specialised through `xsi:type`
pub trait ExtensionPoint: Sized {
    /// Family tag checked against the handler found in the registry
    const FAMILY: Family;
    /// Namespace of the wrapper element
    const NAMESPACE: &'static str;
    /// Local name of the wrapper element
    const LOCAL_NAME: &'static str;

    /// Find a handler for the resolved type (and its raw lexical form)
    fn lookup<'r>(
        registry: &'r ExtensionRegistry,
        type_name: &QName,
        xsi_type: &str,
    ) -> Option<&'r Handler>;

    /// Run `handler` if it produces this family, `None` otherwise
    fn from_handler(
        handler: &Handler,
        element: &Element,
        registry: &ExtensionRegistry,
    ) -> Option<Result<Self>>;

    /// Build the unknown holder for an unregistered type
    fn unknown(raw: RawChunk, xsi_type: String, type_name: QName, element: &Element)
        -> Result<Self>;
}

/// Two-tier string lookup: canonical resolved form, then the raw value
pub fn lookup_by_type<'r>(
    registry: &'r ExtensionRegistry,
    type_name: &QName,
    xsi_type: &str,
) -> Option<&'r Handler> {
    registry.type_handler(type_name, xsi_type)
}

/// `(namespace, local name)` lookup
pub fn lookup_by_element<'r>(
    registry: &'r ExtensionRegistry,
    type_name: &QName,
    _xsi_type: &str,
) -> Option<&'r Handler> {
    registry.element_handler(type_name.namespace(), &type_name.local_name)
}

/// Decode an abstract element of family `T`
pub fn decode<T: ExtensionPoint>(element: &Element, registry: &ExtensionRegistry) -> Result<T> {
    expect_element(element, T::NAMESPACE, T::LOCAL_NAME)?;

    let xsi_type = element.xsi_type().ok_or_else(|| {
        Error::SchemaViolation(
            SchemaViolation::new("Missing required xsi:type attribute")
                .with_element(element.prefixed_name()),
        )
    })?;
    validate_qname(xsi_type, &element.prefixed_name())?;

    let family = T::FAMILY;
    let type_name = resolve_type_name(xsi_type, element);

    let Some(handler) = T::lookup(registry, &type_name, xsi_type) else {
        tracing::debug!(
            family = %family,
            xsi_type = %xsi_type,
            type_name = %type_name,
            "no extension handler registered, keeping element verbatim"
        );
        return T::unknown(
            RawChunk::capture(element),
            xsi_type.to_string(),
            type_name,
            element,
        );
    };

    let classification = || Error::Classification {
        type_name: type_name.canonical(),
        expected: family,
        actual: handler.family(),
    };

    if handler.family() != family {
        tracing::warn!(
            family = %family,
            handler_family = %handler.family(),
            type_name = %type_name,
            "extension handler registered for the wrong family"
        );
        return Err(classification());
    }

    tracing::trace!(family = %family, type_name = %type_name, "delegating to extension handler");
    T::from_handler(handler, element, registry).unwrap_or_else(|| Err(classification()))
}

/// Start an extension element `prefix:local_name` carrying `xsi_type`
///
/// Both the `xsi` prefix and the type's prefix are declared on the element
/// itself so it can be parsed without its ancestors.
pub fn extension_element(
    namespace: &str,
    prefix: &str,
    local_name: &str,
    xsi_type: &XsiType,
) -> Element {
    let mut element = Element::qualified(namespace, prefix, local_name);
    xsi_type.apply_to(&mut element);
    element
}
